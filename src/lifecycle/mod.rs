//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Logging/metrics → Registry → Server → Listen
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Close sessions → Exit
//! ```

pub mod shutdown;

pub use shutdown::{wait_for_signal, Shutdown};
