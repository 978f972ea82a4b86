//! Client for the WebRTC HTTP signaling endpoints.

pub mod client;

pub use client::{
    ClientError, CreatedConnection, IceCandidate, SessionDescription, SignalingClient,
};
