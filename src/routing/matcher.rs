//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a path is under the ownership root at all
//! - Match (method, path shape) against the four signaling operations
//! - Extract and strictly validate the session identifier
//!
//! # Design Decisions
//! - The table is compiled once from config, immutable at runtime
//! - No regex: segment comparison only
//! - Shape is matched before the id, so an unknown action is 404 even when
//!   its id segment is malformed
//! - A member route needs exactly one 24-character alphanumeric token in
//!   the whole path, and it must be the id segment; anything else is 400

use axum::http::Method;

use crate::config::ProtocolConfig;
use crate::error::SignalingError;
use crate::session::{SessionId, SESSION_ID_LEN};

const COLLECTION: &str = "connections";

/// The four signaling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    SetRemoteDescription,
    PollCandidates,
    Close,
}

impl Operation {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::SetRemoteDescription => "remote_description",
            Operation::PollCandidates => "additional_candidates",
            Operation::Close => "close",
        }
    }
}

/// Path shape below `{base}/connections`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    /// `{base}/connections`
    Collection,
    /// `{base}/connections/{id}/{action}`
    Member(&'static str),
}

#[derive(Debug, Clone)]
struct RouteDef {
    method: Method,
    shape: Shape,
    operation: Operation,
}

/// A resolved request: which operation, and for member routes, which session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub operation: Operation,
    pub session: Option<SessionId>,
}

/// Precompiled decision table keyed by (method, path shape).
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Ownership root, e.g. `/.wrtc`.
    root: String,
    /// Root plus version segment, e.g. `/.wrtc/v2`.
    base: String,
    routes: Vec<RouteDef>,
}

impl RouteTable {
    pub fn new(config: &ProtocolConfig) -> Self {
        let routes = vec![
            RouteDef {
                method: Method::POST,
                shape: Shape::Collection,
                operation: Operation::Create,
            },
            RouteDef {
                method: Method::POST,
                shape: Shape::Member("remote-description"),
                operation: Operation::SetRemoteDescription,
            },
            RouteDef {
                method: Method::GET,
                shape: Shape::Member("additional-candidates"),
                operation: Operation::PollCandidates,
            },
            RouteDef {
                method: Method::POST,
                shape: Shape::Member("close"),
                operation: Operation::Close,
            },
        ];

        Self {
            root: config.prefix.clone(),
            base: config.base_path(),
            routes,
        }
    }

    /// Whether the path is under the ownership root (segment-aligned).
    pub fn owns(&self, path: &str) -> bool {
        under(path, &self.root).is_some()
    }

    /// Resolve an owned request to an operation.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Route, SignalingError> {
        let rest = under(path, &self.base).ok_or(SignalingError::UnknownRoute)?;
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let segments: Vec<&str> = rest.split('/').collect();

        let (shape, token) = match segments.as_slice() {
            [COLLECTION] => (Shape::Collection, None),
            [COLLECTION, token, action] => {
                let action = self
                    .routes
                    .iter()
                    .find_map(|r| match r.shape {
                        Shape::Member(name) if name == *action => Some(name),
                        _ => None,
                    })
                    .ok_or(SignalingError::UnknownRoute)?;
                (Shape::Member(action), Some(*token))
            }
            _ => return Err(SignalingError::UnknownRoute),
        };

        let operation = self
            .routes
            .iter()
            .find(|r| r.shape == shape && r.method == method)
            .map(|r| r.operation)
            .ok_or(SignalingError::UnknownRoute)?;

        let session = match token {
            None => None,
            Some(token) => Some(extract_id(path, token)?),
        };

        Ok(Route { operation, session })
    }
}

/// Remainder of `path` after `base`, if `path` is `base` or below it.
fn under<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Number of maximal alphanumeric runs in `path` that are exactly id-length.
fn id_tokens(path: &str) -> usize {
    path.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|run| run.len() == SESSION_ID_LEN)
        .count()
}

fn extract_id(path: &str, token: &str) -> Result<SessionId, SignalingError> {
    if id_tokens(path) != 1 {
        return Err(SignalingError::MalformedId);
    }
    SessionId::parse(token).map_err(|_| SignalingError::MalformedId)
}
