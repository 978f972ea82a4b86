//! Error taxonomy for signaling requests.
//!
//! Every failure is terminal for the request that produced it and maps to
//! exactly one HTTP status through [`SignalingError::status`].

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::body::BodyError;
use crate::peer::PeerError;
use crate::session::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    /// The path held zero, several, or a malformed identifier token.
    #[error("malformed or ambiguous session id in path")]
    MalformedId,

    /// The path is under the prefix but names no operation.
    #[error("no signaling operation matches the request")]
    UnknownRoute,

    /// Well-formed id that refers to no live session.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The authorization collaborator turned the caller away.
    #[error("authorization rejected with status {0}")]
    Rejected(StatusCode),

    /// The peer resource refused a description.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] PeerError),

    /// The request body could not be read or parsed.
    #[error(transparent)]
    Body(#[from] BodyError),

    /// Unexpected failure while creating a session.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SignalingError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignalingError::MalformedId => StatusCode::BAD_REQUEST,
            SignalingError::UnknownRoute => StatusCode::NOT_FOUND,
            SignalingError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SignalingError::Rejected(status) => *status,
            SignalingError::Negotiation(_) => StatusCode::BAD_REQUEST,
            SignalingError::Body(_) => StatusCode::BAD_REQUEST,
            SignalingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignalingError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
