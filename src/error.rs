//! Error types for mock API operations.
//!
//! Every failure that crosses the [`mock_request`](crate::MockEngine::mock_request)
//! boundary is an [`ApiError`]: a human-readable message, an optional `param`
//! naming the offending field, and an HTTP status class. Callers translate
//! this into their own exception or result type.

/// Structured error raised across the mock-request boundary.
///
/// Mirrors the wire shape of the real processor's error objects. The type is
/// `Clone` so that scripted copies can sit in the error queue and be raised
/// verbatim when their turn comes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Malformed or semantically invalid request parameters.
    #[error("{message}")]
    InvalidRequest {
        message: String,
        /// The offending parameter, when one is known.
        param: Option<String>,
    },

    /// A referenced entity id does not exist in its store.
    #[error("No such {resource_type}: {id}")]
    NotFound { resource_type: String, id: String },

    /// Engine construction or route registration failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create an invalid request error with no offending parameter.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            param: None,
        }
    }

    /// Create an invalid request error naming the offending parameter.
    pub fn invalid_param(message: impl Into<String>, param: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            param: Some(param.into()),
        }
    }

    /// Create a missing resource error.
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status class carried across the boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Internal { .. } => 500,
        }
    }

    /// The field this error is about, if any. Missing-resource errors name
    /// the resource type, matching the upstream service's convention.
    pub fn param(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { param, .. } => param.as_deref(),
            Self::NotFound { resource_type, .. } => Some(resource_type),
            Self::Internal { .. } => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type ApiResult<T> = Result<T, ApiError>;
