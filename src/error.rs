// Error types shared by the Dropbox client and the uploader.
//
// - `ServiceError` is what the remote side can go wrong with, split by the
//   HTTP status Dropbox answers with.
// - `UploadError` is the outcome of a whole upload. Only two of its variants
//   have a user-facing diagnostic; the rest are reported as-is.

use reqwest::StatusCode;
use std::io;
use thiserror::Error;

/// Message printed when Dropbox rejects the access token.
pub const INVALID_TOKEN_MESSAGE: &str = "ERROR: Invalid access token.";

/// Message printed for any API-level error. Quota exhaustion is the usual
/// cause but not the only one.
pub const OUT_OF_SPACE_MESSAGE: &str = "ERROR: User may be out of space.";

/// Failures reported by the remote storage service or the transport.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 401: token malformed, expired or revoked.
    #[error("authorization rejected: {summary}")]
    Auth { summary: String },
    /// 403, 404 or 409: endpoint-specific error, e.g.
    /// `path/insufficient_space/..`.
    #[error("api error: {summary}")]
    Api {
        summary: String,
        user_message: Option<String>,
    },
    /// 400
    #[error("bad input: {0}")]
    BadInput(String),
    /// 429
    #[error("rate limited: {summary}")]
    RateLimit {
        summary: String,
        retry_after: Option<u64>,
    },
    #[error("server error {status}: {body}")]
    Internal { status: StatusCode, body: String },
    #[error("unexpected response {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this is the API error Dropbox returns when the account has
    /// no room left for the file.
    pub fn is_insufficient_space(&self) -> bool {
        matches!(self, ServiceError::Api { summary, .. } if summary.starts_with("path/insufficient_space"))
    }
}

/// Outcome of a failed upload.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("access token rejected: {0}")]
    AuthorizationFailure(#[source] ServiceError),
    #[error("storage service failure: {0}")]
    ServiceFailure(#[source] ServiceError),
    #[error("reading {path}: {source}")]
    LocalIo {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Unhandled(ServiceError),
}

impl UploadError {
    /// The controlled diagnostic for this failure, if it has one.
    pub fn diagnostic(&self) -> Option<&'static str> {
        match self {
            UploadError::AuthorizationFailure(_) => Some(INVALID_TOKEN_MESSAGE),
            UploadError::ServiceFailure(_) => Some(OUT_OF_SPACE_MESSAGE),
            UploadError::LocalIo { .. } | UploadError::Unhandled(_) => None,
        }
    }
}

impl From<ServiceError> for UploadError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth { .. } => UploadError::AuthorizationFailure(err),
            ServiceError::Api { .. } => UploadError::ServiceFailure(err),
            other => UploadError::Unhandled(other),
        }
    }
}
