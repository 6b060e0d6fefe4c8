use thiserror::Error;

use crate::request::ApiResponse;

/// Errors surfaced by the gateway and the typed API on top of it.
#[derive(Debug, Error)]
pub enum KosError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("kos api responded with code {code}: {msg}")]
    Api { code: u16, msg: String },

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session could not be (re)authorised. Carries the 401 that
    /// triggered the failure, never the refresh call's own error.
    #[error("request to {path} was rejected as unauthorized")]
    Unauthorized {
        path:     String,
        response: Box<ApiResponse>,
    },

    #[error("token refresh was dropped before it settled")]
    RefreshAborted,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl KosError {
    pub(crate) fn unauthorized(path: impl Into<String>, response: ApiResponse) -> Self {
        Self::Unauthorized { path: path.into(), response: Box::new(response) }
    }

    /// True when the error means the caller has no usable session any more.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
