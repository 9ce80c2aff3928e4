use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failures talking to the availability backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("JSON deserialization error for {endpoint}: {source}")]
    Deserialize {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} reported failure: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("paste the cookies first")]
    Empty,

    #[error("no valid cookies found; copy them from the browser's developer tools")]
    NoMatchingCookies,

    #[error("failed to serialize cookies: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
