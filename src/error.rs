use thiserror::Error;

/// Every way a call against the migration backend can fail.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{detail}")]
    Server { status: u16, detail: String },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{message}")]
    Operation { message: String, details: String },
    #[error("{0}")]
    Validation(String),
    #[error("could not write file: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// Text shown to the user in an error notification.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Server { detail, .. } => detail.clone(),
            ApiError::Operation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
