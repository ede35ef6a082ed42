use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Validation failed")]
    ValidationFailed,
    #[error("Missing parameter")]
    MissingParameter,
    #[error("Invalid identifier")]
    InvalidId,
    #[error("Poll not found")]
    PollNotFound,
    #[error("Option not found")]
    OptionNotFound,
    #[error("Option does not belong to poll")]
    OptionPollMismatch,
    #[error("Operation not authorized")]
    NotAuthorized,
    #[error("Storage error")]
    StorageError,
}

impl ErrorCode {
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::Unauthenticated => 401,
            ErrorCode::ValidationFailed
            | ErrorCode::MissingParameter
            | ErrorCode::InvalidId
            | ErrorCode::OptionPollMismatch => 400,
            ErrorCode::NotAuthorized => 403,
            ErrorCode::PollNotFound | ErrorCode::OptionNotFound => 404,
            ErrorCode::StorageError => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: Some(code),
        }
    }

    pub fn plain(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }
}
