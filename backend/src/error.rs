use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use thiserror::Error;
use poll_shared::{ErrorCode, ErrorResponse, ValidationError};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("You must be signed in to do that")]
    Unauthenticated,
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Poll ID and option ID are required")]
    MissingParameter,
    #[error("Invalid poll ID")]
    InvalidId,
    #[error("Poll not found")]
    PollNotFound,
    #[error("Option not found")]
    OptionNotFound,
    #[error("Option does not belong to this poll")]
    OptionPollMismatch,
    #[error("You are not allowed to modify this poll")]
    NotAuthorized,
    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ActionError {
    pub fn storage(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ActionError::Storage { context, source }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ActionError::Unauthenticated => ErrorCode::Unauthenticated,
            ActionError::Validation(_) => ErrorCode::ValidationFailed,
            ActionError::MissingParameter => ErrorCode::MissingParameter,
            ActionError::InvalidId => ErrorCode::InvalidId,
            ActionError::PollNotFound => ErrorCode::PollNotFound,
            ActionError::OptionNotFound => ErrorCode::OptionNotFound,
            ActionError::OptionPollMismatch => ErrorCode::OptionPollMismatch,
            ActionError::NotAuthorized => ErrorCode::NotAuthorized,
            ActionError::Storage { .. } => ErrorCode::StorageError,
        }
    }

    pub fn response(&self) -> ErrorResponse {
        ErrorResponse::new(self.code(), self.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ActionError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = Status::from_code(self.code().http_status()).unwrap_or(Status::InternalServerError);

        rocket::Response::build_from(Json(self.response()).respond_to(req)?)
            .status(status)
            .ok()
    }
}
