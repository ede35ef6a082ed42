use std::collections::HashSet;
use crate::models::{CreatePollRequest, UpdatePollRequest};

pub const MIN_CREATE_OPTIONS: usize = 2;
pub const MIN_UPDATE_OPTIONS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Question is required")]
    EmptyQuestion,
    #[error("At least {MIN_CREATE_OPTIONS} options are required")]
    TooFewOptions,
    #[error("At least {MIN_UPDATE_OPTIONS} option is required")]
    NoOptions,
    #[error("Options cannot be empty")]
    EmptyOption,
    #[error("Duplicate option: {0}")]
    DuplicateOption(String),
}

// Creation and update deliberately apply different rule sets.
pub fn validate_create_poll(request: &CreatePollRequest) -> Result<(), ValidationError> {
    if request.question.trim().is_empty() { return Err(ValidationError::EmptyQuestion); }
    if request.options.len() < MIN_CREATE_OPTIONS { return Err(ValidationError::TooFewOptions); }
    if request.options.iter().any(|opt| opt.trim().is_empty()) { return Err(ValidationError::EmptyOption); }

    let mut seen = HashSet::with_capacity(request.options.len());
    if let Some(duplicate) = request.options.iter().find(|opt| !seen.insert(opt.as_str())) {
        return Err(ValidationError::DuplicateOption(duplicate.clone()));
    }

    Ok(())
}

pub fn validate_update_poll(request: &UpdatePollRequest) -> Result<(), ValidationError> {
    if request.question.trim().is_empty() { return Err(ValidationError::EmptyQuestion); }
    if request.options.len() < MIN_UPDATE_OPTIONS { return Err(ValidationError::NoOptions); }
    if request.options.iter().any(|opt| opt.text.trim().is_empty()) { return Err(ValidationError::EmptyOption); }

    Ok(())
}
