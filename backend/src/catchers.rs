use rocket::{Request, catch, serde::json::Json};
use poll_shared::{ErrorCode, ErrorResponse};

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::plain("Invalid request parameters."))
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::Unauthenticated, "You must be signed in to do that"))
}

#[catch(403)]
pub fn forbidden(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::NotAuthorized, "Access forbidden."))
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::plain("The requested resource was not found."))
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::ValidationFailed, "Malformed request body."))
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorResponse> {
    Json(ErrorResponse::new(ErrorCode::StorageError, "An internal server error occurred."))
}
