pub mod error;
pub mod models;
pub mod validation;
pub mod session;

pub use error::{ErrorCode, ErrorResponse};
pub use models::*;
pub use validation::*;
pub use session::{SessionToken, token_digest};
