use uuid::Uuid;
use crate::error::ActionError;

pub fn parse_poll_id(id: &str) -> Result<Uuid, ActionError> {
    Uuid::parse_str(id).map_err(|_| ActionError::InvalidId)
}
