use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;
use poll_shared::session::{token_digest, SessionToken};
use crate::error::ActionError;
use crate::identity::IdentityProvider;
use crate::routes::AppState;

/// Resolves a session token to a user id.
///
/// Both halves must check out: the session has to exist and be unexpired, and
/// the user it names has to exist. Anything less is treated as anonymous.
pub async fn authenticate(identity: &dyn IdentityProvider, token: Option<&str>) -> Option<Uuid> {
    let token = token?;
    let digest = token_digest(token);

    let session = match identity.session(&digest).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            debug!("No session for presented token");
            return None;
        }
        Err(e) => {
            warn!("Session lookup failed: {}", e);
            return None;
        }
    };

    if !session.is_live(OffsetDateTime::now_utc()) {
        debug!("Session for user {} has expired", session.user_id);
        return None;
    }

    match identity.user_exists(session.user_id).await {
        Ok(true) => Some(session.user_id),
        Ok(false) => {
            warn!("Session references missing user {}", session.user_id);
            None
        }
        Err(e) => {
            warn!("User lookup failed: {}", e);
            None
        }
    }
}

pub fn require_caller(caller: Option<Uuid>) -> Result<Uuid, ActionError> {
    caller.ok_or(ActionError::Unauthenticated)
}

/// The authenticated user behind a request, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Option<Uuid>);

impl Caller {
    pub fn user_id(self) -> Option<Uuid> {
        self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match req.guard::<SessionToken>().await {
            Outcome::Success(token) => token,
            _ => SessionToken::default(),
        };

        let Some(state) = req.rocket().state::<AppState>() else {
            warn!("AppState not managed; treating request as anonymous");
            return Outcome::Success(Caller(None));
        };

        Outcome::Success(Caller(authenticate(state.identity.as_ref(), token.as_deref()).await))
    }
}
