use serde::{Serialize, Deserialize};

pub const SESSION_COOKIE: &str = "session";

/// The raw session credential presented with a request, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken(pub Option<String>);

impl SessionToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Digest stored in place of the raw token; lookups never see the token itself.
pub fn token_digest(token: &str) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use sha2::{Sha256, Digest};

    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub fn extract_token(authorization: Option<&str>, cookie: Option<&str>) -> SessionToken {
    let token = authorization
        .and_then(bearer)
        .or_else(|| cookie.map(str::trim).filter(|c| !c.is_empty()))
        .map(str::to_string);
    SessionToken(token)
}

#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for SessionToken {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let cookie_name = req
                .rocket()
                .state::<SessionCookieName>()
                .map(|name| name.0.as_str())
                .unwrap_or(SESSION_COOKIE);

            let authorization = req.headers().get_one("Authorization");
            let cookie = req.cookies().get(cookie_name).map(|c| c.value().to_string());

            Outcome::Success(extract_token(authorization, cookie.as_deref()))
        }
    }

    /// Managed state overriding the cookie consulted for session tokens.
    pub struct SessionCookieName(pub String);
}

#[cfg(feature = "backend")]
pub use backend_impl::SessionCookieName;
