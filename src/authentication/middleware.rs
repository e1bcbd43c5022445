use warp::{reject::Rejection, Filter};

use super::jwt::{verify_session, Identity, SessionData};
use crate::{constants::SESSION_COOKIE, database::error::ActionError};

/// Token from an `Authorization: Bearer <token>` or `Token <token>` header.
fn header_token(header: Option<String>) -> Option<String> {
    let header = header?;
    let (scheme, token) = header.split_once(' ')?;

    match scheme {
        "Bearer" | "Token" => Some(token.trim().to_owned()),
        _ => None,
    }
}

/// The first candidate token that verifies wins.
fn identify(tokens: [Option<String>; 2], secret: &str) -> Identity {
    for token in tokens.into_iter().flatten() {
        match verify_session(&token, secret) {
            Ok(session) => return Identity::User(session.into()),
            Err(e) => log::debug!("> Ignoring session token: {e}"),
        }
    }

    Identity::Anonymous
}

/// Resolves the caller from the session cookie, falling back to the
/// authorization header when the cookie is absent or does not verify.
/// Never rejects on a bad token.
pub fn with_identity(
    secret: String,
) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(move |cookie: Option<String>, header: Option<String>| {
            identify([cookie, header_token(header)], &secret)
        })
}

async fn require_session(identity: Identity) -> Result<SessionData, Rejection> {
    match identity {
        Identity::User(session) => Ok(session),
        Identity::Anonymous => Err(ActionError::Unauthenticated.into()),
    }
}

pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_identity(secret).and_then(require_session)
}
