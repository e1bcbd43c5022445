use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use potion::HtmlError;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::permissions::{ActionType, Role};
use crate::{
    constants::SESSION_LIFETIME_HOURS,
    database::{
        error::ActionError,
        schema::{Id, Recipe, User},
    },
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session; Invalid key")]
    Key,
    #[error("Invalid session; Invalid token")]
    Token,
    #[error("Invalid session; Token expired")]
    Expired,
}

impl Into<potion::Error> for SessionError {
    fn into(self) -> potion::Error {
        HtmlError::InvalidSession.new(&self.to_string())
    }
}

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JwtSessionData {
    pub user_id: Id,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Id, username: String) -> Self {
        Self::with_lifetime(id, username, Duration::hours(SESSION_LIFETIME_HOURS))
    }

    pub fn with_lifetime(id: Id, username: String, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: id,
            username,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id, user.username.to_owned())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Id,
    pub username: String,
}

impl SessionData {
    pub fn is_author(&self, recipe: &Recipe) -> bool {
        self.user_id == recipe.author_id
    }
}

impl Into<SessionData> for JwtSessionData {
    fn into(self) -> SessionData {
        SessionData {
            user_id: self.user_id,
            username: self.username,
        }
    }
}

/// Who is making a request. Requests without a valid token are anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(SessionData),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Anonymous => Role::Anonymous,
            Identity::User(_) => Role::User,
        }
    }

    pub fn user_id(&self) -> Option<Id> {
        match self {
            Identity::Anonymous => None,
            Identity::User(session) => Some(session.user_id),
        }
    }

    pub fn authenticate(&self, action: ActionType) -> Result<(), ActionError> {
        if action.authenticate(self) {
            return Ok(());
        }

        match self {
            Identity::Anonymous => Err(ActionError::Unauthenticated),
            Identity::User(_) => Err(ActionError::Forbidden(
                "You don't have permission to perform this action".to_owned(),
            )),
        }
    }

    /// Like `authenticate`, but hands back the session of a signed in user.
    pub fn session(&self, action: ActionType) -> Result<&SessionData, ActionError> {
        self.authenticate(action)?;

        match self {
            Identity::User(session) => Ok(session),
            Identity::Anonymous => Err(ActionError::Unauthenticated),
        }
    }
}

impl From<SessionData> for Identity {
    fn from(session: SessionData) -> Self {
        Identity::User(session)
    }
}

fn signing_key(secret: &str) -> Result<Hmac<Sha256>, SessionError> {
    Hmac::new_from_slice(secret.as_bytes()).map_err(|_| SessionError::Key)
}

pub fn sign_session(claims: &JwtSessionData, secret: &str) -> Result<String, SessionError> {
    let key = signing_key(secret)?;

    claims.sign_with_key(&key).map_err(|_| SessionError::Token)
}

pub fn verify_session(token: &str, secret: &str) -> Result<JwtSessionData, SessionError> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| SessionError::Token)?;

    if session.exp < Utc::now().timestamp() {
        return Err(SessionError::Expired);
    }

    Ok(session)
}
