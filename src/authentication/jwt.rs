use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::error::Error;
use crate::schema::{User, UserRole, Uuid};

use super::permissions::ActionType;

/// HS256 key shared with whoever issues session tokens.
#[derive(Clone)]
pub struct JwtKeys {
    key: Hmac<Sha256>,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        let key = Hmac::new_from_slice(secret)
            .map_err(|_e| Error::Internal(String::from("Invalid JWT secret")))?;

        Ok(Self { key })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    pub user_uid: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, uid: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            user_uid: uid,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
    pub user_uid: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), Error> {
        if !action.authenticate(self) {
            return Err(Error::permission(
                "You don't have permission to perform this action",
            ));
        }
        Ok(())
    }

    /// Passes when the session owns `owner_id`, or holds `override_action`.
    pub fn authenticate_owner(
        &self,
        owner_id: Uuid,
        override_action: ActionType,
    ) -> Result<(), Error> {
        if self.user_id == owner_id {
            return Ok(());
        }
        self.authenticate(override_action)
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            username: value.username,
            user_id: value.user_id,
            is_admin: value.user_uid == UserRole::Admin,
            user_uid: value.user_uid,
        }
    }
}

/// Whoever sent the current request. Passed explicitly into every read that
/// computes per-requester flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(SessionData),
}

impl Requester {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Requester::Anonymous => None,
            Requester::User(session) => Some(session.user_id),
        }
    }

    pub fn session(&self) -> Option<&SessionData> {
        match self {
            Requester::Anonymous => None,
            Requester::User(session) => Some(session),
        }
    }
}

impl From<Option<SessionData>> for Requester {
    fn from(value: Option<SessionData>) -> Self {
        value.map(Requester::User).unwrap_or(Requester::Anonymous)
    }
}

pub fn sign_session(user: &User, keys: &JwtKeys) -> Result<String, Error> {
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.uid.to_owned());

    claims
        .sign_with_key(&keys.key)
        .map_err(|e| Error::Internal(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, keys: &JwtKeys) -> Result<JwtSessionData, Error> {
    let session: JwtSessionData = token
        .verify_with_key(&keys.key)
        .map_err(|_| Error::Unauthorized(String::from("Invalid session; Invalid token")))?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(Error::Unauthorized(String::from(
            "Invalid session; Token expired",
        )));
    }

    Ok(session)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user(id: Uuid, uid: UserRole) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            username: format!("user{id}"),
            first_name: String::from("Test"),
            last_name: String::from("User"),
            password: String::new(),
            uid,
        }
    }

    pub(crate) fn keys() -> JwtKeys {
        JwtKeys::new(b"test-secret").unwrap()
    }

    #[test]
    fn signed_session_verifies() {
        let keys = keys();
        let token = sign_session(&user(7, UserRole::Admin), &keys).unwrap();

        let session: SessionData = verify_jwt_session(&token, &keys).unwrap().into();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "user7");
        assert!(session.is_admin);
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = sign_session(&user(7, UserRole::User), &keys()).unwrap();
        let other = JwtKeys::new(b"another-secret").unwrap();

        assert!(matches!(
            verify_jwt_session(&token, &other),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn rejects_expired_session() {
        let keys = keys();
        let mut claims = JwtSessionData::new(1, String::from("user1"), UserRole::User);
        claims.exp = Local::now().timestamp() - 60;
        let token = claims.sign_with_key(&keys.key).unwrap();

        assert!(matches!(
            verify_jwt_session(&token, &keys),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn owner_passes_without_override() {
        let session: SessionData = JwtSessionData::new(3, String::from("c"), UserRole::User).into();

        assert!(session.authenticate_owner(3, ActionType::ManageAllRecipes).is_ok());
        assert!(matches!(
            session.authenticate_owner(4, ActionType::ManageAllRecipes),
            Err(Error::Permission(_))
        ));
    }

    #[test]
    fn anonymous_has_no_user_id() {
        assert_eq!(Requester::from(None).user_id(), None);
    }
}
