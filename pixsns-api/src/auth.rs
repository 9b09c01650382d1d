use crate::{Error, UserId};

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct LoginRequest {
    /// Either the user id or the account's email address
    pub user_id: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(user_id: String, password: String) -> LoginRequest {
        LoginRequest {
            user_id: user_id.trim().to_string(),
            password: password.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.user_id)?;
        crate::validate_string(&self.password)?;
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginResponse {
    pub token: AuthToken,
    pub user_id: UserId,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub profile_image: Option<String>,
}

impl LoginResponse {
    pub fn session(&self) -> Session {
        Session {
            token: self.token.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct AuthToken(pub String);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(String::from("stub-token"))
    }
}

/// Everything the comment views need to know about who is logged in.
///
/// This is passed down explicitly from whoever owns the persisted login, so
/// that nothing below the application root reads global storage.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Session {
    pub token: AuthToken,
    pub user_id: UserId,
}

impl Session {
    pub fn stub() -> Session {
        Session {
            token: AuthToken::stub(),
            user_id: UserId::stub(),
        }
    }

    pub fn owns(&self, author: Option<&UserId>) -> bool {
        author == Some(&self.user_id)
    }
}
