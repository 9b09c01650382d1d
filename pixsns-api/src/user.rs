use std::fmt;

/// Shown in place of a missing or empty profile image
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn stub() -> UserId {
        UserId(String::from("stub-user"))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The session user's profile, as returned by `GET /profile/me/`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Profile {
    pub user_id: UserId,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub profile_image: Option<String>,

    #[serde(default)]
    pub is_admin: bool,
}

impl Profile {
    pub fn avatar(&self) -> &str {
        avatar_or_default(self.profile_image.as_deref())
    }
}

pub(crate) fn avatar_or_default(url: Option<&str>) -> &str {
    match url {
        Some(url) if !url.trim().is_empty() => url,
        _ => DEFAULT_AVATAR,
    }
}
