use std::{fmt, str::FromStr};

use uuid::Uuid;

use crate::{user::avatar_or_default, Error, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<PostId, uuid::Error> {
        Uuid::try_parse(s.trim()).map(PostId)
    }
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CommentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<CommentId, Self::Err> {
        s.trim().parse().map(CommentId)
    }
}

/// A comment as returned by the comment listing of a post
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,

    /// `None` for top-level comments
    #[serde(default)]
    pub parent: Option<CommentId>,

    #[serde(default)]
    pub post: Option<PostId>,

    /// HTML produced by the rich-text editor
    pub content: String,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub user_uid: Option<UserId>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub profile_image: Option<String>,

    pub created_at: Time,
}

impl Comment {
    pub fn avatar(&self) -> &str {
        avatar_or_default(self.profile_image.as_deref())
    }

    pub fn author_name(&self) -> &str {
        [self.display_name.as_deref(), self.user_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
    }

    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Body of `POST /posts/{post}/comments/`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content: String,
    pub image_url: Option<String>,
    pub parent: Option<CommentId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.content)?;
        if let Some(url) = &self.image_url {
            crate::validate_string(url)?;
        }
        Ok(())
    }
}

/// Body of `PUT /comments/{id}/`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentUpdate {
    pub content: String,
    pub image_url: Option<String>,
}

impl CommentUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.content)?;
        if let Some(url) = &self.image_url {
            crate::validate_string(url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_entry() {
        let c: Comment = serde_json::from_str(
            r#"{
                "id": 12,
                "post": "6f2d1f1e-3c57-4a6b-9d0b-1b6c2a9f7e10",
                "user_name": "tanaka",
                "user_uid": "tanaka01",
                "content": "<p>hello</p>",
                "image_url": null,
                "created_at": "2024-05-01T12:34:56.123456+09:00",
                "display_name": "Tanaka",
                "profile_image": ""
            }"#,
        )
        .expect("parsing comment");
        assert_eq!(c.id, CommentId(12));
        assert_eq!(c.parent, None);
        assert_eq!(c.user_uid, Some(UserId(String::from("tanaka01"))));
        assert_eq!(c.author_name(), "Tanaka");
        assert_eq!(c.avatar(), crate::DEFAULT_AVATAR);
        assert_eq!(c.image(), None);
    }

    #[test]
    fn missing_id_is_a_decode_error() {
        let res = serde_json::from_str::<Comment>(
            r#"{"content": "x", "created_at": "2024-05-01T00:00:00Z"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn author_name_falls_back() {
        let mut c: Comment = serde_json::from_str(
            r#"{"id": 1, "parent": 3, "content": "", "created_at": "2024-05-01T00:00:00Z",
                "display_name": " ", "user_name": "raw"}"#,
        )
        .expect("parsing comment");
        assert_eq!(c.parent, Some(CommentId(3)));
        assert_eq!(c.author_name(), "raw");
        c.user_name = None;
        assert_eq!(c.author_name(), "Anonymous");
    }
}
