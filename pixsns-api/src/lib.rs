use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod auth;
pub use auth::{AuthToken, LoginRequest, LoginResponse, Session};

mod comment;
pub use comment::{Comment, CommentId, CommentUpdate, NewComment, PostId};

mod error;
pub use error::Error;

mod mention;
pub use mention::{extract_mentions, Mention};

mod user;
pub use user::{Profile, UserId, DEFAULT_AVATAR};

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(s.to_string()));
    }
    Ok(())
}
