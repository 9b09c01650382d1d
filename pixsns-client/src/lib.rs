mod cancel;
pub use cancel::{CancelToken, Cancelled, Ticket};

mod composer;
pub use composer::{ComposeTarget, Composer, Phase, StagedImage, Submission};

mod error;
pub use error::Error;

pub mod html;

mod http;
pub use http::{ClientConfig, FirebaseStorage, HttpApi, StorageConfig};

mod imaging;
pub use imaging::{optimize_image, ImageError, OptimizedImage, JPEG_QUALITY, MAX_DIMENSION};

mod remote;
pub use remote::{CommentApi, ImageStore};

mod thread;
pub use thread::{perform_submission, send_submission, CommentThread, Sent, ThreadEvent};

mod tree;
pub use tree::{build_tree, CommentNode, CommentTree, Descendants, TreeBuilder, TreeError, MAX_DEPTH};

mod view;
pub use view::{
    AvatarSize, CommentTreeView, Navigation, Notice, RenderedComment, RepliesAffordance,
    RepliesSummary, MAX_SUMMARY_AVATARS,
};

pub mod api {
    pub use pixsns_api::*;
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::api::{Comment, CommentId, Time, UserId};

    pub fn comment(id: i64, parent: Option<i64>) -> Comment {
        Comment {
            id: CommentId(id),
            parent: parent.map(CommentId),
            post: None,
            content: format!("<p>comment {id}</p>"),
            image_url: None,
            user_name: None,
            user_uid: Some(UserId(format!("user{}", id % 3))),
            display_name: Some(format!("User {}", id % 3)),
            profile_image: Some(format!("https://img.example/{}.png", id % 3)),
            created_at: Time::default(),
        }
    }
}
