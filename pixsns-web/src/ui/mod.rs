mod app;
pub use app::{App, AppMsg};

mod comment_row;
pub use comment_row::CommentRow;

mod comment_thread;
pub use comment_thread::{CommentThread, ThreadMsg};

mod composer;
pub use composer::ComposerBox;

mod login;
pub use login::Login;

mod notice_banner;
pub use notice_banner::NoticeBanner;
