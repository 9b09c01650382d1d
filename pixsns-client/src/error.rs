use crate::{
    api::{self, CommentId},
    Cancelled, ImageError, TreeError,
};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Transport(String),

    #[error(transparent)]
    Rejected(#[from] api::Error),

    #[error("could not decode server response: {0}")]
    Decode(String),

    #[error("there is nothing to submit")]
    EmptyComposer,

    #[error("a submission is already in flight")]
    Busy,

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("comment {0} is not part of this thread")]
    UnknownComment(CommentId),

    #[error("comment {0} belongs to someone else")]
    NotOwner(CommentId),

    #[error("no deletion is awaiting confirmation")]
    NoPendingDelete,

    #[error("no image store is configured")]
    NoImageStore,
}

impl Error {
    /// Whether the session should be torn down
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Rejected(api::Error::Unauthorized(_)))
    }

    /// Text suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyComposer => String::from("Write something first."),
            Error::Busy => String::from("Still sending, please wait."),
            Error::Image(_) => String::from("This image could not be used."),
            _ => String::from(GENERIC_FAILURE),
        }
    }

    /// Like [`Error::user_message`], but preferring what the server said
    pub fn server_or_user_message(&self) -> String {
        match self {
            Error::Rejected(e) => e
                .server_message()
                .map(String::from)
                .unwrap_or_else(|| self.user_message()),
            _ => self.user_message(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Decode(e.to_string())
    }
}

impl From<Cancelled> for Error {
    fn from(_: Cancelled) -> Error {
        Error::Cancelled
    }
}
