use async_trait::async_trait;

use crate::{
    api::{Comment, CommentId, CommentUpdate, NewComment, PostId, Profile},
    Error, OptimizedImage,
};

/// The comment endpoints of the REST API.
///
/// Futures are not required to be `Send`, as browser requests are not.
#[async_trait(?Send)]
pub trait CommentApi {
    /// Flat list of all the comments of a post, in the server's order
    async fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error>;
    async fn create_comment(&self, post: PostId, c: &NewComment) -> Result<Comment, Error>;
    async fn update_comment(&self, id: CommentId, c: &CommentUpdate) -> Result<Comment, Error>;
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;
    async fn whoami(&self) -> Result<Profile, Error>;
}

#[async_trait(?Send)]
pub trait ImageStore {
    /// Uploads the image and returns its public URL
    async fn upload(&self, img: &OptimizedImage) -> Result<String, Error>;
}

#[async_trait(?Send)]
impl<T: CommentApi + ?Sized> CommentApi for &T {
    async fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error> {
        (**self).fetch_comments(post).await
    }

    async fn create_comment(&self, post: PostId, c: &NewComment) -> Result<Comment, Error> {
        (**self).create_comment(post, c).await
    }

    async fn update_comment(&self, id: CommentId, c: &CommentUpdate) -> Result<Comment, Error> {
        (**self).update_comment(id, c).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        (**self).delete_comment(id).await
    }

    async fn whoami(&self) -> Result<Profile, Error> {
        (**self).whoami().await
    }
}

#[async_trait(?Send)]
impl<T: ImageStore + ?Sized> ImageStore for &T {
    async fn upload(&self, img: &OptimizedImage) -> Result<String, Error> {
        (**self).upload(img).await
    }
}

/// Lets callers without an object store still build a thread, as long as no
/// image gets attached
#[async_trait(?Send)]
impl<T: ImageStore> ImageStore for Option<T> {
    async fn upload(&self, img: &OptimizedImage) -> Result<String, Error> {
        match self {
            Some(store) => store.upload(img).await,
            None => Err(Error::NoImageStore),
        }
    }
}
