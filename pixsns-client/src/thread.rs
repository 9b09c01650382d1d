use std::future::Future;

use futures::channel::mpsc;

use crate::{
    api::{Comment, CommentId, CommentUpdate, NewComment, PostId},
    CancelToken, CommentApi, CommentTreeView, ComposeTarget, Error, ImageStore, StagedImage,
    Submission,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ThreadEvent {
    /// A comment was created, edited or deleted on this post
    CommentsChanged { post: PostId },
}

/// Sends a submission whose image, if any, is already uploaded
pub async fn perform_submission<A: CommentApi>(
    api: &A,
    sub: &Submission,
    image_url: Option<String>,
) -> Result<Comment, Error> {
    let content = sub.content.clone();
    match sub.target {
        Some(ComposeTarget::Edit(id)) => {
            api.update_comment(id, &CommentUpdate { content, image_url })
                .await
        }
        Some(ComposeTarget::Reply(parent)) => {
            let c = NewComment {
                content,
                image_url,
                parent: Some(parent),
            };
            api.create_comment(sub.post, &c).await
        }
        None => {
            let c = NewComment {
                content,
                image_url,
                parent: None,
            };
            api.create_comment(sub.post, &c).await
        }
    }
}

/// What came of [`send_submission`]
#[derive(Debug)]
pub struct Sent {
    /// URL of the image uploaded on the way, kept even when sending failed so
    /// that a retry does not upload it again
    pub uploaded: Option<String>,
    pub result: Result<Comment, Error>,
}

/// Uploads the pending image, if any, then creates or updates the comment.
/// Both steps stop early once `cancel` fires.
pub async fn send_submission<A: CommentApi, S: ImageStore>(
    api: &A,
    store: &S,
    cancel: &CancelToken,
    sub: &Submission,
) -> Sent {
    let (uploaded, image_url) = match &sub.image {
        None => (None, None),
        Some(StagedImage::Uploaded(url)) => (None, Some(url.clone())),
        Some(StagedImage::Pending(img)) => match cancel.run(store.upload(img)).await {
            Ok(Ok(url)) => {
                tracing::debug!(%url, "uploaded image");
                (Some(url.clone()), Some(url))
            }
            Ok(Err(e)) => return Sent { uploaded: None, result: Err(e) },
            Err(c) => return Sent { uploaded: None, result: Err(c.into()) },
        },
    };
    let result = match cancel.run(perform_submission(api, sub, image_url)).await {
        Ok(res) => res,
        Err(c) => Err(c.into()),
    };
    Sent { uploaded, result }
}

/// Drives a [`CommentTreeView`] against the network.
///
/// Requests run one after the other: upload, then create or update, then
/// re-fetch. All of them are aborted by `close`.
pub struct CommentThread<A, S> {
    api: A,
    store: S,
    view: CommentTreeView,
    cancel: CancelToken,
    feeds: Vec<mpsc::UnboundedSender<ThreadEvent>>,
}

impl<A: CommentApi, S: ImageStore> CommentThread<A, S> {
    pub fn new(api: A, store: S, view: CommentTreeView) -> CommentThread<A, S> {
        CommentThread {
            api,
            store,
            view,
            cancel: CancelToken::new(),
            feeds: Vec::new(),
        }
    }

    pub fn view(&self) -> &CommentTreeView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CommentTreeView {
        &mut self.view
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Token aborting everything this thread has in flight
    pub fn canceller(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Receives an event after every successful mutation
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ThreadEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.feeds.push(tx);
        rx
    }

    fn broadcast(&mut self, ev: ThreadEvent) {
        self.feeds.retain(|f| f.unbounded_send(ev.clone()).is_ok());
    }

    async fn guarded<T>(&self, fut: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        self.cancel.run(fut).await?
    }

    /// Fetches the listing and rebuilds the tree, returning whether the
    /// result was applied
    pub async fn refresh(&mut self) -> bool {
        let ticket = self.view.begin_fetch();
        let res = self
            .guarded(self.api.fetch_comments(self.view.post()))
            .await;
        self.view.finish_fetch(ticket, res)
    }

    pub async fn submit(&mut self) -> Result<Comment, Error> {
        let sub = self.view.begin_submit()?;
        let res = self.send(&sub).await;
        self.view.finish_submit(res.as_ref());
        let comment = res?;
        self.refresh().await;
        self.broadcast(ThreadEvent::CommentsChanged { post: sub.post });
        Ok(comment)
    }

    async fn send(&mut self, sub: &Submission) -> Result<Comment, Error> {
        let sent = send_submission(&self.api, &self.store, &self.cancel, sub).await;
        if let Some(url) = sent.uploaded {
            self.view.record_upload(url);
        }
        sent.result
    }

    /// Resolves the pending delete confirmation, and deletes if confirmed.
    /// Returns the deleted comment, if any.
    pub async fn delete(&mut self, confirmed: bool) -> Result<Option<CommentId>, Error> {
        let Some(id) = self.view.confirm_delete(confirmed)? else {
            return Ok(None);
        };
        let res = self.guarded(self.api.delete_comment(id)).await;
        self.view.finish_delete(res.as_ref().map(|_| ()));
        res?;
        self.refresh().await;
        self.broadcast(ThreadEvent::CommentsChanged {
            post: self.view.post(),
        });
        Ok(Some(id))
    }

    /// Aborts in-flight requests and stops applying their results
    pub fn close(&mut self) {
        self.view.close();
        self.cancel.cancel();
        self.feeds.clear();
    }
}

impl<A, S> Drop for CommentThread<A, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
