use pixsns_client::{
    api::{Comment, CommentId, PostId},
    CommentTreeView, Error, Navigation, OptimizedImage, Sent, ThreadEvent, Ticket,
};
use yew::prelude::*;

use crate::{api, ui, util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct CommentThreadProps {
    pub login: LoginInfo,
    pub post: PostId,
    pub on_event: Callback<ThreadEvent>,

    /// The server no longer accepts the session
    pub on_unauthorized: Callback<()>,
}

pub enum ThreadMsg {
    Refresh,
    Fetched(Ticket, Result<Vec<Comment>, Error>),

    ToggleReplies(CommentId),
    StartReply(CommentId),
    StartEdit(CommentId),
    CancelCompose,
    ContentChanged(String),
    ImagePicked(web_sys::File),
    ImageRead(Result<OptimizedImage, Error>),
    RemoveImage,

    Submit,
    Submitted(Sent),

    Delete(CommentId),
    Deleted(Result<(), Error>),

    BodyClicked(Option<String>),
    DismissNotice,
}

/// Comment thread of one post. Owns the view model and runs its requests.
pub struct CommentThread {
    view: CommentTreeView,
    remote: api::Remote,
    reading_image: bool,
}

impl CommentThread {
    fn refresh(&mut self, ctx: &Context<Self>) {
        let ticket = self.view.begin_fetch();
        let remote = self.remote.clone();
        let post = self.view.post();
        ctx.link().send_future(async move {
            ThreadMsg::Fetched(ticket, remote.fetch(post).await)
        });
    }

    fn refused(&self, what: &str, err: Error) {
        tracing::warn!(?err, "{what} refused");
    }

    fn comments_changed(&mut self, ctx: &Context<Self>) {
        self.refresh(ctx);
        ctx.props().on_event.emit(ThreadEvent::CommentsChanged {
            post: self.view.post(),
        });
    }
}

impl Component for CommentThread {
    type Message = ThreadMsg;
    type Properties = CommentThreadProps;

    fn create(ctx: &Context<Self>) -> Self {
        let login = &ctx.props().login;
        let mut this = CommentThread {
            view: CommentTreeView::new(ctx.props().post, Some(login.session.clone())),
            remote: api::Remote::new(login),
            reading_image: false,
        };
        this.refresh(ctx);
        this
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ThreadMsg::Refresh => self.refresh(ctx),
            ThreadMsg::Fetched(ticket, res) => {
                if matches!(&res, Err(e) if e.is_unauthorized()) {
                    tracing::warn!("session is no longer valid");
                    ctx.props().on_unauthorized.emit(());
                }
                return self.view.finish_fetch(ticket, res) || self.view.notice().is_some();
            }
            ThreadMsg::ToggleReplies(id) => {
                self.view.toggle_replies(id);
            }
            ThreadMsg::StartReply(id) => {
                if let Err(err) = self.view.start_reply(id) {
                    self.refused("reply", err);
                }
            }
            ThreadMsg::StartEdit(id) => {
                if let Err(err) = self.view.start_edit(id) {
                    self.refused("edit", err);
                }
            }
            ThreadMsg::CancelCompose => {
                if let Err(err) = self.view.cancel_compose() {
                    self.refused("cancel", err);
                }
            }
            ThreadMsg::ContentChanged(text) => {
                if let Err(err) = self.view.set_text(&text) {
                    self.refused("edit", err);
                }
            }
            ThreadMsg::ImagePicked(file) => {
                self.reading_image = true;
                ctx.link()
                    .send_future(async move { ThreadMsg::ImageRead(api::read_image(file).await) });
            }
            ThreadMsg::ImageRead(res) => {
                self.reading_image = false;
                match res.and_then(|img| self.view.stage_image(img)) {
                    Ok(()) => (),
                    Err(Error::Busy) => self.refused("image", Error::Busy),
                    Err(err) => {
                        tracing::error!(?err, "failed preparing image");
                        util::alert(&err.user_message());
                    }
                }
            }
            ThreadMsg::RemoveImage => {
                if let Err(err) = self.view.remove_image() {
                    self.refused("image removal", err);
                }
            }
            ThreadMsg::Submit => match self.view.begin_submit() {
                Ok(sub) => {
                    let remote = self.remote.clone();
                    ctx.link()
                        .send_future(async move { ThreadMsg::Submitted(remote.submit(sub).await) });
                }
                Err(err) => self.refused("submission", err),
            },
            ThreadMsg::Submitted(Sent { uploaded, result }) => {
                if let Some(url) = uploaded {
                    self.view.record_upload(url);
                }
                self.view.finish_submit(result.as_ref());
                match result {
                    Ok(_) => self.comments_changed(ctx),
                    Err(e) if e.is_unauthorized() => ctx.props().on_unauthorized.emit(()),
                    Err(_) => (),
                }
            }
            ThreadMsg::Delete(id) => {
                if let Err(err) = self.view.request_delete(id) {
                    self.refused("deletion", err);
                    return false;
                }
                let confirmed = util::confirm("Delete this comment?");
                match self.view.confirm_delete(confirmed) {
                    Ok(Some(id)) => {
                        let remote = self.remote.clone();
                        ctx.link()
                            .send_future(async move { ThreadMsg::Deleted(remote.delete(id).await) });
                    }
                    Ok(None) => (),
                    Err(err) => self.refused("deletion", err),
                }
            }
            ThreadMsg::Deleted(res) => {
                self.view.finish_delete(res.as_ref().map(|_| ()));
                if res.is_ok() {
                    self.comments_changed(ctx);
                }
            }
            ThreadMsg::BodyClicked(data_id) => {
                if let Some(Navigation::Profile(user)) = self.view.click_body(data_id.as_deref()) {
                    util::open_profile(&user);
                }
                return false;
            }
            ThreadMsg::DismissNotice => self.view.dismiss_notice(),
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let rows = self.view.render();
        html! {
            <section class="comment-thread">
                <ui::NoticeBanner
                    notice={self.view.notice().cloned()}
                    on_dismiss={link.callback(|()| ThreadMsg::DismissNotice)}
                />
                if self.view.is_loading() && rows.is_empty() {
                    <div class="spinner-border m-3" role="status"></div>
                } else if rows.is_empty() {
                    <p class="text-muted">{ "No comments yet." }</p>
                }
                <ul class="comment-list list-unstyled">
                    { for rows.into_iter().map(|c| {
                        let key = c.id.0;
                        html! {
                            <ui::CommentRow
                                key={key}
                                comment={c}
                                on_toggle_replies={link.callback(ThreadMsg::ToggleReplies)}
                                on_reply={link.callback(ThreadMsg::StartReply)}
                                on_edit={link.callback(ThreadMsg::StartEdit)}
                                on_delete={link.callback(ThreadMsg::Delete)}
                                on_body_click={link.callback(ThreadMsg::BodyClicked)}
                            />
                        }
                    }) }
                </ul>
                <ui::ComposerBox
                    composer={self.view.composer().clone()}
                    target={self.view.target()}
                    reading_image={self.reading_image}
                    on_input={link.callback(ThreadMsg::ContentChanged)}
                    on_image={link.callback(ThreadMsg::ImagePicked)}
                    on_remove_image={link.callback(|()| ThreadMsg::RemoveImage)}
                    on_cancel={link.callback(|()| ThreadMsg::CancelCompose)}
                    on_submit={link.callback(|()| ThreadMsg::Submit)}
                />
                <button
                    class="btn btn-link btn-sm"
                    disabled={self.view.is_loading()}
                    onclick={link.callback(|_| ThreadMsg::Refresh)}
                >
                    { "Refresh" }
                </button>
            </section>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.view.close();
        self.remote.cancel.cancel();
    }
}
