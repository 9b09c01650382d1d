use pixsns_client::{api::PostId, ThreadEvent};
use yew::prelude::*;

use crate::{ui, util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct AppProps {
    pub login: LoginInfo,
    pub on_logout: Callback<()>,
}

pub enum AppMsg {
    Logout,
    PostChanged(String),
    Thread(ThreadEvent),
}

pub struct App {
    post: Option<PostId>,
    post_input: String,

    /// Bumped whenever a thread reports a change, for the badge
    changes: usize,
}

impl Component for App {
    type Message = AppMsg;
    type Properties = AppProps;

    fn create(_ctx: &Context<Self>) -> Self {
        let post = util::post_from_location();
        App {
            post,
            post_input: post.map(|p| p.to_string()).unwrap_or_default(),
            changes: 0,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::Logout => {
                ctx.props().on_logout.emit(());
                false
            }
            AppMsg::PostChanged(input) => {
                self.post_input = input;
                match self.post_input.trim().parse::<PostId>() {
                    Ok(post) => {
                        util::set_post_in_location(post);
                        self.post = Some(post);
                    }
                    Err(err) => {
                        tracing::debug!(?err, input = ?self.post_input, "not a post id");
                        self.post = None;
                    }
                }
                true
            }
            AppMsg::Thread(ThreadEvent::CommentsChanged { post }) => {
                tracing::info!(%post, "comments changed");
                self.changes += 1;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let login = &ctx.props().login;
        let me = login
            .display_name
            .clone()
            .unwrap_or_else(|| login.session.user_id.to_string());
        html! {
            <div class="container">
                <nav class="d-flex align-items-center my-3">
                    <input
                        type="text"
                        class="form-control me-2"
                        placeholder="Post id"
                        value={self.post_input.clone()}
                        onchange={ctx.link().callback(|e: web_sys::Event| {
                            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                            AppMsg::PostChanged(input.value())
                        })}
                    />
                    if self.changes > 0 {
                        <span class="badge bg-secondary me-2" title="Changes this session">
                            { self.changes.to_string() }
                        </span>
                    }
                    <span class="me-2">{ me }</span>
                    <button
                        class="btn btn-outline-secondary"
                        onclick={ctx.link().callback(|_| AppMsg::Logout)}
                    >
                        { "Log out" }
                    </button>
                </nav>
                if let Some(post) = self.post {
                    <ui::CommentThread
                        key={post.to_string()}
                        login={login.clone()}
                        post={post}
                        on_event={ctx.link().callback(AppMsg::Thread)}
                        on_unauthorized={ctx.link().callback(|()| AppMsg::Logout)}
                    />
                } else {
                    <p class="text-muted">{ "Enter a post id to see its comments." }</p>
                }
            </div>
        }
    }
}
