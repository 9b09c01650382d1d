use pixsns_client::{api::CommentId, AvatarSize, RenderedComment, RepliesAffordance};
use yew::prelude::*;

use crate::util;

#[derive(Clone, PartialEq, Properties)]
pub struct CommentRowProps {
    pub comment: RenderedComment,
    pub on_toggle_replies: Callback<CommentId>,
    pub on_reply: Callback<CommentId>,
    pub on_edit: Callback<CommentId>,
    pub on_delete: Callback<CommentId>,

    /// Called with the `data-id` of the clicked mention, if any
    pub on_body_click: Callback<Option<String>>,
}

#[function_component(CommentRow)]
pub fn comment_row(p: &CommentRowProps) -> Html {
    let c = &p.comment;
    let id = c.id;
    let avatar_class = match c.avatar_size {
        AvatarSize::Large => "avatar-lg",
        AvatarSize::Small => "avatar-sm",
    };
    let on_body_click = p.on_body_click.clone();
    let onclick_body = Callback::from(move |e: MouseEvent| {
        on_body_click.emit(util::clicked_mention(e.target()));
    });
    let replies = match &c.replies {
        RepliesAffordance::None => html! {},
        RepliesAffordance::Expanded => html! {
            <button
                class="btn btn-link btn-sm replies-toggle"
                onclick={p.on_toggle_replies.reform(move |_| id)}
            >
                { "Hide replies" }
            </button>
        },
        RepliesAffordance::Collapsed(summary) => html! {
            <button
                class="btn btn-link btn-sm replies-toggle d-flex align-items-center"
                onclick={p.on_toggle_replies.reform(move |_| id)}
            >
                <span class="reply-avatars me-1">
                    { for summary.avatars.iter().map(|a| html! {
                        <img class="avatar-xs" src={a.clone()} alt="" />
                    }) }
                </span>
                { summary.label() }
            </button>
        },
    };

    html! {
        <li
            class={classes!(
                "comment",
                c.connector_to_parent.then(|| "has-parent-connector"),
                c.connector_continues.then(|| "connector-continues"),
                (c.is_reply_target || c.is_edit_target).then(|| "is-target"),
                c.is_pending_delete.then(|| "is-pending-delete"),
            )}
            style={format!("--depth: {}", c.depth)}
        >
            <div class="d-flex">
                <img class={classes!("avatar", avatar_class)} src={c.avatar.clone()} alt="" />
                <div class="flex-grow-1">
                    <div class="comment-header d-flex">
                        <strong class="me-2">{ c.author.clone() }</strong>
                        <small class="text-muted">
                            { c.created_at.format("%Y-%m-%d %H:%M").to_string() }
                        </small>
                        if c.show_menu {
                            <div class="comment-menu ms-auto">
                                <button
                                    class="btn btn-link btn-sm"
                                    onclick={p.on_edit.reform(move |_| id)}
                                >
                                    { "Edit" }
                                </button>
                                <button
                                    class="btn btn-link btn-sm text-danger"
                                    onclick={p.on_delete.reform(move |_| id)}
                                >
                                    { "Delete" }
                                </button>
                            </div>
                        }
                    </div>
                    <div class="comment-body" onclick={onclick_body}>
                        { Html::from_html_unchecked(AttrValue::from(c.content.clone())) }
                    </div>
                    if let Some(img) = &c.image {
                        <img class="comment-image" src={img.clone()} alt="" />
                    }
                    <div class="d-flex">
                        <button
                            class="btn btn-link btn-sm"
                            onclick={p.on_reply.reform(move |_| id)}
                        >
                            { "Reply" }
                        </button>
                        { replies }
                    </div>
                </div>
            </div>
        </li>
    }
}
