use pixsns_client::Notice;
use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
    pub on_dismiss: Callback<()>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(p: &NoticeBannerProps) -> Html {
    let (class, text) = match &p.notice {
        None => return html! {},
        Some(Notice::Error(msg)) => ("alert-danger", msg.clone()),
        Some(Notice::Info(msg)) => ("alert-info", msg.clone()),
    };
    html! {
        <div class={classes!("alert", class, "d-flex", "align-items-center")} role="alert">
            <div>{ text }</div>
            <button
                type="button"
                class="btn-close ms-auto"
                aria-label="Close"
                onclick={p.on_dismiss.reform(|_| ())}
            />
        </div>
    }
}
