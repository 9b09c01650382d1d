use pixsns_client::{html, ComposeTarget, Composer, StagedImage};
use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct ComposerProps {
    pub composer: Composer,
    pub target: Option<ComposeTarget>,

    /// Whether an image is being read and optimised
    pub reading_image: bool,

    /// Plain text, as typed
    pub on_input: Callback<String>,
    pub on_image: Callback<web_sys::File>,
    pub on_remove_image: Callback<()>,
    pub on_cancel: Callback<()>,
    pub on_submit: Callback<()>,
}

#[function_component(ComposerBox)]
pub fn composer_box(p: &ComposerProps) -> Html {
    let c = &p.composer;
    let heading = match p.target {
        None => String::from("Add a comment"),
        Some(ComposeTarget::Reply(id)) => format!("Replying to #{id}"),
        Some(ComposeTarget::Edit(id)) => format!("Editing #{id}"),
    };
    let preview = match c.image() {
        None => None,
        Some(StagedImage::Uploaded(url)) => Some(html! {
            <img class="composer-image" src={url.clone()} alt="" />
        }),
        Some(StagedImage::Pending(img)) => Some(html! {
            <span class="composer-image-name">
                { format!("{} ({}x{})", img.file_name, img.width, img.height) }
            </span>
        }),
    };
    let on_input = p.on_input.clone();
    let oninput = Callback::from(move |e: InputEvent| {
        let area: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
        on_input.emit(area.value());
    });
    let on_image = p.on_image.clone();
    let onchange_file = Callback::from(move |e: Event| {
        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
        if let Some(file) = input.files().and_then(|files| files.get(0)) {
            on_image.emit(file);
        }
        // allow picking the same file again after removing it
        input.set_value("");
    });
    let on_submit = p.on_submit.clone();
    let onsubmit = Callback::from(move |e: SubmitEvent| {
        e.prevent_default();
        on_submit.emit(());
    });
    let submitting = c.is_submitting();

    html! {
        <form class="composer my-3" {onsubmit}>
            <div class="d-flex align-items-center mb-1">
                <strong>{ heading }</strong>
                if p.target.is_some() {
                    <button
                        type="button"
                        class="btn btn-link btn-sm ms-auto"
                        disabled={submitting}
                        onclick={p.on_cancel.reform(|_| ())}
                    >
                        { "Cancel" }
                    </button>
                }
            </div>
            <textarea
                class="form-control"
                rows="3"
                value={html::plain_text(c.content())}
                disabled={submitting}
                {oninput}
            />
            <div class="d-flex align-items-center mt-1">
                if let Some(preview) = preview {
                    { preview }
                    <button
                        type="button"
                        class="btn btn-link btn-sm"
                        disabled={submitting}
                        onclick={p.on_remove_image.reform(|_| ())}
                    >
                        { "Remove image" }
                    </button>
                } else {
                    <input
                        type="file"
                        accept="image/*"
                        class="form-control form-control-sm w-auto"
                        disabled={submitting || p.reading_image}
                        onchange={onchange_file}
                    />
                }
                <button
                    type="submit"
                    class="btn btn-primary btn-sm ms-auto"
                    disabled={!c.can_submit() || p.reading_image}
                >
                    if submitting {
                        <span class="spinner-border spinner-border-sm" role="status"></span>
                    } else {
                        { "Send" }
                    }
                </button>
            </div>
        </form>
    }
}
