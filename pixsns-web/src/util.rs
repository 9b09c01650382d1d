use pixsns_client::api::{PostId, UserId};

fn window() -> Option<web_sys::Window> {
    web_sys::window()
}

/// The post whose comments to show, taken from the `#<post id>` fragment
pub fn post_from_location() -> Option<PostId> {
    let hash = window()?.location().hash().ok()?;
    hash.trim_start_matches('#').parse().ok()
}

pub fn set_post_in_location(post: PostId) {
    if let Some(w) = window() {
        if let Err(err) = w.location().set_hash(&post.to_string()) {
            tracing::warn!(?err, "failed updating location");
        }
    }
}

pub fn open_profile(user: &UserId) {
    if let Some(w) = window() {
        if let Err(err) = w.location().set_href(&format!("/profile/{user}")) {
            tracing::error!(?err, %user, "failed navigating to profile");
        }
    }
}

pub fn alert(message: &str) {
    if let Some(Err(err)) = window().map(|w| w.alert_with_message(message)) {
        tracing::error!(?err, "failed showing alert");
    }
}

/// Asks the user, with the browser's own dialog
pub fn confirm(question: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(question).ok())
        .unwrap_or(false)
}

/// The `data-id` of the mention marker an event happened in, if any
pub fn clicked_mention(target: Option<web_sys::EventTarget>) -> Option<String> {
    use wasm_bindgen::JsCast;
    let elt = target?.dyn_into::<web_sys::Element>().ok()?;
    elt.closest("span.mention").ok()??.get_attribute("data-id")
}
