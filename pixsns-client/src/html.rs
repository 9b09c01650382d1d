//! Small helpers for the editor's HTML, handled with regexes rather than a parser

use std::borrow::Cow;

use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("compiling tag regex");
    static ref ANCHOR_OPEN: Regex = Regex::new(r"(?i)<a\b([^>]*)>").expect("compiling anchor regex");
    static ref TARGET_OR_REL: Regex =
        Regex::new(r#"(?i)\s+(target|rel)\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("compiling attribute regex");
    static ref EMBED: Regex =
        Regex::new(r#"(?i)<img\b|data-id="|ogp-card"#).expect("compiling embed regex");
    static ref ACTIVE_BLOCK: Regex =
        Regex::new(r"(?is)<(script|style|iframe|object|embed)\b[^>]*>.*?</\s*(script|style|iframe|object|embed)\s*>")
            .expect("compiling active block regex");
    static ref ACTIVE_TAG: Regex =
        Regex::new(r"(?i)</?\s*(script|style|iframe|object|embed|base|meta|link)\b[^>]*>")
            .expect("compiling active tag regex");
    static ref EVENT_ATTR: Regex =
        Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
            .expect("compiling event attribute regex");
    static ref SCRIPT_URL: Regex = Regex::new(
        r#"(?i)\s+(href|src|action|formaction)\s*=\s*("\s*(javascript|vbscript|data):[^"]*"|'\s*(javascript|vbscript|data):[^']*'|(javascript|vbscript|data):[^\s>]*)"#
    )
    .expect("compiling script url regex");
}

/// Whether the markup has nothing worth posting: no text once tags are
/// stripped, and no embedded image, mention or link card
pub fn is_blank(html: &str) -> bool {
    !EMBED.is_match(html) && plain_text(html).trim().is_empty()
}

/// Strips tags and decodes the handful of entities the editor emits
pub fn plain_text(html: &str) -> String {
    let with_breaks = html
        .replace("</p>", "</p>\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    let text = TAG.replace_all(&with_breaks, "");
    decode_entities(&text).trim_end().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Turns typed text into editor-style markup, one `<p>` per line
pub fn from_plain_text(text: &str) -> String {
    text.lines()
        .map(|l| match l.trim().is_empty() {
            true => String::from("<p></p>"),
            false => format!("<p>{}</p>", escape(l)),
        })
        .collect()
}

/// Makes every link open outside the app, without giving the target page a
/// handle on us
pub fn harden_links(html: &str) -> Cow<'_, str> {
    ANCHOR_OPEN.replace_all(html, |caps: &Captures<'_>| {
        let attrs = TARGET_OR_REL.replace_all(&caps[1], "");
        format!(r#"<a{attrs} target="_blank" rel="noopener noreferrer">"#)
    })
}

/// Carries a plain-text edit of `markup` back into markup.
///
/// Unchanged text keeps the markup as it is, and text added at the end of the
/// last paragraph is appended there, so mentions and links survive. Any other
/// edit rebuilds the markup from the text.
pub fn apply_text_edit(markup: &str, text: &str) -> String {
    let before = plain_text(markup);
    if text.trim_end() == before {
        return markup.to_string();
    }
    if let (false, Some(added)) = (before.is_empty(), text.strip_prefix(before.as_str())) {
        if let Some(head) = markup.trim_end().strip_suffix("</p>") {
            if !added.contains('\n') {
                return format!("{head}{}</p>", escape(added));
            }
        }
    }
    from_plain_text(text)
}

/// Drops what could run code from stored markup (script-like elements, `on*`
/// handlers, `javascript:`/`data:` URLs), then hardens links. The result is
/// meant to be injected as-is into a page.
pub fn sanitize(html: &str) -> String {
    let html = ACTIVE_BLOCK.replace_all(html, "");
    let html = ACTIVE_TAG.replace_all(&html, "");
    let html = TAG.replace_all(&html, |caps: &Captures<'_>| {
        let tag = EVENT_ATTR.replace_all(&caps[0], "");
        SCRIPT_URL.replace_all(&tag, "").into_owned()
    });
    harden_links(&html).into_owned()
}
