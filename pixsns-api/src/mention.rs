use regex::Regex;

use crate::UserId;

lazy_static::lazy_static! {
    // <span class="mention" data-id="user01">@Someone</span>, as emitted by the editor
    static ref MENTION_SPAN: Regex =
        Regex::new(r#"(?s)<span[^>]*\bclass="[^"]*\bmention\b[^"]*"[^>]*>.*?</span>"#)
            .expect("compiling mention span regex");
    static ref DATA_ID: Regex =
        Regex::new(r#"data-id="([^"]+)""#).expect("compiling data-id regex");
    // @[user id with spaces] or @user_id
    static ref PLAIN_MENTION: Regex =
        Regex::new(r"@(?:\[([^\]]+)\]|([a-zA-Z0-9_.]+))").expect("compiling plain mention regex");
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Mention {
    /// `@ALL`, notifying everyone
    All,
    User(UserId),
}

impl Mention {
    fn from_id(id: &str) -> Mention {
        match id.eq_ignore_ascii_case("all") {
            true => Mention::All,
            false => Mention::User(UserId(id.to_string())),
        }
    }
}

/// Lists the users referenced from comment markup, in order of first
/// appearance and without duplicates
pub fn extract_mentions(content: &str) -> Vec<Mention> {
    let mut res = Vec::new();
    let mut push = |m: Mention| {
        if !res.contains(&m) {
            res.push(m);
        }
    };
    for span in MENTION_SPAN.find_iter(content) {
        if let Some(id) = DATA_ID.captures(span.as_str()).and_then(|c| c.get(1)) {
            push(Mention::from_id(id.as_str()));
        }
    }
    // the visible text of editor mentions is "@Display Name", which must not be
    // picked up a second time as a plain mention
    let rest = MENTION_SPAN.replace_all(content, "");
    for cap in DATA_ID.captures_iter(&rest) {
        push(Mention::from_id(&cap[1]));
    }
    for cap in PLAIN_MENTION.captures_iter(&rest) {
        if let Some(id) = cap.get(1).or_else(|| cap.get(2)) {
            push(Mention::from_id(id.as_str()));
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> Mention {
        Mention::User(UserId(id.to_string()))
    }

    #[test]
    fn editor_mentions() {
        let html = r#"<p>hi <span class="mention" data-type="mention" data-id="sato_1">@Sato</span> and <span data-id="kim" class="mention">@Kim</span></p>"#;
        assert_eq!(extract_mentions(html), vec![user("sato_1"), user("kim")]);
    }

    #[test]
    fn plain_mentions_and_all() {
        let html = "<p>@[old user] ping @ALL and @bob.k, again @bob.k</p>";
        assert_eq!(
            extract_mentions(html),
            vec![user("old user"), Mention::All, user("bob.k")]
        );
    }

    #[test]
    fn no_mentions() {
        assert!(extract_mentions("<p>nothing to see</p>").is_empty());
    }
}
