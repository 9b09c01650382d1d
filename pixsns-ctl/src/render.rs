use std::fmt::Write;

use pixsns_client::{html, CommentTreeView, RenderedComment, RepliesAffordance};

/// Expands every comment that has replies
pub fn expand_all(view: &mut CommentTreeView) {
    let ids = view.tree().comments().iter().map(|c| c.id).collect::<Vec<_>>();
    for id in ids {
        if !view.is_expanded(id) {
            view.toggle_replies(id);
        }
    }
}

pub fn render(rows: &[RenderedComment]) -> String {
    let mut out = String::new();
    for r in rows {
        let indent = "    ".repeat(r.depth.saturating_sub(1));
        let (head, body) = match r.connector_to_parent {
            false => (String::new(), String::from("  ")),
            true => (
                format!("{indent}{}", if r.connector_continues { "├─ " } else { "└─ " }),
                format!("{indent}{}", if r.connector_continues { "│    " } else { "     " }),
            ),
        };
        let menu = if r.show_menu { " [yours]" } else { "" };
        // writing into a String never fails
        let _ = writeln!(
            out,
            "{head}#{} {} ({}){menu}",
            r.id,
            r.author,
            r.created_at.format("%Y-%m-%d %H:%M")
        );
        for line in html::plain_text(&r.content).lines() {
            let _ = writeln!(out, "{body}{line}");
        }
        if let Some(img) = &r.image {
            let _ = writeln!(out, "{body}[image] {img}");
        }
        if let RepliesAffordance::Collapsed(summary) = &r.replies {
            let _ = writeln!(out, "{body}+ {}", summary.label());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixsns_client::api::{Comment, CommentId, PostId, Session, Time, UserId};

    fn comment(id: i64, parent: Option<i64>, author: &str) -> Comment {
        Comment {
            id: CommentId(id),
            parent: parent.map(CommentId),
            post: None,
            content: format!("<p>hello {id}</p>"),
            image_url: None,
            user_name: None,
            user_uid: Some(UserId(author.to_string())),
            display_name: Some(author.to_string()),
            profile_image: None,
            created_at: Time::default(),
        }
    }

    fn view() -> CommentTreeView {
        let mut session = Session::stub();
        session.user_id = UserId(String::from("bob"));
        let mut v = CommentTreeView::new(PostId::stub(), Some(session));
        let t = v.begin_fetch();
        v.finish_fetch(
            t,
            Ok(vec![
                comment(1, None, "alice"),
                comment(2, Some(1), "bob"),
                comment(3, Some(1), "carol"),
            ]),
        );
        v
    }

    #[test]
    fn collapsed() {
        assert_eq!(
            render(&view().render()),
            "#1 alice (1970-01-01 00:00)\n  hello 1\n  + 2 more replies\n"
        );
    }

    #[test]
    fn expanded() {
        let mut v = view();
        expand_all(&mut v);
        assert_eq!(
            render(&v.render()),
            "#1 alice (1970-01-01 00:00)\n  hello 1\n\
             ├─ #3 carol (1970-01-01 00:00)\n\
             │    hello 3\n\
             └─ #2 bob (1970-01-01 00:00) [yours]\n     hello 2\n"
        );
    }
}
