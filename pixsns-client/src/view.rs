use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::{self, extract_mentions, Comment, CommentId, Mention, PostId, Session, Time, UserId},
    html, CommentNode, CommentTree, ComposeTarget, Composer, Error, OptimizedImage, Submission,
    Ticket, TreeBuilder,
};

/// At most this many avatars are shown next to a collapsed reply count
pub const MAX_SUMMARY_AVATARS: usize = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvatarSize {
    Large,
    Small,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RepliesSummary {
    /// Distinct avatars of repliers, first met first
    pub avatars: Vec<String>,

    /// All descendants, not only direct replies
    pub count: usize,
}

impl RepliesSummary {
    pub fn label(&self) -> String {
        format!("{} more replies", self.count)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RepliesAffordance {
    None,
    Collapsed(RepliesSummary),
    Expanded,
}

/// One visible comment, ready to be drawn
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedComment {
    pub id: CommentId,
    pub depth: usize,
    pub author: String,
    pub author_id: Option<UserId>,
    pub avatar: String,
    pub avatar_size: AvatarSize,
    pub created_at: Time,

    /// Stored markup without scripts or event handlers, links hardened
    pub content: String,
    pub image: Option<String>,
    pub mentions: Vec<Mention>,

    pub connector_to_parent: bool,
    pub connector_continues: bool,

    /// Whether edit and delete are offered
    pub show_menu: bool,
    pub replies: RepliesAffordance,
    pub is_reply_target: bool,
    pub is_edit_target: bool,
    pub is_pending_delete: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Navigation {
    Profile(UserId),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    Error(String),
    Info(String),
}

/// State of the comment thread of one post, as shown to one user.
///
/// This holds everything the thread UI needs besides the network: the built
/// tree, which nodes are expanded, which comment is being replied to or
/// edited, the composer, and the delete confirmation. Requests are issued by
/// the caller, which reports their outcome back through the `finish_*`
/// methods. After any successful mutation the caller is expected to re-fetch,
/// as the tree is never patched in place.
#[derive(Debug)]
pub struct CommentTreeView {
    session: Option<Session>,
    post: PostId,
    tree: CommentTree,
    expanded: HashMap<CommentId, bool>,
    target: Option<ComposeTarget>,
    composer: Composer,
    pending_delete: Option<CommentId>,
    deleting: Option<CommentId>,
    notice: Option<Notice>,
    generation: u64,
    loading: bool,
    closed: bool,
}

impl CommentTreeView {
    pub fn new(post: PostId, session: Option<Session>) -> CommentTreeView {
        CommentTreeView::with_builder(post, session, TreeBuilder::default())
    }

    pub fn with_builder(
        post: PostId,
        session: Option<Session>,
        builder: TreeBuilder,
    ) -> CommentTreeView {
        CommentTreeView {
            session,
            post,
            tree: CommentTree::new(builder),
            expanded: HashMap::new(),
            target: None,
            composer: Composer::default(),
            pending_delete: None,
            deleting: None,
            notice: None,
            generation: 0,
            loading: false,
            closed: false,
        }
    }

    pub fn post(&self) -> PostId {
        self.post
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn roots(&self) -> &[CommentNode] {
        self.tree.roots()
    }

    pub fn target(&self) -> Option<ComposeTarget> {
        self.target
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn pending_delete(&self) -> Option<CommentId> {
        self.pending_delete
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_expanded(&self, id: CommentId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// Whether the session user may edit or delete this comment
    pub fn owns(&self, c: &Comment) -> bool {
        self.session
            .as_ref()
            .map(|s| s.owns(c.user_uid.as_ref()))
            .unwrap_or(false)
    }

    fn owned_node(&self, id: CommentId) -> Result<&CommentNode, Error> {
        let node = self.tree.node(id).ok_or(Error::UnknownComment(id))?;
        if !self.owns(node) {
            return Err(Error::NotOwner(id));
        }
        Ok(node)
    }

    fn show_error(&mut self, what: &str, err: &Error, message: String) {
        match err {
            Error::Cancelled => tracing::debug!(post = %self.post, "{what} was cancelled"),
            err => {
                tracing::error!(post = %self.post, ?err, "{what} failed");
                self.notice = Some(Notice::Error(message));
            }
        }
    }

    /// Marks the start of a fetch. Only the result of the latest fetch
    /// started is applied.
    pub fn begin_fetch(&mut self) -> Ticket {
        self.generation += 1;
        self.loading = true;
        Ticket(self.generation)
    }

    /// Applies a fetched listing, returning whether it was used
    pub fn finish_fetch(&mut self, ticket: Ticket, res: Result<Vec<Comment>, Error>) -> bool {
        if self.closed || ticket != Ticket(self.generation) {
            tracing::debug!(post = %self.post, ?ticket, "ignoring superseded fetch");
            return false;
        }
        self.loading = false;
        let comments = match res {
            Ok(comments) => comments,
            Err(err) => {
                let msg = err.user_message();
                self.show_error("fetching comments", &err, msg);
                return false;
            }
        };
        match self.tree.update(Arc::new(comments)) {
            Ok(_) => {
                let ids = self.tree.comments().iter().map(|c| c.id).collect::<HashSet<_>>();
                self.expanded.retain(|id, _| ids.contains(id));
                tracing::debug!(post = %self.post, comments = self.tree.len(), "rebuilt comment tree");
                true
            }
            Err(err) => {
                let err = Error::from(err);
                let msg = err.user_message();
                self.show_error("building comment tree", &err, msg);
                false
            }
        }
    }

    /// Expands or collapses the replies of a comment, returning whether they
    /// are now shown
    pub fn toggle_replies(&mut self, id: CommentId) -> bool {
        let has_replies = self
            .tree
            .node(id)
            .map(|n| !n.replies.is_empty())
            .unwrap_or(false);
        if !has_replies {
            return false;
        }
        let e = self.expanded.entry(id).or_insert(false);
        *e = !*e;
        *e
    }

    pub fn start_reply(&mut self, id: CommentId) -> Result<(), Error> {
        if self.composer.is_submitting() {
            return Err(Error::Busy);
        }
        if self.tree.node(id).is_none() {
            return Err(Error::UnknownComment(id));
        }
        if matches!(self.target, Some(ComposeTarget::Edit(_))) {
            // the seeded text belongs to the comment being edited
            self.composer.clear();
        }
        self.target = Some(ComposeTarget::Reply(id));
        self.composer.touch();
        tracing::debug!(post = %self.post, %id, "replying");
        Ok(())
    }

    pub fn start_edit(&mut self, id: CommentId) -> Result<(), Error> {
        if self.composer.is_submitting() {
            return Err(Error::Busy);
        }
        let node = self.owned_node(id)?;
        let (content, image) = (node.content.clone(), node.image().map(String::from));
        self.target = Some(ComposeTarget::Edit(id));
        self.composer.seed(content, image);
        tracing::debug!(post = %self.post, %id, "editing");
        Ok(())
    }

    /// Drops the reply or edit target along with whatever was typed
    pub fn cancel_compose(&mut self) -> Result<(), Error> {
        if self.composer.is_submitting() {
            return Err(Error::Busy);
        }
        self.target = None;
        self.composer.clear();
        Ok(())
    }

    fn ensure_editable(&self) -> Result<(), Error> {
        match self.composer.is_submitting() {
            true => Err(Error::Busy),
            false => Ok(()),
        }
    }

    /// Replaces the composer's markup
    pub fn set_content(&mut self, content: String) -> Result<(), Error> {
        self.ensure_editable()?;
        self.composer.set_content(content);
        Ok(())
    }

    /// Applies text typed in a plain editor, keeping the markup of what was
    /// not changed
    pub fn set_text(&mut self, text: &str) -> Result<(), Error> {
        self.ensure_editable()?;
        self.composer.set_text(text);
        Ok(())
    }

    pub fn stage_image(&mut self, img: OptimizedImage) -> Result<(), Error> {
        self.ensure_editable()?;
        self.composer.stage_image(img);
        Ok(())
    }

    pub fn remove_image(&mut self) -> Result<(), Error> {
        self.ensure_editable()?;
        self.composer.remove_image();
        Ok(())
    }

    /// Freezes the composer and hands out what needs to be sent.
    ///
    /// Nothing is handed out when the composer is empty or a submission is
    /// already in flight, so no request may be issued on error.
    pub fn begin_submit(&mut self) -> Result<Submission, Error> {
        if self.session.is_none() {
            return Err(Error::Rejected(api::Error::Unauthorized(None)));
        }
        let (content, image) = self.composer.begin_submit()?;
        Ok(Submission {
            post: self.post,
            target: self.target,
            content,
            image,
        })
    }

    pub fn record_upload(&mut self, url: String) {
        self.composer.image_uploaded(url);
    }

    pub fn finish_submit(&mut self, res: Result<&Comment, &Error>) {
        match res {
            Ok(c) => {
                tracing::debug!(post = %self.post, id = %c.id, "submitted comment");
                if let Some(ComposeTarget::Reply(parent)) = self.target {
                    self.expanded.insert(parent, true);
                }
                self.composer.submit_succeeded();
                self.target = None;
                self.notice = None;
            }
            Err(err) => {
                self.composer.submit_failed();
                self.show_error("submitting comment", err, err.user_message());
            }
        }
    }

    /// Asks for confirmation before deleting one of the session user's
    /// comments
    pub fn request_delete(&mut self, id: CommentId) -> Result<(), Error> {
        if self.deleting.is_some() {
            return Err(Error::Busy);
        }
        self.owned_node(id)?;
        self.pending_delete = Some(id);
        Ok(())
    }

    /// Resolves the pending confirmation. Returns the comment to delete, if
    /// the user confirmed.
    pub fn confirm_delete(&mut self, confirmed: bool) -> Result<Option<CommentId>, Error> {
        let id = self.pending_delete.take().ok_or(Error::NoPendingDelete)?;
        if !confirmed {
            tracing::debug!(post = %self.post, %id, "deletion cancelled");
            return Ok(None);
        }
        self.deleting = Some(id);
        Ok(Some(id))
    }

    pub fn finish_delete(&mut self, res: Result<(), &Error>) {
        let id = self.deleting.take();
        match res {
            Ok(()) => {
                if let (Some(id), Some(ComposeTarget::Reply(t) | ComposeTarget::Edit(t))) =
                    (id, self.target)
                {
                    if id == t && !self.composer.is_submitting() {
                        self.target = None;
                        self.composer.clear();
                    }
                }
                self.notice = Some(Notice::Info(String::from("Comment deleted.")));
            }
            Err(err) => {
                self.show_error("deleting comment", err, err.server_or_user_message());
            }
        }
    }

    /// Interprets a click on a comment body. `data_id` is the `data-id` of
    /// the mention marker the click landed on, if any.
    pub fn click_body(&self, data_id: Option<&str>) -> Option<Navigation> {
        let id = data_id.map(str::trim).filter(|id| !id.is_empty())?;
        match id.eq_ignore_ascii_case("all") {
            true => None,
            false => Some(Navigation::Profile(UserId(id.to_string()))),
        }
    }

    /// Stops applying results, for when the view goes away
    pub fn close(&mut self) {
        self.closed = true;
        self.loading = false;
    }

    /// The visible comments, in display order
    pub fn render(&self) -> Vec<RenderedComment> {
        let max_depth = self.tree.builder().max_depth;
        let mut res = Vec::with_capacity(self.tree.len());
        let mut stack = Vec::new();
        let roots = self.tree.roots();
        for (i, r) in roots.iter().enumerate().rev() {
            stack.push((r, 0, i + 1 == roots.len()));
        }
        while let Some((node, depth, is_last)) = stack.pop() {
            let expanded =
                !node.replies.is_empty() && self.is_expanded(node.id) && depth + 1 < max_depth;
            res.push(self.render_one(node, depth, is_last, expanded));
            if expanded {
                let n = node.replies.len();
                for (i, r) in node.replies.iter().enumerate().rev() {
                    stack.push((r, depth + 1, i + 1 == n));
                }
            }
        }
        res
    }

    fn render_one(
        &self,
        node: &CommentNode,
        depth: usize,
        is_last: bool,
        expanded: bool,
    ) -> RenderedComment {
        let replies = match (node.replies.is_empty(), expanded) {
            (true, _) => RepliesAffordance::None,
            (false, true) => RepliesAffordance::Expanded,
            (false, false) => RepliesAffordance::Collapsed(RepliesSummary {
                avatars: node.reply_avatars(MAX_SUMMARY_AVATARS),
                count: node.descendant_count(),
            }),
        };
        RenderedComment {
            id: node.id,
            depth,
            author: node.author_name().to_string(),
            author_id: node.user_uid.clone(),
            avatar: node.avatar().to_string(),
            avatar_size: match depth {
                0 => AvatarSize::Large,
                _ => AvatarSize::Small,
            },
            created_at: node.created_at,
            content: html::sanitize(&node.content),
            image: node.image().map(String::from),
            mentions: extract_mentions(&node.content),
            connector_to_parent: depth > 0,
            connector_continues: (depth > 0 && !is_last) || expanded,
            show_menu: self.owns(node),
            replies,
            is_reply_target: self.target == Some(ComposeTarget::Reply(node.id)),
            is_edit_target: self.target == Some(ComposeTarget::Edit(node.id)),
            is_pending_delete: self.pending_delete == Some(node.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_util::comment, Phase, StagedImage, MAX_DEPTH};

    fn session(user: &str) -> Session {
        Session {
            token: api::AuthToken::stub(),
            user_id: UserId(user.to_string()),
        }
    }

    /// R(1) with A(2){B(3), C(4)} and D(5), as listed oldest first
    fn sample() -> Vec<Comment> {
        vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
            comment(4, Some(2)),
            comment(5, Some(1)),
        ]
    }

    fn loaded(user: Option<&str>) -> CommentTreeView {
        let mut v = CommentTreeView::new(PostId::stub(), user.map(session));
        let t = v.begin_fetch();
        assert!(v.finish_fetch(t, Ok(sample())));
        v
    }

    fn ids(rows: &[RenderedComment]) -> Vec<(i64, usize)> {
        rows.iter().map(|r| (r.id.0, r.depth)).collect()
    }

    #[test]
    fn collapsed_summary() {
        let v = loaded(None);
        let rows = v.render();
        assert_eq!(ids(&rows), vec![(1, 0)]);
        assert_eq!(rows[0].avatar_size, AvatarSize::Large);
        assert!(!rows[0].connector_to_parent);
        let RepliesAffordance::Collapsed(summary) = &rows[0].replies else {
            panic!("expected collapsed replies, got {:?}", rows[0].replies);
        };
        assert_eq!(summary.count, 4);
        // D(5) is newest so comes first, then A(2), C(4), B(3); D and A share
        // an author
        assert_eq!(
            summary.avatars,
            vec![
                String::from("https://img.example/2.png"),
                String::from("https://img.example/1.png"),
                String::from("https://img.example/0.png"),
            ]
        );
        assert_eq!(summary.label(), "4 more replies");
    }

    #[test]
    fn expanding_shows_direct_children() {
        let mut v = loaded(None);
        assert!(v.toggle_replies(CommentId(1)));
        let rows = v.render();
        assert_eq!(ids(&rows), vec![(1, 0), (5, 1), (2, 1)]);
        assert_eq!(rows[0].replies, RepliesAffordance::Expanded);
        assert!(rows[0].connector_continues);
        assert_eq!(rows[1].avatar_size, AvatarSize::Small);
        assert!(rows[1].connector_to_parent);
        assert!(rows[1].connector_continues, "D is not the last sibling");
        assert!(!rows[2].connector_continues, "A is last and collapsed");

        assert!(v.toggle_replies(CommentId(2)));
        let rows = v.render();
        assert_eq!(ids(&rows), vec![(1, 0), (5, 1), (2, 1), (4, 2), (3, 2)]);
        assert!(rows[2].connector_continues, "A has expanded children");

        assert!(!v.toggle_replies(CommentId(1)));
        assert_eq!(ids(&v.render()), vec![(1, 0)]);
        assert!(!v.toggle_replies(CommentId(3)), "leaves have nothing to expand");
    }

    #[test]
    fn reply_and_edit_are_exclusive() {
        let mut v = loaded(Some("user1"));
        v.start_reply(CommentId(2)).expect("replying");
        assert_eq!(v.target(), Some(ComposeTarget::Reply(CommentId(2))));
        v.set_content(String::from("<p>draft</p>")).expect("typing");

        v.start_edit(CommentId(1)).expect("editing own comment");
        assert_eq!(v.target(), Some(ComposeTarget::Edit(CommentId(1))));
        assert_eq!(v.composer().content(), "<p>comment 1</p>");

        v.start_reply(CommentId(3)).expect("replying again");
        assert_eq!(v.target(), Some(ComposeTarget::Reply(CommentId(3))));
        assert_eq!(v.composer().content(), "", "edited text is not carried over");

        let rows = v.render();
        assert!(rows.iter().all(|r| !r.is_edit_target));
    }

    #[test]
    fn menu_only_for_own_comments() {
        let mut v = loaded(Some("user2"));
        v.toggle_replies(CommentId(1));
        let rows = v.render();
        let menus = rows
            .iter()
            .filter(|r| r.show_menu)
            .map(|r| r.id.0)
            .collect::<Vec<_>>();
        assert_eq!(menus, vec![5, 2]);
        assert!(matches!(v.start_edit(CommentId(1)), Err(Error::NotOwner(_))));
        assert!(matches!(v.request_delete(CommentId(1)), Err(Error::NotOwner(_))));

        let mut anon = loaded(None);
        anon.toggle_replies(CommentId(1));
        assert!(anon.render().iter().all(|r| !r.show_menu));
        assert!(matches!(
            anon.start_edit(CommentId(2)),
            Err(Error::NotOwner(_))
        ));
    }

    #[test]
    fn unknown_targets_are_refused() {
        let mut v = loaded(Some("user1"));
        assert!(matches!(
            v.start_reply(CommentId(42)),
            Err(Error::UnknownComment(CommentId(42)))
        ));
        assert_eq!(v.target(), None);
    }

    #[test]
    fn submit_guard() {
        let mut v = loaded(Some("user1"));
        assert!(matches!(v.begin_submit(), Err(Error::EmptyComposer)));
        v.set_content(String::from("<p>  </p>")).expect("typing");
        assert!(matches!(v.begin_submit(), Err(Error::EmptyComposer)));

        v.start_reply(CommentId(1)).expect("replying");
        v.set_content(String::from("<p>hi</p>")).expect("typing");
        let sub = v.begin_submit().expect("submitting");
        assert_eq!(sub.target, Some(ComposeTarget::Reply(CommentId(1))));
        assert!(matches!(v.begin_submit(), Err(Error::Busy)));
        assert!(matches!(v.start_edit(CommentId(1)), Err(Error::Busy)));

        let err = Error::Transport(String::from("offline"));
        v.finish_submit(Err(&err));
        assert_eq!(v.composer().content(), "<p>hi</p>");
        assert_eq!(v.composer().phase(), Phase::Composing);
        assert_eq!(v.target(), Some(ComposeTarget::Reply(CommentId(1))));
        assert_eq!(
            v.notice(),
            Some(&Notice::Error(String::from(
                "Something went wrong. Please try again."
            )))
        );

        let sub = v.begin_submit().expect("retrying");
        let mut created = comment(6, Some(1));
        created.content = sub.content;
        v.finish_submit(Ok(&created));
        assert_eq!(v.target(), None);
        assert_eq!(v.composer().phase(), Phase::Idle);
        assert!(v.composer().is_empty());
        assert!(v.is_expanded(CommentId(1)));
    }

    #[test]
    fn anonymous_cannot_submit() {
        let mut v = loaded(None);
        v.set_content(String::from("<p>hi</p>")).expect("typing");
        assert!(v.begin_submit().expect_err("submitting").is_unauthorized());
    }

    #[test]
    fn edit_seeds_uploaded_image() {
        let mut list = sample();
        list[1].image_url = Some(String::from("https://store/x.jpg"));
        let mut v = CommentTreeView::new(PostId::stub(), Some(session("user2")));
        let t = v.begin_fetch();
        v.finish_fetch(t, Ok(list));
        v.start_edit(CommentId(2)).expect("editing");
        assert_eq!(
            v.composer().image(),
            Some(&StagedImage::Uploaded(String::from("https://store/x.jpg")))
        );
        v.remove_image().expect("removing image");
        let sub = v.begin_submit().expect("submitting");
        assert_eq!(sub.image, None);
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut v = loaded(Some("user2"));
        assert!(matches!(v.confirm_delete(true), Err(Error::NoPendingDelete)));

        v.request_delete(CommentId(2)).expect("requesting");
        assert_eq!(v.pending_delete(), Some(CommentId(2)));
        assert_eq!(v.confirm_delete(false).expect("declining"), None);
        assert_eq!(v.pending_delete(), None);

        v.request_delete(CommentId(2)).expect("requesting");
        assert_eq!(v.confirm_delete(true).expect("confirming"), Some(CommentId(2)));
        assert!(v.is_deleting());
        let err = Error::Rejected(api::Error::PermissionDenied(Some(String::from(
            "Not allowed",
        ))));
        v.finish_delete(Err(&err));
        assert!(!v.is_deleting());
        assert_eq!(v.notice(), Some(&Notice::Error(String::from("Not allowed"))));
        assert_eq!(v.tree().len(), 5);

        let err = Error::Rejected(api::Error::Unknown(String::new()));
        v.request_delete(CommentId(2)).expect("requesting");
        v.confirm_delete(true).expect("confirming");
        v.finish_delete(Err(&err));
        assert_eq!(
            v.notice(),
            Some(&Notice::Error(String::from(
                "Something went wrong. Please try again."
            )))
        );
    }

    #[test]
    fn stale_fetches_are_ignored() {
        let mut v = CommentTreeView::new(PostId::stub(), None);
        let old = v.begin_fetch();
        let new = v.begin_fetch();
        assert!(v.finish_fetch(new, Ok(sample())));
        assert!(!v.finish_fetch(old, Ok(vec![comment(9, None)])));
        assert_eq!(v.tree().len(), 5);

        let t = v.begin_fetch();
        v.close();
        assert!(!v.finish_fetch(t, Ok(Vec::new())));
        assert_eq!(v.tree().len(), 5);
    }

    #[test]
    fn bad_listing_keeps_previous_tree() {
        let mut v = loaded(None);
        v.toggle_replies(CommentId(1));
        let t = v.begin_fetch();
        assert!(!v.finish_fetch(t, Ok(vec![comment(1, None), comment(1, None)])));
        assert_eq!(v.tree().len(), 5);
        assert!(matches!(v.notice(), Some(Notice::Error(_))));
        assert!(v.is_expanded(CommentId(1)));

        let t = v.begin_fetch();
        assert!(v.finish_fetch(t, Ok(vec![comment(7, None)])));
        assert!(!v.is_expanded(CommentId(1)), "stale expansion state is pruned");
    }

    #[test]
    fn mention_clicks_navigate() {
        let v = loaded(None);
        assert_eq!(
            v.click_body(Some("user01")),
            Some(Navigation::Profile(UserId(String::from("user01"))))
        );
        assert_eq!(v.click_body(Some("ALL")), None);
        assert_eq!(v.click_body(Some(" ")), None);
        assert_eq!(v.click_body(None), None);
    }

    #[test]
    fn rendered_content_is_hardened() {
        let mut list = vec![comment(1, None)];
        list[0].content = String::from(
            r#"<p><span class="mention" data-id="bob">@Bob</span> <a href="https://x.example">x</a></p>"#,
        );
        let mut v = CommentTreeView::new(PostId::stub(), None);
        let t = v.begin_fetch();
        v.finish_fetch(t, Ok(list));
        let rows = v.render();
        assert!(rows[0].content.contains(r#"rel="noopener noreferrer""#));
        assert_eq!(
            rows[0].mentions,
            vec![Mention::User(UserId(String::from("bob")))]
        );
    }

    #[test]
    fn scripts_are_not_rendered() {
        let mut list = vec![comment(1, None)];
        list[0].content = String::from(
            r#"<p>hi<script>steal()</script><img src="a.png" onerror="steal()"></p>"#,
        );
        let mut v = CommentTreeView::new(PostId::stub(), None);
        let t = v.begin_fetch();
        v.finish_fetch(t, Ok(list));
        assert_eq!(v.render()[0].content, r#"<p>hi<img src="a.png"></p>"#);
    }

    #[test]
    fn composer_is_frozen_while_submitting() {
        let mut v = loaded(Some("user1"));
        v.set_content(String::from("<p>hi</p>")).expect("typing");
        v.begin_submit().expect("submitting");
        assert!(matches!(v.set_content(String::from("<p>more</p>")), Err(Error::Busy)));
        assert!(matches!(v.set_text("more"), Err(Error::Busy)));
        assert!(matches!(v.remove_image(), Err(Error::Busy)));
        assert!(matches!(
            v.stage_image(OptimizedImage {
                file_name: String::from("a.jpg"),
                mime: "image/jpeg",
                bytes: vec![1],
                width: 1,
                height: 1,
            }),
            Err(Error::Busy)
        ));
        assert_eq!(v.composer().content(), "<p>hi</p>");
        assert_eq!(v.composer().image(), None);
    }

    #[test]
    fn unchanged_edit_keeps_markup() {
        let content =
            r#"<p>hi <span class="mention" data-id="bob">@Bob</span> see <a href="https://x.example">link</a></p>"#;
        let mut list = sample();
        list[1].content = String::from(content);
        let mut v = CommentTreeView::new(PostId::stub(), Some(session("user2")));
        let t = v.begin_fetch();
        v.finish_fetch(t, Ok(list));

        v.start_edit(CommentId(2)).expect("editing");
        let shown = html::plain_text(v.composer().content());
        v.set_text(&shown).expect("typing nothing new");
        assert_eq!(v.begin_submit().expect("submitting").content, content);

        v.finish_submit(Err(&Error::Transport(String::from("offline"))));
        v.set_text(&format!("{shown}!")).expect("typing");
        let sub = v.begin_submit().expect("resubmitting");
        assert!(sub.content.contains(r#"data-id="bob""#), "{}", sub.content);
        assert!(sub.content.ends_with("!</p>"), "{}", sub.content);
    }

    #[test]
    fn expansion_follows_the_builder_depth() {
        let len = MAX_DEPTH as i64 + 2;
        let chain = (1..=len)
            .map(|id| comment(id, (id > 1).then(|| id - 1)))
            .collect::<Vec<_>>();
        let builder = TreeBuilder {
            max_depth: MAX_DEPTH + 4,
        };
        let mut v = CommentTreeView::with_builder(PostId::stub(), None, builder);
        let t = v.begin_fetch();
        assert!(v.finish_fetch(t, Ok(chain)));
        for id in 1..len {
            assert!(v.toggle_replies(CommentId(id)));
        }
        let rows = v.render();
        assert_eq!(rows.len(), len as usize);
        assert_eq!(rows.last().map(|r| r.depth), Some(len as usize - 1));
    }
}
