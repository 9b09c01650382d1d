use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
    sync::Arc,
};

use crate::api::{Comment, CommentId};

/// Nesting deeper than this is treated as corrupt data
pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("comment id {0} appears more than once")]
    DuplicateId(CommentId),

    #[error("comment {id} is nested deeper than {max_depth} levels")]
    TooDeep { id: CommentId, max_depth: usize },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,

    /// Direct replies, newest first
    pub replies: Vec<CommentNode>,
}

impl Deref for CommentNode {
    type Target = Comment;

    fn deref(&self) -> &Comment {
        &self.comment
    }
}

impl CommentNode {
    /// All nodes below this one, in pre-order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.replies.iter().rev().collect(),
        }
    }

    pub fn descendant_count(&self) -> usize {
        self.descendants().count()
    }

    /// Up to `limit` distinct avatars of the people who replied anywhere below
    /// this node, in the order they are first met
    pub fn reply_avatars(&self, limit: usize) -> Vec<String> {
        let mut res: Vec<String> = Vec::with_capacity(limit);
        for n in self.descendants() {
            if res.len() >= limit {
                break;
            }
            let avatar = n.avatar();
            if !res.iter().any(|a| a == avatar) {
                res.push(avatar.to_string());
            }
        }
        res
    }

    /// Looks up `id` in the subtree rooted at this node
    pub fn find(&self, id: CommentId) -> Option<&CommentNode> {
        if self.id == id {
            return Some(self);
        }
        self.descendants().find(|n| n.id == id)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a CommentNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a CommentNode;

    fn next(&mut self) -> Option<&'a CommentNode> {
        let n = self.stack.pop()?;
        self.stack.extend(n.replies.iter().rev());
        Some(n)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TreeBuilder {
    pub max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> TreeBuilder {
        TreeBuilder {
            max_depth: MAX_DEPTH,
        }
    }
}

struct Frame<'a> {
    comment: &'a Comment,
    pending: std::slice::Iter<'a, &'a Comment>,
    replies: Vec<CommentNode>,
}

impl TreeBuilder {
    /// Nests a flat comment listing.
    ///
    /// Roots are the comments without a parent. Every sibling group comes out
    /// in the reverse of the order the listing had, which is newest-first for
    /// the oldest-first listings the API returns. Comments whose parent is not
    /// in the listing are left out.
    pub fn build(&self, comments: &[Comment]) -> Result<Vec<CommentNode>, TreeError> {
        let mut seen = HashSet::with_capacity(comments.len());
        let mut children: HashMap<Option<CommentId>, Vec<&Comment>> = HashMap::new();
        for c in comments {
            if !seen.insert(c.id) {
                return Err(TreeError::DuplicateId(c.id));
            }
            children.entry(c.parent).or_insert_with(Vec::new).push(c);
        }
        for siblings in children.values_mut() {
            siblings.reverse();
        }

        let no_children = Vec::new();
        let children_of =
            |id: Option<CommentId>| children.get(&id).unwrap_or(&no_children).iter();

        let mut placed = 0;
        let mut roots = Vec::new();
        let mut stack: Vec<Frame<'_>> = Vec::new();
        for root in children_of(None) {
            stack.push(Frame {
                comment: *root,
                pending: children_of(Some(root.id)),
                replies: Vec::new(),
            });
            while let Some(top) = stack.last_mut() {
                if let Some(child) = top.pending.next() {
                    if stack.len() >= self.max_depth {
                        return Err(TreeError::TooDeep {
                            id: child.id,
                            max_depth: self.max_depth,
                        });
                    }
                    stack.push(Frame {
                        comment: *child,
                        pending: children_of(Some(child.id)),
                        replies: Vec::new(),
                    });
                    continue;
                }
                let Some(done) = stack.pop() else { break };
                placed += 1;
                let node = CommentNode {
                    comment: done.comment.clone(),
                    replies: done.replies,
                };
                match stack.last_mut() {
                    Some(parent) => parent.replies.push(node),
                    None => roots.push(node),
                }
            }
        }

        if placed != comments.len() {
            tracing::warn!(
                dropped = comments.len() - placed,
                "comments whose parent is not in the listing were left out of the tree"
            );
        }
        Ok(roots)
    }
}

pub fn build_tree(comments: &[Comment]) -> Result<Vec<CommentNode>, TreeError> {
    TreeBuilder::default().build(comments)
}

/// A built tree together with the listing it was built from.
///
/// Handing it the same listing again (the same `Arc`) does not rebuild.
#[derive(Clone, Debug)]
pub struct CommentTree {
    builder: TreeBuilder,
    source: Arc<Vec<Comment>>,
    roots: Arc<Vec<CommentNode>>,
}

impl CommentTree {
    pub fn new(builder: TreeBuilder) -> CommentTree {
        CommentTree {
            builder,
            source: Arc::new(Vec::new()),
            roots: Arc::new(Vec::new()),
        }
    }

    /// Returns whether the tree was rebuilt. On error the previous tree is kept.
    pub fn update(&mut self, source: Arc<Vec<Comment>>) -> Result<bool, TreeError> {
        if Arc::ptr_eq(&self.source, &source) {
            return Ok(false);
        }
        let roots = self.builder.build(&source)?;
        self.source = source;
        self.roots = Arc::new(roots);
        Ok(true)
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    pub fn shared_roots(&self) -> Arc<Vec<CommentNode>> {
        self.roots.clone()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.source
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.source.iter().find(|c| c.id == id)
    }

    pub fn node(&self, id: CommentId) -> Option<&CommentNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

impl Default for CommentTree {
    fn default() -> CommentTree {
        CommentTree::new(TreeBuilder::default())
    }
}
