//! Reply-tree reconstruction for article comments.
//!
//! The backend returns comments flat, each pointing at its parent by id. The
//! tree is rebuilt from scratch after every fetch; nothing is patched in place.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::services::comments::{Comment, CommentsApi, CreateComment, UpdateComment};

/// Nesting depth past which renderers stop indenting replies.
pub const DEFAULT_MAX_VISUAL_DEPTH: usize = 5;

/// A comment together with its replies, in the order they were received.
///
/// Counting, comparing, cloning and dropping walk the tree with an explicit
/// worklist, so reply chains of any depth are safe. Serialization and `Debug`
/// still recurse once per level.
#[derive(Debug, Serialize)]
pub struct CommentTreeNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentTreeNode>,
}

impl CommentTreeNode {
    fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// This node plus every reply below it.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.replies.iter());
        }
        total
    }
}

impl Drop for CommentTreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

impl PartialEq for CommentTreeNode {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some((a, b)) = pairs.pop() {
            if a.comment != b.comment || a.replies.len() != b.replies.len() {
                return false;
            }
            pairs.extend(a.replies.iter().zip(b.replies.iter()));
        }
        true
    }
}

impl Eq for CommentTreeNode {}

impl Clone for CommentTreeNode {
    fn clone(&self) -> Self {
        // Pre-order copy with parent slots; popping from the back attaches
        // every subtree before its parent is attached in turn.
        let mut flat: Vec<(Option<usize>, CommentTreeNode)> = Vec::new();
        let mut stack = vec![(None, self)];
        while let Some((parent, node)) = stack.pop() {
            let slot = flat.len();
            flat.push((parent, CommentTreeNode::new(node.comment.clone())));
            stack.extend(node.replies.iter().rev().map(|r| (Some(slot), r)));
        }

        while flat.len() > 1 {
            let Some((Some(parent), mut node)) = flat.pop() else {
                break;
            };
            // Siblings arrive last-first.
            node.replies.reverse();
            flat[parent].1.replies.push(node);
        }

        match flat.pop() {
            Some((_, mut root)) => {
                root.replies.reverse();
                root
            }
            None => CommentTreeNode::new(self.comment.clone()),
        }
    }
}

/// Build the reply forest for a flat comment list.
///
/// Every input comment appears exactly once. Replies and roots keep input
/// order. A comment whose parent cannot be resolved (missing id, itself, or a
/// parent cycle) becomes a root instead of being dropped.
pub fn build_comment_tree(comments: Vec<Comment>) -> Vec<CommentTreeNode> {
    let n = comments.len();

    // Pass 1: id lookup. Duplicate ids resolve to their first occurrence.
    let mut parent: Vec<Option<usize>> = {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
        for (i, c) in comments.iter().enumerate() {
            index.entry(c.id.as_str()).or_insert(i);
        }

        // Pass 2: resolve each parent link.
        comments
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let resolved = c
                    .parent_id
                    .as_deref()
                    .and_then(|p| index.get(p).copied())
                    .filter(|&p| p != i);
                if resolved.is_none() && c.parent_id.is_some() {
                    debug!(
                        "Comment {} has unresolvable parent {:?}, promoting to root",
                        c.id, c.parent_id
                    );
                }
                resolved
            })
            .collect()
    };

    break_cycles(&mut parent);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    // Pre-order walk from the roots; assembling in reverse visits every
    // child before its parent, so no recursion is needed for deep threads.
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev().copied());
    }

    let mut slots: Vec<Option<CommentTreeNode>> =
        comments.into_iter().map(|c| Some(CommentTreeNode::new(c))).collect();

    for &i in order.iter().rev() {
        let replies: Vec<CommentTreeNode> =
            children[i].iter().filter_map(|&c| slots[c].take()).collect();
        if let Some(node) = slots[i].as_mut() {
            node.replies = replies;
        }
    }

    roots.into_iter().filter_map(|r| slots[r].take()).collect()
}

/// Cut parent links that never reach a root. The earliest member of each
/// cycle (by input position) is detached and becomes a root.
fn break_cycles(parent: &mut [Option<usize>]) {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; parent.len()];
    let mut path = Vec::new();

    for start in 0..parent.len() {
        let mut cur = start;
        path.clear();

        while state[cur] == UNSEEN {
            state[cur] = ON_PATH;
            path.push(cur);
            match parent[cur] {
                Some(p) => cur = p,
                None => break,
            }
        }

        if state[cur] == ON_PATH && parent[cur].is_some() {
            // `cur` closed a loop; everything on the path from it onwards is the cycle.
            if let Some(pos) = path.iter().position(|&i| i == cur) {
                if let Some(&first) = path[pos..].iter().min() {
                    warn!("Comment parent cycle detected, promoting index {} to root", first);
                    parent[first] = None;
                }
            }
        }

        for &i in &path {
            state[i] = DONE;
        }
    }
}

/// Total comments in a forest, replies included.
pub fn count_comments(forest: &[CommentTreeNode]) -> usize {
    forest.iter().map(CommentTreeNode::count).sum()
}

/// Whether a reply at `depth` may still be indented under its parent.
pub fn can_nest(depth: usize, max_depth: usize) -> bool {
    depth < max_depth
}

/// Comment list of one article: fetch, rebuild, and mutate-then-refetch.
pub struct CommentSection {
    api: CommentsApi,
    article_id: String,
    tree: Vec<CommentTreeNode>,
    total: usize,
    error: Option<String>,
}

impl CommentSection {
    pub fn new(api: CommentsApi, article_id: impl Into<String>) -> Self {
        Self {
            api,
            article_id: article_id.into(),
            tree: Vec::new(),
            total: 0,
            error: None,
        }
    }

    pub fn article_id(&self) -> &str {
        &self.article_id
    }

    pub fn tree(&self) -> &[CommentTreeNode] {
        &self.tree
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Message for the inline error banner after a failed load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fetch the flat list and rebuild the tree. On failure the previous tree
    /// stays and the error is recorded.
    pub async fn refresh(&mut self) -> Result<()> {
        match self.api.list(&self.article_id).await {
            Ok(comments) => {
                self.tree = build_comment_tree(comments);
                self.total = count_comments(&self.tree);
                self.error = None;
                debug!("Loaded {} comments for article {}", self.total, self.article_id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load comments for {}: {}", self.article_id, e);
                self.error = Some("댓글을 불러오는 중 오류가 발생했습니다.".to_string());
                Err(e)
            }
        }
    }

    pub async fn create(&mut self, content: &str) -> Result<Comment> {
        self.submit(content, None).await
    }

    pub async fn reply(&mut self, parent_id: &str, content: &str) -> Result<Comment> {
        self.submit(content, Some(parent_id.to_string())).await
    }

    pub async fn edit(&mut self, comment_id: &str, content: &str) -> Result<Comment> {
        let request = UpdateComment {
            content: content.to_string(),
        };
        let updated = self
            .api
            .update(&self.article_id, comment_id, &request)
            .await
            .inspect_err(|e| warn!("Failed to edit comment {}: {}", comment_id, e))?;
        self.reload().await;
        Ok(updated)
    }

    pub async fn delete(&mut self, comment_id: &str) -> Result<()> {
        self.api
            .delete(&self.article_id, comment_id)
            .await
            .inspect_err(|e| warn!("Failed to delete comment {}: {}", comment_id, e))?;
        self.reload().await;
        Ok(())
    }

    async fn submit(&mut self, content: &str, parent_comment_id: Option<String>) -> Result<Comment> {
        let request = CreateComment {
            content: content.to_string(),
            parent_comment_id,
        };
        let created = self
            .api
            .create(&self.article_id, &request)
            .await
            .inspect_err(|e| warn!("Failed to create comment: {}", e))?;
        self.reload().await;
        Ok(created)
    }

    /// Refetch after a successful mutation. A failed refetch is only logged:
    /// the mutation itself went through.
    async fn reload(&mut self) {
        if let Err(e) = self.refresh().await {
            debug!("Refetch after mutation failed for {}: {}", self.article_id, e);
        }
    }
}
