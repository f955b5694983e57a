//! Lookups over nested comment threads.
//!
//! Search order is pre-order depth-first: a comment, then its replies (and
//! theirs), then the next sibling. Threads are trees, so there is no cycle
//! check.

use crate::model::Comment;

pub fn find_comment_by_id<'a>(comments: &'a [Comment], id: &str) -> Option<&'a Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_comment_by_id(&comment.replies, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_comment_by_id_mut<'a>(
    comments: &'a mut [Comment],
    id: &str,
) -> Option<&'a mut Comment> {
    for comment in comments {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_comment_by_id_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Total comments at every depth.
pub fn count_comments(comments: &[Comment]) -> usize {
    comments
        .iter()
        .map(|c| 1 + count_comments(&c.replies))
        .sum()
}
