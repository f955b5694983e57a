//! # Forum Mutations
//!
//! Writes against the discussion forum: commenting, editing and deleting posts,
//! and voting. Unlike the collection stores nothing is persisted locally; the
//! forum is read through a [`QueryCache`] and every successful write
//! invalidates the cached queries it affects.
//!
//! ## Hook Envelope
//!
//! 1. Validate locally. Bad input fails before any request is sent.
//! 2. Send. Any non-2xx status is a failure.
//! 3. On success, invalidate the hook's query keys (edit also refetches them).
//! 4. Report exactly one notice: success, or the server's message with a
//!    generic fallback.
//!
//! | Hook | Invalidates | Badge check |
//! |------|-------------|-------------|
//! | [`ForumMutations::create_comment`] | `post/<id>`, `comments/<id>` | yes |
//! | [`ForumMutations::edit_post`] | `post/<id>`, `recent-posts` (refetched) | yes |
//! | [`ForumMutations::delete_post`] | `post/<id>`, `recent-posts` | no |
//! | [`ForumMutations::vote_post`] | `post/<id>`, `recent-posts` | no |
//! | [`ForumMutations::vote_comment`] | `comments` (all posts) | no |

pub mod query_cache;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::badges::BadgeTrigger;
use crate::error::{Result, SyncError};
use crate::model::Comment;
use crate::notify::{Notice, Notifier};
use crate::transport::{ApiClient, ApiRequest};

pub use query_cache::{QueryCache, QueryKey};

pub const COMMENT_PATH: &str = "/forum/post/comment";
pub const REPLY_PATH: &str = "/forum/post/comment/reply";
pub const UPDATE_POST_PATH: &str = "/forum/post/update";
pub const DELETE_POST_PATH: &str = "/forum/post/delete";
pub const VOTE_POST_PATH: &str = "/forum/post/vote";
pub const VOTE_COMMENT_PATH: &str = "/forum/post/comment/vote";

/// A signed vote. Positive is an upvote, negative a downvote, zero clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteType(pub i64);

impl FromStr for VoteType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(VoteType)
            .map_err(|_| SyncError::Validation(format!("Vote must be a whole number, got '{}'", s)))
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct ForumMutations {
    client: ApiClient,
    cache: Rc<QueryCache>,
    badges: BadgeTrigger,
    notifier: Rc<dyn Notifier>,
}

impl ForumMutations {
    pub fn new(
        client: ApiClient,
        cache: Rc<QueryCache>,
        badges: BadgeTrigger,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            cache,
            badges,
            notifier,
        }
    }

    pub fn cache(&self) -> &Rc<QueryCache> {
        &self.cache
    }

    /// Post a comment, or a reply when `reply_to` names a parent comment.
    pub async fn create_comment(
        &self,
        post_id: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<Comment> {
        let result = self.try_create_comment(post_id, body, reply_to).await;
        self.report(result, |_| "Comment posted".to_string())
    }

    pub async fn edit_post(&self, post_id: &str, title: &str, body: &str) -> Result<()> {
        let result = self.try_edit_post(post_id, title, body).await;
        self.report(result, |_| "Post updated".to_string())
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<()> {
        let result = self.try_delete_post(post_id).await;
        self.report(result, |_| "Post deleted".to_string())
    }

    pub async fn vote_post(&self, post_id: &str, vote_type: &str) -> Result<()> {
        let result = self.try_vote_post(post_id, vote_type).await;
        self.report(result, |_| "Vote recorded".to_string())
    }

    pub async fn vote_comment(&self, comment_id: &str, vote_type: &str) -> Result<()> {
        let result = self.try_vote_comment(comment_id, vote_type).await;
        self.report(result, |_| "Vote recorded".to_string())
    }

    async fn try_create_comment(
        &self,
        post_id: &str,
        body: &str,
        reply_to: Option<&str>,
    ) -> Result<Comment> {
        require("post id", post_id)?;
        if body.trim().is_empty() {
            return Err(SyncError::Validation("Comment cannot be empty".to_string()));
        }

        let request = match reply_to {
            Some(parent) => {
                require("comment id", parent)?;
                ApiRequest::post(
                    REPLY_PATH,
                    json!({"post_id": post_id, "body": body, "comment_id": parent}),
                )
            }
            None => ApiRequest::post(COMMENT_PATH, json!({"post_id": post_id, "body": body})),
        };
        let response = self.client.send(request).await?;
        let comment = decode_comment(response.json()?)?;

        self.cache
            .invalidate(&[QueryKey::post(post_id), QueryKey::comments(post_id)]);
        self.badges.fire();

        Ok(comment)
    }

    async fn try_edit_post(&self, post_id: &str, title: &str, body: &str) -> Result<()> {
        require("post id", post_id)?;
        if title.trim().is_empty() {
            return Err(SyncError::Validation("A title is required".to_string()));
        }
        if body.trim().is_empty() {
            return Err(SyncError::Validation("Post body cannot be empty".to_string()));
        }

        self.client
            .send(ApiRequest::put(
                UPDATE_POST_PATH,
                json!({"post_id": post_id, "title": title, "body": body}),
            ))
            .await?;

        let keys = [QueryKey::post(post_id), QueryKey::recent_posts()];
        self.cache.invalidate(&keys);
        self.cache.refetch(&keys).await;
        self.badges.fire();

        Ok(())
    }

    async fn try_delete_post(&self, post_id: &str) -> Result<()> {
        require("post id", post_id)?;

        self.client
            .send(ApiRequest::delete(
                DELETE_POST_PATH,
                json!({"post_id": post_id}),
            ))
            .await?;

        self.cache
            .invalidate(&[QueryKey::post(post_id), QueryKey::recent_posts()]);
        Ok(())
    }

    async fn try_vote_post(&self, post_id: &str, vote_type: &str) -> Result<()> {
        let vote: VoteType = vote_type.parse()?;
        require("post id", post_id)?;

        self.client
            .send(ApiRequest::post(
                VOTE_POST_PATH,
                json!({"post_id": post_id, "vote_type": vote.0}),
            ))
            .await?;

        self.cache
            .invalidate(&[QueryKey::post(post_id), QueryKey::recent_posts()]);
        Ok(())
    }

    async fn try_vote_comment(&self, comment_id: &str, vote_type: &str) -> Result<()> {
        let vote: VoteType = vote_type.parse()?;
        require("comment id", comment_id)?;

        self.client
            .send(ApiRequest::post(
                VOTE_COMMENT_PATH,
                json!({"comment_id": comment_id, "vote_type": vote.0}),
            ))
            .await?;

        self.cache.invalidate(&[QueryKey::all_comments()]);
        Ok(())
    }

    fn report<T>(&self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.notifier.notify(Notice::success(success(value))),
            Err(e) => {
                tracing::warn!("Forum operation failed: {}", e);
                self.notifier.notify(Notice::error(e.user_message()));
            }
        }
        result
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::Validation(format!("A {} is required", what)));
    }
    Ok(())
}

/// Created comments come back bare or as `{"comment": {...}}`.
fn decode_comment(value: Value) -> Result<Comment> {
    let value = match value {
        Value::Object(mut map) if !map.contains_key("id") && !map.contains_key("_id") => {
            map.remove("comment").unwrap_or(Value::Object(map))
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|e| SyncError::MalformedResponse(e.to_string()))
}
