use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Paging;
use crate::error::ApiError;
use crate::store::{Comment, Store, User};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

impl CreateCommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("content", &self.content, 1, 255);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

impl UpdateCommentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("content", &self.content, 1, 255);
        v.finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub comment_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            comment_id: comment.id,
            username: comment.username,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

pub struct CommentService {
    store: Arc<dyn Store>,
}

impl CommentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        user: &User,
        post_id: i64,
        request: CreateCommentRequest,
    ) -> Result<CommentResponse, ApiError> {
        request.validate()?;
        self.post_must_exist(post_id).await?;

        let comment = self
            .store
            .insert_comment(post_id, &user.username, &request.content)
            .await?;
        tracing::debug!(comment_id = comment.id, post_id, "created comment");

        Ok(comment.into())
    }

    /// Existence guard keyed on the `(postId, commentId)` pair.
    async fn comment_must_exist(&self, post_id: i64, comment_id: i64) -> Result<Comment, ApiError> {
        self.store
            .find_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| ApiError::not_found("comment is not found"))
    }

    async fn post_must_exist(&self, post_id: i64) -> Result<(), ApiError> {
        if !self.store.post_exists(post_id).await? {
            return Err(ApiError::not_found("post is not found"));
        }
        Ok(())
    }

    /// Ownership is checked explicitly after the existence guard; a
    /// non-owner gets the same not-found answer so other users' comments
    /// are indistinguishable from absent ones.
    fn owned_by(comment: &Comment, user: &User) -> Result<(), ApiError> {
        if comment.username != user.username {
            return Err(ApiError::not_found("comment is not found"));
        }
        Ok(())
    }

    pub async fn update(
        &self,
        user: &User,
        post_id: i64,
        comment_id: i64,
        request: UpdateCommentRequest,
    ) -> Result<CommentResponse, ApiError> {
        request.validate()?;

        let comment = self.comment_must_exist(post_id, comment_id).await?;
        Self::owned_by(&comment, user)?;

        let comment = self
            .store
            .update_comment(comment_id, &user.username, &request.content)
            .await?
            .ok_or_else(|| ApiError::not_found("comment is not found"))?;

        Ok(comment.into())
    }

    pub async fn delete(
        &self,
        user: &User,
        post_id: i64,
        comment_id: i64,
    ) -> Result<bool, ApiError> {
        let comment = self.comment_must_exist(post_id, comment_id).await?;
        Self::owned_by(&comment, user)?;

        self.store.delete_comment(comment_id, &user.username).await?;
        Ok(true)
    }

    pub async fn find_by_id(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<CommentResponse, ApiError> {
        let comment = self.comment_must_exist(post_id, comment_id).await?;
        Ok(comment.into())
    }

    pub async fn find_by_post_id(
        &self,
        post_id: i64,
        paging: Paging,
    ) -> Result<Vec<CommentResponse>, ApiError> {
        self.post_must_exist(post_id).await?;

        let comments = self
            .store
            .list_comments(post_id, paging.size, paging.offset())
            .await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }
}
