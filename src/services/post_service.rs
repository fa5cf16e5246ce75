use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Paging;
use crate::error::ApiError;
use crate::store::{Post, Store, User};
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

impl CreatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("title", &self.title, 1, 100);
        v.require_str("content", &self.content, 1, 255);
        v.finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

impl UpdatePostRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require_str("title", &self.title, 1, 100);
        v.require_str("content", &self.content, 1, 255);
        v.finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub post_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.id,
            username: post.username,
            title: post.title,
            content: post.content,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

pub struct PostService {
    store: Arc<dyn Store>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        user: &User,
        request: CreatePostRequest,
    ) -> Result<PostResponse, ApiError> {
        request.validate()?;

        let post = self
            .store
            .insert_post(&user.username, &request.title, &request.content)
            .await?;
        tracing::debug!(post_id = post.id, username = %user.username, "created post");

        Ok(post.into())
    }

    /// Owner-scoped existence guard: a post that is missing or belongs to
    /// someone else looks the same from the outside.
    async fn post_must_exist(&self, username: &str, post_id: i64) -> Result<Post, ApiError> {
        self.store
            .find_post_owned(post_id, username)
            .await?
            .ok_or_else(|| ApiError::not_found("post is not found"))
    }

    pub async fn update(
        &self,
        user: &User,
        post_id: i64,
        request: UpdatePostRequest,
    ) -> Result<PostResponse, ApiError> {
        request.validate()?;

        self.post_must_exist(&user.username, post_id).await?;

        // The mutation is filtered by the same keys again; the window
        // between guard and update has no transactional cover.
        let post = self
            .store
            .update_post(post_id, &user.username, &request.title, &request.content)
            .await?
            .ok_or_else(|| ApiError::not_found("post is not found"))?;

        Ok(post.into())
    }

    pub async fn delete(&self, user: &User, post_id: i64) -> Result<bool, ApiError> {
        self.post_must_exist(&user.username, post_id).await?;
        self.store.delete_post(post_id, &user.username).await?;
        Ok(true)
    }

    /// Unscoped read: any authenticated user may fetch any post.
    pub async fn get_by_id(&self, post_id: i64) -> Result<PostResponse, ApiError> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| ApiError::not_found("post is not found"))?;
        Ok(post.into())
    }

    pub async fn get_or_search(
        &self,
        search: Option<&str>,
        paging: Paging,
    ) -> Result<Vec<PostResponse>, ApiError> {
        let posts = self
            .store
            .list_posts(search, paging.size, paging.offset())
            .await?;
        Ok(posts.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_username(
        &self,
        username: &str,
        paging: Paging,
    ) -> Result<Vec<PostResponse>, ApiError> {
        let total = self.store.count_users_by_username(username).await?;
        if total == 0 {
            return Err(ApiError::not_found("user not found"));
        }

        let posts = self
            .store
            .list_posts_by_username(username, paging.size, paging.offset())
            .await?;
        Ok(posts.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn user(username: &str) -> User {
        User {
            username: username.to_string(),
            password: "hash".to_string(),
            name: username.to_string(),
        }
    }

    async fn service_with_user(username: &str) -> PostService {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(&user(username)).await.unwrap();
        PostService::new(store)
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = service_with_user("alice").await;
        let created = service
            .create(
                &user("alice"),
                CreatePostRequest {
                    title: "t".to_string(),
                    content: "c".to_string(),
                },
            )
            .await
            .unwrap();

        let fetched = service.get_by_id(created.post_id).await.unwrap();
        assert_eq!(fetched.title, "t");
        assert_eq!(fetched.content, "c");
        assert_eq!(fetched.username, "alice");
    }

    #[tokio::test]
    async fn mutation_by_non_owner_is_not_found() {
        let service = service_with_user("alice").await;
        let created = service
            .create(
                &user("alice"),
                CreatePostRequest {
                    title: "t".to_string(),
                    content: "c".to_string(),
                },
            )
            .await
            .unwrap();

        let err = service
            .update(
                &user("bob"),
                created.post_id,
                UpdatePostRequest {
                    title: "x".to_string(),
                    content: "y".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "post is not found");

        let err = service.delete(&user("bob"), created.post_id).await.unwrap_err();
        assert_eq!(err.message(), "post is not found");

        // Owner still succeeds
        assert!(service.delete(&user("alice"), created.post_id).await.unwrap());
    }

    #[tokio::test]
    async fn search_filters_by_title_or_content() {
        let service = service_with_user("alice").await;
        for (title, content) in [("rust tips", "notes"), ("cooking", "rustic bread"), ("misc", "other")] {
            service
                .create(
                    &user("alice"),
                    CreatePostRequest {
                        title: title.to_string(),
                        content: content.to_string(),
                    },
                )
                .await
                .unwrap();
        }

        let paging = Paging { page: 1, size: 10 };
        let hits = service.get_or_search(Some("rust"), paging).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn listing_for_unknown_user_is_not_found() {
        let service = service_with_user("alice").await;
        let err = service
            .find_by_username("ghost", Paging { page: 1, size: 10 })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "user not found");
    }
}
