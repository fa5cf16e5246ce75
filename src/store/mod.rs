pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{Comment, Post, User};
pub use postgres::PgStore;

/// Errors from the data-access layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation; the constraint is the authoritative
    /// guard against concurrent duplicate inserts.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Data-access seam for the services. `PgStore` backs the real server,
/// `MemoryStore` backs the test suite.
///
/// Ownership scoping happens at the query level: mutating calls take the
/// acting username and only touch rows whose stored owner matches it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // Users
    async fn count_users_by_username(&self, username: &str) -> Result<i64, StoreError>;
    async fn insert_user(&self, user: &User) -> Result<User, StoreError>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn update_user(
        &self,
        username: &str,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    // Posts
    async fn insert_post(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, StoreError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError>;
    async fn find_post_owned(&self, id: i64, username: &str) -> Result<Option<Post>, StoreError>;
    async fn update_post(
        &self,
        id: i64,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError>;
    async fn delete_post(&self, id: i64, username: &str) -> Result<bool, StoreError>;
    async fn post_exists(&self, id: i64) -> Result<bool, StoreError>;
    async fn list_posts(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError>;
    async fn list_posts_by_username(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError>;

    // Comments
    async fn insert_comment(
        &self,
        post_id: i64,
        username: &str,
        content: &str,
    ) -> Result<Comment, StoreError>;
    async fn find_comment(&self, post_id: i64, id: i64) -> Result<Option<Comment>, StoreError>;
    async fn update_comment(
        &self,
        id: i64,
        username: &str,
        content: &str,
    ) -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: i64, username: &str) -> Result<bool, StoreError>;
    async fn list_comments(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, StoreError>;
}
