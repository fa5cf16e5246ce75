use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use super::models::{Comment, Post, User};
use super::{Store, StoreError};

/// Postgres-backed store. Holds a single connection pool, created once at
/// startup and shared across requests.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to `database_url` and bring the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database pool ready, migrations applied");

        Ok(Self { pool })
    }

    fn map_insert_err(err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = err {
            // 23505 = unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Sqlx(err)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count_users_by_username(&self, username: &str) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as(
            "INSERT INTO users (username, password, name) VALUES ($1, $2, $3) \
             RETURNING username, password, name",
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_insert_err)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT username, password, name FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(
        &self,
        username: &str,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as(
            "UPDATE users SET name = COALESCE($2, name), password = COALESCE($3, password) \
             WHERE username = $1 RETURNING username, password, name",
        )
        .bind(username)
        .bind(name)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_post(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, StoreError> {
        let post = sqlx::query_as(
            "INSERT INTO posts (title, content, username) VALUES ($1, $2, $3) \
             RETURNING id, title, content, username, created_at, updated_at",
        )
        .bind(title)
        .bind(content)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as(
            "SELECT id, title, content, username, created_at, updated_at \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn find_post_owned(&self, id: i64, username: &str) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as(
            "SELECT id, title, content, username, created_at, updated_at \
             FROM posts WHERE id = $1 AND username = $2",
        )
        .bind(id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update_post(
        &self,
        id: i64,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as(
            "UPDATE posts SET title = $3, content = $4, updated_at = now() \
             WHERE id = $1 AND username = $2 \
             RETURNING id, title, content, username, created_at, updated_at",
        )
        .bind(id)
        .bind(username)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn delete_post(&self, id: i64, username: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn post_exists(&self, id: i64) -> Result<bool, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn list_posts(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let posts = match search {
            Some(search) => {
                let pattern = format!("%{}%", search);
                sqlx::query_as(
                    "SELECT id, title, content, username, created_at, updated_at FROM posts \
                     WHERE title ILIKE $1 OR content ILIKE $1 \
                     ORDER BY id LIMIT $2 OFFSET $3",
                )
                .bind(pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, title, content, username, created_at, updated_at FROM posts \
                     ORDER BY id LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(posts)
    }

    async fn list_posts_by_username(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as(
            "SELECT id, title, content, username, created_at, updated_at FROM posts \
             WHERE username = $1 ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(username)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn insert_comment(
        &self,
        post_id: i64,
        username: &str,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let comment = sqlx::query_as(
            "INSERT INTO comments (content, username, post_id) VALUES ($1, $2, $3) \
             RETURNING id, content, username, post_id, created_at, updated_at",
        )
        .bind(content)
        .bind(username)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn find_comment(&self, post_id: i64, id: i64) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as(
            "SELECT id, content, username, post_id, created_at, updated_at \
             FROM comments WHERE id = $1 AND post_id = $2",
        )
        .bind(id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn update_comment(
        &self,
        id: i64,
        username: &str,
        content: &str,
    ) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as(
            "UPDATE comments SET content = $3, updated_at = now() \
             WHERE id = $1 AND username = $2 \
             RETURNING id, content, username, post_id, created_at, updated_at",
        )
        .bind(id)
        .bind(username)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64, username: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND username = $2")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as(
            "SELECT id, content, username, post_id, created_at, updated_at FROM comments \
             WHERE post_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
