//! In-memory store, used by the test suite in place of Postgres.
//!
//! Mirrors the semantics the services rely on: username uniqueness rejects
//! duplicates, mutations are filtered by owner, lists come back in
//! insertion (ascending id) order, and deleting a post drops its comments.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::models::{Comment, Post, User};
use super::{Store, StoreError};

#[derive(Default)]
struct Inner {
    users: BTreeMap<String, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    next_post_id: i64,
    next_comment_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard even if a panicking holder poisoned the mutex; the
    /// data is plain maps and stays usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn count_users_by_username(&self, username: &str) -> Result<i64, StoreError> {
        let inner = self.lock();
        Ok(inner.users.contains_key(username) as i64)
    }

    async fn insert_user(&self, user: &User) -> Result<User, StoreError> {
        let mut inner = self.lock();
        if inner.users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(user.username.clone()));
        }
        inner.users.insert(user.username.clone(), user.clone());
        Ok(user.clone())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock();
        Ok(inner.users.get(username).cloned())
    }

    async fn update_user(
        &self,
        username: &str,
        name: Option<&str>,
        password: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.lock();
        match inner.users.get_mut(username) {
            Some(user) => {
                if let Some(name) = name {
                    user.name = name.to_string();
                }
                if let Some(password) = password {
                    user.password = password.to_string();
                }
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn insert_post(
        &self,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, StoreError> {
        let mut inner = self.lock();
        inner.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: inner.next_post_id,
            title: title.to_string(),
            content: content.to_string(),
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, StoreError> {
        let inner = self.lock();
        Ok(inner.posts.get(&id).cloned())
    }

    async fn find_post_owned(&self, id: i64, username: &str) -> Result<Option<Post>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .posts
            .get(&id)
            .filter(|post| post.username == username)
            .cloned())
    }

    async fn update_post(
        &self,
        id: i64,
        username: &str,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError> {
        let mut inner = self.lock();
        match inner.posts.get_mut(&id).filter(|p| p.username == username) {
            Some(post) => {
                post.title = title.to_string();
                post.content = content.to_string();
                post.updated_at = Utc::now();
                Ok(Some(post.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64, username: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let owned = matches!(inner.posts.get(&id), Some(post) if post.username == username);
        if owned {
            inner.posts.remove(&id);
            inner.comments.retain(|_, c| c.post_id != id);
        }
        Ok(owned)
    }

    async fn post_exists(&self, id: i64) -> Result<bool, StoreError> {
        let inner = self.lock();
        Ok(inner.posts.contains_key(&id))
    }

    async fn list_posts(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let inner = self.lock();
        let needle = search.map(|s| s.to_lowercase());
        Ok(inner
            .posts
            .values()
            .filter(|post| match &needle {
                Some(needle) => {
                    post.title.to_lowercase().contains(needle)
                        || post.content.to_lowercase().contains(needle)
                }
                None => true,
            })
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_posts_by_username(
        &self,
        username: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .posts
            .values()
            .filter(|post| post.username == username)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn insert_comment(
        &self,
        post_id: i64,
        username: &str,
        content: &str,
    ) -> Result<Comment, StoreError> {
        let mut inner = self.lock();
        inner.next_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: inner.next_comment_id,
            content: content.to_string(),
            username: username.to_string(),
            post_id,
            created_at: now,
            updated_at: now,
        };
        inner.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, post_id: i64, id: i64) -> Result<Option<Comment>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .comments
            .get(&id)
            .filter(|comment| comment.post_id == post_id)
            .cloned())
    }

    async fn update_comment(
        &self,
        id: i64,
        username: &str,
        content: &str,
    ) -> Result<Option<Comment>, StoreError> {
        let mut inner = self.lock();
        match inner
            .comments
            .get_mut(&id)
            .filter(|c| c.username == username)
        {
            Some(comment) => {
                comment.content = content.to_string();
                comment.updated_at = Utc::now();
                Ok(Some(comment.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, id: i64, username: &str) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        let owned = matches!(inner.comments.get(&id), Some(c) if c.username == username);
        if owned {
            inner.comments.remove(&id);
        }
        Ok(owned)
    }

    async fn list_comments(
        &self,
        post_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::new();
        let user = User {
            username: "alice".to_string(),
            password: "hash".to_string(),
            name: "Alice".to_string(),
        };
        store.insert_user(&user).await.unwrap();
        let err = store.insert_user(&user).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn deleting_a_post_drops_its_comments() {
        let store = MemoryStore::new();
        let post = store.insert_post("alice", "t", "c").await.unwrap();
        store.insert_comment(post.id, "alice", "hi").await.unwrap();
        assert!(store.delete_post(post.id, "alice").await.unwrap());
        let comments = store.list_comments(post.id, 10, 0).await.unwrap();
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn poisoned_lock_does_not_wedge_the_store() {
        let store = MemoryStore::new();
        store.insert_post("alice", "t", "c").await.unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.inner.lock().unwrap();
            panic!("poison the mutex");
        }));

        // Subsequent calls still see the data
        assert!(store.find_post(1).await.unwrap().is_some());
        store.insert_post("alice", "t2", "c2").await.unwrap();
    }

    #[tokio::test]
    async fn owner_filter_applies_to_mutations() {
        let store = MemoryStore::new();
        let post = store.insert_post("alice", "t", "c").await.unwrap();
        assert!(!store.delete_post(post.id, "bob").await.unwrap());
        assert!(store
            .update_post(post.id, "bob", "x", "y")
            .await
            .unwrap()
            .is_none());
        assert!(store.find_post(post.id).await.unwrap().is_some());
    }
}
