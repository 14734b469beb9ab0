//! In-memory repository implementations.

use crate::domain::{Post, User};
use crate::repository::{PostRepository, UserRepository};
use async_trait::async_trait;
use cairn_core::{CairnError, CairnResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// User repository backed by a map ordered by user name.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<BTreeMap<String, User>>,
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let repo = Self::new();
        for user in users {
            repo.add_user(user);
        }
        repo
    }

    /// Adds or replaces a user.
    pub fn add_user(&self, user: User) {
        self.users.write().insert(user.user_name.clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> CairnResult<Vec<User>> {
        Ok(self.users.read().values().cloned().collect())
    }

    async fn find_by_user_name(&self, user_name: &str) -> CairnResult<Option<User>> {
        Ok(self.users.read().get(user_name).cloned())
    }
}

/// Post repository with sequential ids starting at 1.
#[derive(Debug)]
pub struct InMemoryPostRepository {
    posts: RwLock<BTreeMap<u32, Post>>,
    next_id: AtomicU32,
}

impl Default for InMemoryPostRepository {
    fn default() -> Self {
        Self {
            posts: RwLock::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

impl InMemoryPostRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored posts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.read().is_empty()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: &Post) -> CairnResult<Post> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = post.clone().with_id(id);
        self.posts.write().insert(id, created.clone());
        debug!("Stored post {} for {}", id, created.user_name);
        Ok(created)
    }

    async fn update(&self, post: &Post) -> CairnResult<bool> {
        let id = post
            .id
            .ok_or_else(|| CairnError::invalid_argument("cannot update a post without an id"))?;

        match self.posts.write().get_mut(&id) {
            Some(stored) => {
                stored.content = post.content.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_name: &str, id: u32) -> CairnResult<bool> {
        let mut posts = self.posts.write();
        match posts.get(&id) {
            Some(post) if post.user_name == user_name => {
                posts.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_by_user_name(&self, user_name: &str) -> CairnResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .values()
            .filter(|post| post.user_name == user_name)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.submit_date.cmp(&a.submit_date).then(b.id.cmp(&a.id)));
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_find_users() {
        let repo = InMemoryUserRepository::with_users([
            User::new("taha", "Taha Irbouh", "taha@irbouh.net"),
            User::new("adam", "Adam Irbouh", "adam@irbouh.net"),
        ]);

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].user_name, "adam");

        assert!(repo.find_by_user_name("taha").await.unwrap().is_some());
        assert!(repo.find_by_user_name("omar").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryPostRepository::new();
        let first = repo.create(&Post::new("taha", "post 1")).await.unwrap();
        let second = repo.create(&Post::new("taha", "post 2")).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_find_posts_newest_first() {
        let repo = InMemoryPostRepository::new();
        let now = Utc::now();
        repo.create(&Post::new("taha", "old").with_submit_date(now - Duration::hours(2)))
            .await
            .unwrap();
        repo.create(&Post::new("taha", "new").with_submit_date(now)).await.unwrap();
        repo.create(&Post::new("adam", "other").with_submit_date(now)).await.unwrap();

        let posts = repo.find_by_user_name("taha").await.unwrap();
        let contents: Vec<_> = posts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_update_changes_content() {
        let repo = InMemoryPostRepository::new();
        let mut post = repo.create(&Post::new("taha", "draft")).await.unwrap();
        post.content = "final".to_string();

        assert!(repo.update(&post).await.unwrap());
        assert_eq!(repo.find_by_user_name("taha").await.unwrap()[0].content, "final");

        assert!(!repo.update(&Post::new("taha", "x").with_id(99)).await.unwrap());
        assert!(repo.update(&Post::new("taha", "x")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_requires_matching_author() {
        let repo = InMemoryPostRepository::new();
        let post = repo.create(&Post::new("taha", "post")).await.unwrap();
        let id = post.id.unwrap();

        assert!(!repo.delete("adam", id).await.unwrap());
        assert!(repo.delete("taha", id).await.unwrap());
        assert!(repo.is_empty());
    }
}
