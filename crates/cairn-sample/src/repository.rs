//! Repository trait definitions.

use crate::domain::{Post, User};
use async_trait::async_trait;
use cairn_core::CairnResult;

/// User repository trait.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds every user.
    async fn find_all(&self) -> CairnResult<Vec<User>>;

    /// Finds a user by user name.
    async fn find_by_user_name(&self, user_name: &str) -> CairnResult<Option<User>>;
}

/// Post repository trait.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Stores a new post and returns it with its assigned id.
    async fn create(&self, post: &Post) -> CairnResult<Post>;

    /// Replaces the content of an existing post.
    ///
    /// Returns `true` if the post existed.
    async fn update(&self, post: &Post) -> CairnResult<bool>;

    /// Deletes a user's post.
    ///
    /// Returns `true` if the post existed and was deleted.
    async fn delete(&self, user_name: &str, id: u32) -> CairnResult<bool>;

    /// Finds a user's posts, newest first.
    async fn find_by_user_name(&self, user_name: &str) -> CairnResult<Vec<Post>>;
}
