//! Social service with cached reads.

use crate::cache_keys::{ALL_USERS_KEY, POSTS_CACHE, USERS_CACHE};
use crate::domain::{Post, User};
use crate::repository::{PostRepository, UserRepository};
use async_trait::async_trait;
use cairn_cache::{CacheExt, CacheManager, CacheProvider};
use cairn_core::{CairnError, CairnResult, ValidateExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Social service trait.
#[async_trait]
pub trait SocialService: Send + Sync {
    /// Lists every user.
    async fn find_all_users(&self) -> CairnResult<Vec<User>>;

    /// Finds a user by user name; `None` when there is no such user.
    async fn find_user_by_user_name(&self, user_name: &str) -> CairnResult<Option<User>>;

    /// Lists a user's posts, newest first.
    async fn find_posts_by_user_name(&self, user_name: &str) -> CairnResult<Vec<Post>>;

    /// Creates a post and returns it with its assigned id.
    async fn create_post(&self, post: &Post) -> CairnResult<Post>;

    /// Updates a post's content. Returns `true` if the post existed.
    async fn update_post(&self, post: &Post) -> CairnResult<bool>;

    /// Deletes a user's post. Returns `true` if the post existed.
    async fn delete_post(&self, user_name: &str, id: u32) -> CairnResult<bool>;
}

type JsonProvider = Arc<dyn CacheProvider<String, Value>>;

/// Social service backed by repositories, with reads cached in
/// `users-cache` and `posts-cache`.
///
/// Every post write evicts all of `posts-cache` once the repository call
/// succeeds; a failed write leaves the cache untouched.
pub struct SocialServiceImpl<U: UserRepository, P: PostRepository> {
    user_repository: Arc<U>,
    post_repository: Arc<P>,
    users_cache: JsonProvider,
    posts_cache: JsonProvider,
}

impl<U: UserRepository, P: PostRepository> SocialServiceImpl<U, P> {
    /// Creates a new social service, obtaining its caches from `cache_manager`.
    pub fn new<M>(user_repository: Arc<U>, post_repository: Arc<P>, cache_manager: &M) -> CairnResult<Self>
    where
        M: CacheManager<String, Value>,
    {
        let users_cache: JsonProvider = cache_manager.get_cache(USERS_CACHE)?;
        let posts_cache: JsonProvider = cache_manager.get_cache(POSTS_CACHE)?;

        Ok(Self {
            user_repository,
            post_repository,
            users_cache,
            posts_cache,
        })
    }

    fn evict_posts(&self) {
        self.posts_cache.clear();
        debug!("Evicted all entries of {}", POSTS_CACHE);
    }
}

fn require_user_name(user_name: &str) -> CairnResult<()> {
    if user_name.trim().is_empty() {
        return Err(CairnError::validation("user_name: must not be blank"));
    }
    Ok(())
}

#[async_trait]
impl<U, P> SocialService for SocialServiceImpl<U, P>
where
    U: UserRepository + 'static,
    P: PostRepository + 'static,
{
    async fn find_all_users(&self) -> CairnResult<Vec<User>> {
        debug!("Finding all users");

        self.users_cache
            .cacheable_value(ALL_USERS_KEY, || self.user_repository.find_all())
            .await
    }

    async fn find_user_by_user_name(&self, user_name: &str) -> CairnResult<Option<User>> {
        debug!("Finding user: {}", user_name);
        require_user_name(user_name)?;

        self.users_cache
            .cacheable(user_name, || self.user_repository.find_by_user_name(user_name))
            .await
    }

    async fn find_posts_by_user_name(&self, user_name: &str) -> CairnResult<Vec<Post>> {
        debug!("Finding posts of: {}", user_name);
        require_user_name(user_name)?;

        self.posts_cache
            .cacheable_value(user_name, || self.post_repository.find_by_user_name(user_name))
            .await
    }

    async fn create_post(&self, post: &Post) -> CairnResult<Post> {
        post.validate_request()?;

        let created = self.post_repository.create(post).await?;
        self.evict_posts();

        info!("Post created: {} by {}", created.id.unwrap_or_default(), created.user_name);
        Ok(created)
    }

    async fn update_post(&self, post: &Post) -> CairnResult<bool> {
        post.validate_request()?;
        let id = post
            .id
            .ok_or_else(|| CairnError::invalid_argument("cannot update a post without an id"))?;

        let updated = self.post_repository.update(post).await?;
        self.evict_posts();

        info!("Post updated: {} (found: {})", id, updated);
        Ok(updated)
    }

    async fn delete_post(&self, user_name: &str, id: u32) -> CairnResult<bool> {
        require_user_name(user_name)?;

        let deleted = self.post_repository.delete(user_name, id).await?;
        self.evict_posts();

        info!("Post deleted: {} by {} (found: {})", id, user_name, deleted);
        Ok(deleted)
    }
}
