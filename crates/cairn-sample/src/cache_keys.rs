//! Cache names and fixed keys used by the social service.

/// Cache holding users, keyed by user name, plus the full user list.
pub const USERS_CACHE: &str = "users-cache";

/// Cache holding each user's posts, keyed by user name.
pub const POSTS_CACHE: &str = "posts-cache";

/// Key of the full user list in [`USERS_CACHE`].
pub const ALL_USERS_KEY: &str = "all-users";
