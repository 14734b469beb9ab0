//! # Cairn Sample
//!
//! A small users/posts application showing method-level caching through the
//! `cairn-cache` provider contract:
//!
//! - reads are served from `users-cache` and `posts-cache`
//! - writes to posts evict every entry of `posts-cache`
//!
//! Persistence is represented by the repository traits; the in-memory
//! implementations back the demo binary and the integration tests.

pub mod cache_keys;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod social_service;

pub use domain::{Post, User};
pub use memory::{InMemoryPostRepository, InMemoryUserRepository};
pub use repository::{PostRepository, UserRepository};
pub use social_service::{SocialService, SocialServiceImpl};
