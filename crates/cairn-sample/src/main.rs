//! # Social Demo
//!
//! Loads configuration from `./config`, builds the cache registry, seeds the
//! in-memory repositories, and runs a few reads and writes through the
//! cached social service. Run with `RUST_LOG=debug` to watch cache hits
//! and misses.

use cairn_cache::JsonCacheManager;
use cairn_config::ConfigLoader;
use cairn_core::{init_telemetry, CairnError, CairnResult, ErrorResponse};
use cairn_sample::{
    InMemoryPostRepository, InMemoryUserRepository, Post, SocialService, SocialServiceImpl, User,
};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let response = ErrorResponse::from_error(&e);
        let summary = serde_json::to_string(&response).unwrap_or_else(|_| e.to_string());
        eprintln!("social-demo failed: {}", summary);
        std::process::exit(1);
    }
}

async fn run() -> CairnResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_telemetry(&config.observability)?;

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {}", config.app.environment);

    let cache_manager = JsonCacheManager::from_config(&config.cache)?;

    let users = Arc::new(InMemoryUserRepository::with_users([
        User::new("taha", "Taha Irbouh", "taha@irbouh.net"),
        User::new("adam", "Adam Irbouh", "adam@irbouh.net"),
    ]));
    let posts = Arc::new(InMemoryPostRepository::new());

    let service = SocialServiceImpl::new(users, posts, &cache_manager)?;

    for (user_name, content) in [("taha", "post 1"), ("taha", "post 2"), ("adam", "hello")] {
        service.create_post(&Post::new(user_name, content)).await?;
    }

    let all_users = service.find_all_users().await?;
    info!("Found {} users", all_users.len());

    // second round is served from the caches
    for _ in 0..2 {
        let per_user = try_join_all(
            all_users
                .iter()
                .map(|user| service.find_posts_by_user_name(&user.user_name)),
        )
        .await?;

        for (user, user_posts) in all_users.iter().zip(&per_user) {
            info!("{} has {} posts", user.user_name, user_posts.len());
        }
    }

    let taha = service
        .find_user_by_user_name("taha")
        .await?
        .ok_or_else(|| CairnError::not_found("User", "taha"))?;
    info!("Found {} <{}>", taha.full_name, taha.email_address);

    let missing = service.find_user_by_user_name("omar").await?;
    info!("Lookup of unknown user returned {:?}", missing);

    if let Some(mut latest) = service.find_posts_by_user_name("taha").await?.into_iter().next() {
        latest.content = format!("{} (edited)", latest.content);
        service.update_post(&latest).await?;
    }

    let taha_posts = service.find_posts_by_user_name("taha").await?;
    info!("Latest post of taha: {:?}", taha_posts.first().map(|p| &p.content));

    for name in cache_manager.cache_names() {
        let cache = cache_manager.get_cache(&name)?;
        info!("Cache {} holds {} entries", name, cache.size());
    }

    Ok(())
}
