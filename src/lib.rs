pub mod config;
pub mod database;
pub mod redis_client;
pub mod error;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod cache;
pub mod services;

use std::sync::Arc;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub passes: services::passes::PassService,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let cache = cache::CacheService::new(redis.clone());
        let passes = services::passes::PassService::new(db.clone());

        Ok(Arc::new(Self {
            db,
            redis,
            cache,
            passes,
            config,
        }))
    }
}
