use crate::redis_client::RedisClient;

pub mod passes;

// Read cache for the hot admin listing path. Misses and Redis failures
// fall through to Postgres; a cache problem never fails a request.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
}

impl CacheService {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }
}
