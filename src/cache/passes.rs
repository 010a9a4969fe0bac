use crate::cache::CacheService;
use redis::AsyncCommands;
use tracing::warn;

const PASS_LIST_TTL_SECONDS: u64 = 60;

fn pass_list_key(event_id: i64, include_inactive: bool) -> String {
    let scope = if include_inactive { "all" } else { "active" };
    format!("passes:{}:{}", event_id, scope)
}

impl CacheService {
    /// Cached serialized pass list for an event, if present.
    pub async fn get_pass_list(&self, event_id: i64, include_inactive: bool) -> Option<String> {
        let mut conn = self.redis.conn.clone();
        match conn.get::<_, Option<String>>(pass_list_key(event_id, include_inactive)).await {
            Ok(value) => value,
            Err(e) => {
                warn!("pass list cache read failed: {:?}", e);
                None
            }
        }
    }

    pub async fn cache_pass_list(&self, event_id: i64, include_inactive: bool, json: &str) {
        let mut conn = self.redis.conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(pass_list_key(event_id, include_inactive), json, PASS_LIST_TTL_SECONDS)
            .await
        {
            warn!("pass list cache write failed: {:?}", e);
        }
    }

    /// Drops both listing variants for an event. Called after every pass
    /// mutation, before the response is returned.
    pub async fn invalidate_passes(&self, event_id: i64) {
        let mut conn = self.redis.conn.clone();
        let mut pipe = redis::pipe();
        pipe.del(pass_list_key(event_id, false));
        pipe.del(pass_list_key(event_id, true));
        let res: Result<(), redis::RedisError> = pipe.query_async(&mut conn).await;
        if let Err(e) = res {
            warn!("pass list cache invalidation failed for event {}: {:?}", event_id, e);
        }
    }
}
