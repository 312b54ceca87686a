//! Redis cache: JSON values with TTL, fixed-window rate limiting and the
//! cached feature lookups used by product filters.

use std::collections::BTreeMap;

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{
    Config, CACHE_KEY_FILTERABLE_FEATURES, CACHE_KEY_FILTERABLE_RULES, CACHE_PREFIX_RATE_LIMIT,
    DEFAULT_CACHE_TTL_SECONDS,
};
use crate::domain::Feature;
use crate::errors::{AppError, AppResult};

/// Redis handle; clones share one multiplexed connection.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
    default_ttl: u64,
}

impl Cache {
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            connection,
            default_ttl: DEFAULT_CACHE_TTL_SECONDS,
        })
    }

    /// Round trip to Redis for health checks
    pub async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;

        value
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;

        conn.set_ex::<_, _, ()>(key, json, self.default_ttl)
            .await
            .map_err(cache_error)
    }

    // =========================================================================
    // Feature lookups
    // =========================================================================

    pub async fn get_filterable_rules(&self) -> AppResult<Option<BTreeMap<String, String>>> {
        self.get(CACHE_KEY_FILTERABLE_RULES).await
    }

    pub async fn set_filterable_rules(&self, rules: &BTreeMap<String, String>) -> AppResult<()> {
        self.set(CACHE_KEY_FILTERABLE_RULES, rules).await
    }

    pub async fn get_filterable_features(&self) -> AppResult<Option<Vec<Feature>>> {
        self.get(CACHE_KEY_FILTERABLE_FEATURES).await
    }

    pub async fn set_filterable_features(&self, features: &[Feature]) -> AppResult<()> {
        self.set(CACHE_KEY_FILTERABLE_FEATURES, features).await
    }

    /// Drop every cached feature lookup; called after any feature write.
    pub async fn invalidate_features(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(&[CACHE_KEY_FILTERABLE_RULES, CACHE_KEY_FILTERABLE_FEATURES])
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    // =========================================================================
    // Rate limiting
    // =========================================================================

    /// Count a request against a fixed window.
    ///
    /// Returns the request count in the current window and whether it is
    /// still within `max_requests`.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u64,
        window_seconds: u64,
    ) -> AppResult<(u64, bool)> {
        let key = format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier);
        let mut conn = self.connection.clone();

        let (count,): (u64,) = rate_limit_pipeline(&key, window_seconds)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok((count, count <= max_requests))
    }
}

/// Opens the window with its TTL if absent, then counts the request.
/// Both run in one MULTI/EXEC so a counter never outlives its window.
fn rate_limit_pipeline(key: &str, window_seconds: u64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(key)
        .arg(0u64)
        .arg("NX")
        .arg("EX")
        .arg(window_seconds)
        .ignore()
        .incr(key, 1u64);
    pipe
}

fn cache_error(e: RedisError) -> AppError {
    AppError::internal(format!("Cache error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_window_and_count_are_one_transaction() {
        let packed = rate_limit_pipeline("rate_limit:10.0.0.1", 60).get_packed_pipeline();
        let wire = String::from_utf8_lossy(&packed);

        let position = |needle: &str| {
            wire.find(needle)
                .unwrap_or_else(|| panic!("{} missing from {}", needle, wire))
        };

        assert!(position("MULTI") < position("SET"));
        assert!(position("SET") < position("INCR"));
        assert!(position("INCR") < position("EXEC"));
        assert!(wire.contains("NX"));
        assert!(wire.contains("EX\r\n$2\r\n60"));
    }
}
