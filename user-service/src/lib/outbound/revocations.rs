use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use crate::config::RedisConfig;
use crate::domain::user::ports::RevocationStore;
use crate::user::errors::RevocationError;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Revoked access tokens kept in Redis until their natural expiry.
///
/// Each entry is `<prefix><token>` set to `"1"` with a TTL. Lookups fail open:
/// when Redis is unreachable a revoked token is accepted until it expires.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisRevocationStore {
    /// Connect to Redis.
    ///
    /// # Errors
    /// * `Unavailable` - URL is invalid or the first connection failed
    pub async fn connect(config: &RedisConfig) -> Result<Self, RevocationError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RevocationError::Unavailable(e.to_string()))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| RevocationError::Unavailable(e.to_string()))?;

        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn key(&self, token: &str) -> String {
        revocation_key(&self.key_prefix, token)
    }
}

fn revocation_key(prefix: &str, token: &str) -> String {
    format!("{prefix}{token}")
}

/// Whole seconds for `SET .. EX`, which rejects zero.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

async fn bounded<T, F>(command: F) -> Result<T, RevocationError>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    tokio::time::timeout(COMMAND_TIMEOUT, command)
        .await
        .map_err(|_| RevocationError::Timeout)?
        .map_err(|e| RevocationError::Unavailable(e.to_string()))
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn record(&self, token: &str, ttl: Duration) -> Result<(), RevocationError> {
        let key = self.key(token);
        let mut conn = self.conn.clone();

        bounded(conn.set_ex::<_, _, ()>(&key, "1", expiry_seconds(ttl))).await
    }

    async fn is_revoked(&self, token: &str) -> bool {
        let key = self.key(token);
        let mut conn = self.conn.clone();

        match bounded(conn.exists::<_, bool>(&key)).await {
            Ok(revoked) => revoked,
            Err(e) => {
                tracing::warn!(error = %e, "Revocation lookup failed, accepting token");
                false
            }
        }
    }
}
