//! Redis-backed `SmsStore`.
//!
//! Layout under the configured prefix:
//! - `{prefix}:recent` holds JSON records, newest at the head, trimmed to the
//!   retention size.
//! - `{prefix}:count:inbound` and `{prefix}:count:outbound` are plain counters.
use super::SmsStore;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{Direction, SmsRecord, SmsStats};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Connection and layout settings for the Redis store.
#[derive(Clone, Debug)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    pub key_prefix: String,
    /// Number of records kept in the recent list.
    pub retention: usize,
    /// Upper bound for connecting and for each command.
    pub timeout: Duration,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            key_prefix: "sms".to_string(),
            retention: 10_000,
            timeout: Duration::from_millis(2000),
        }
    }
}

#[derive(Clone, Debug)]
struct StoreKeys {
    recent: String,
    inbound: String,
    outbound: String,
}

impl StoreKeys {
    fn new(prefix: &str) -> Self {
        Self {
            recent: format!("{prefix}:recent"),
            inbound: format!("{prefix}:count:inbound"),
            outbound: format!("{prefix}:count:outbound"),
        }
    }

    fn counter(&self, direction: Direction) -> &str {
        match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        }
    }
}

pub struct RedisSmsStore {
    client: redis::Client,
    keys: StoreKeys,
    retention: usize,
    timeout: Duration,
}

impl RedisSmsStore {
    /// Creates the store client. No connection is made until the first command.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the connection settings are rejected.
    pub fn new(settings: &RedisSettings) -> GatewayResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(settings.host.clone(), settings.port),
            redis: RedisConnectionInfo {
                db: settings.db,
                password: settings.password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;

        Ok(Self {
            client,
            keys: StoreKeys::new(&settings.key_prefix),
            retention: settings.retention.max(1),
            timeout: settings.timeout,
        })
    }

    async fn connection(&self) -> GatewayResult<MultiplexedConnection> {
        self.bounded(self.client.get_multiplexed_async_connection())
            .await
    }

    async fn bounded<T, F>(&self, op: F) -> GatewayResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.timeout, op).await {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => Err(GatewayError::StoreUnavailable(format!(
                "redis did not answer within {:?}",
                self.timeout
            ))),
        }
    }
}

/// Index of the last element in a list range covering `count` entries.
/// `count` must be at least one; huge counts saturate instead of wrapping.
fn last_index(count: usize) -> isize {
    isize::try_from(count).unwrap_or(isize::MAX) - 1
}

#[async_trait]
impl SmsStore for RedisSmsStore {
    async fn ping(&self) -> GatewayResult<()> {
        let mut conn = self.connection().await?;
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    async fn insert(&self, record: &SmsRecord) -> GatewayResult<u64> {
        let payload = serde_json::to_string(record)?;
        let mut conn = self.connection().await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .lpush(&self.keys.recent, payload)
            .ignore()
            .ltrim(&self.keys.recent, 0, last_index(self.retention))
            .ignore()
            .incr(self.keys.counter(record.direction), 1u64);

        let (count,): (u64,) = self.bounded(pipe.query_async(&mut conn)).await?;
        debug!(
            "Stored {} SMS {} ({} total)",
            record.direction.as_str(),
            record.id,
            count
        );
        Ok(count)
    }

    async fn stats(&self) -> GatewayResult<SmsStats> {
        let mut conn = self.connection().await?;
        let (inbound, outbound): (Option<u64>, Option<u64>) = self
            .bounded(
                redis::cmd("MGET")
                    .arg(&self.keys.inbound)
                    .arg(&self.keys.outbound)
                    .query_async(&mut conn),
            )
            .await?;

        Ok(SmsStats {
            inbound: inbound.unwrap_or(0),
            outbound: outbound.unwrap_or(0),
        })
    }

    async fn recent(&self, limit: usize) -> GatewayResult<Vec<SmsRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;
        let raw: Vec<String> = self
            .bounded(conn.lrange(&self.keys.recent, 0, last_index(limit)))
            .await?;

        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_str::<SmsRecord>(&entry) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping undecodable record in {}: {}", self.keys.recent, e),
            }
        }
        Ok(records)
    }
}
