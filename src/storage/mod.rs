//! This module defines the storage interface for SMS records and counters,
//! with a Redis implementation and an in-process one.
pub mod memory;
pub mod redis_store;

pub use memory::MemorySmsStore;
pub use redis_store::{RedisSettings, RedisSmsStore};

use crate::error::GatewayResult;
use crate::types::{SmsRecord, SmsStats};
use async_trait::async_trait;

/// A trait for persisting SMS records and reading them back.
#[async_trait]
pub trait SmsStore {
    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the store does not answer.
    async fn ping(&self) -> GatewayResult<()>;

    /// Persists a record and increments the counter for its direction.
    ///
    /// Both happen as one atomic unit in the store. Returns the counter value
    /// after the increment.
    ///
    /// # Errors
    ///
    /// This function will return an error if the record cannot be encoded or
    /// the store rejects the write.
    async fn insert(&self, record: &SmsRecord) -> GatewayResult<u64>;

    /// Reads the inbound and outbound counters.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the counters cannot be read.
    async fn stats(&self) -> GatewayResult<SmsStats>;

    /// Retrieves up to `limit` of the most recent records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the records cannot be read.
    async fn recent(&self, limit: usize) -> GatewayResult<Vec<SmsRecord>>;
}
