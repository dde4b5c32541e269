//! In-process `SmsStore`, used with `--store memory` and in tests.
use super::SmsStore;
use crate::error::{GatewayError, GatewayResult};
use crate::types::{Direction, SmsRecord, SmsStats};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    /// Newest record at the front.
    records: VecDeque<SmsRecord>,
    stats: SmsStats,
}

pub struct MemorySmsStore {
    state: Mutex<MemoryState>,
    retention: usize,
    available: AtomicBool,
}

impl MemorySmsStore {
    pub fn new(retention: usize) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            retention: retention.max(1),
            available: AtomicBool::new(true),
        }
    }

    /// Makes every subsequent operation fail as if the store were unreachable.
    #[cfg(test)]
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, MemoryState>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(GatewayError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| GatewayError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SmsStore for MemorySmsStore {
    async fn ping(&self) -> GatewayResult<()> {
        self.lock().map(|_| ())
    }

    async fn insert(&self, record: &SmsRecord) -> GatewayResult<u64> {
        let mut state = self.lock()?;

        state.records.push_front(record.clone());
        state.records.truncate(self.retention);

        let counter = match record.direction {
            Direction::Inbound => &mut state.stats.inbound,
            Direction::Outbound => &mut state.stats.outbound,
        };
        *counter += 1;
        Ok(*counter)
    }

    async fn stats(&self) -> GatewayResult<SmsStats> {
        Ok(self.lock()?.stats)
    }

    async fn recent(&self, limit: usize) -> GatewayResult<Vec<SmsRecord>> {
        let state = self.lock()?;
        Ok(state.records.iter().take(limit).cloned().collect())
    }
}
