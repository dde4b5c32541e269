//! Request-level operations of the receiver, independent of HTTP.
use crate::dhis2::SmsForwarder;
use crate::error::{GatewayError, GatewayResult};
use crate::storage::SmsStore;
use crate::types::{Direction, ForwardStatus, SmsRecord, SmsStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_LIST_LIMIT: usize = 10;
pub const MAX_LIST_LIMIT: usize = 100;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreHealth {
    Healthy,
    Unhealthy,
}

#[derive(Serialize, Debug)]
pub struct HealthReport {
    /// `healthy` when the store answers, `degraded` otherwise.
    pub status: &'static str,
    pub redis: StoreHealth,
    pub timestamp: DateTime<Utc>,
}

/// A stored inbound record together with what happened when it was forwarded.
#[derive(Debug)]
pub struct InboundReceipt {
    pub record: SmsRecord,
    pub forward_status: ForwardStatus,
}

pub struct SmsService {
    store: Arc<dyn SmsStore + Send + Sync>,
    forwarder: Option<Arc<dyn SmsForwarder + Send + Sync>>,
}

impl SmsService {
    pub fn new(
        store: Arc<dyn SmsStore + Send + Sync>,
        forwarder: Option<Arc<dyn SmsForwarder + Send + Sync>>,
    ) -> Self {
        Self { store, forwarder }
    }

    /// Validates and stores an inbound SMS, then forwards it to DHIS2 when
    /// forwarding is enabled.
    ///
    /// Nothing is forwarded unless the write succeeded. The stored record only
    /// notes whether forwarding was due; the outcome is returned alongside it,
    /// and a forwarding failure is logged without failing the call.
    pub async fn receive(
        &self,
        originator: Option<String>,
        message: Option<String>,
    ) -> GatewayResult<InboundReceipt> {
        let phone = required("originator", originator)?;
        let message = required("message", message)?;

        info!("SMS from {}", phone);
        debug!("SMS content from {}: {}", phone, message);

        let due = match self.forwarder {
            Some(_) => ForwardStatus::Pending,
            None => ForwardStatus::Disabled,
        };
        let record =
            SmsRecord::new(Direction::Inbound, phone, message).with_forward_status(due);

        self.store.insert(&record).await?;

        let forward_status = self.forward(&record).await;
        Ok(InboundReceipt {
            record,
            forward_status,
        })
    }

    /// Validates and stores an outbound SMS. Delivery is simulated by logging.
    pub async fn send(
        &self,
        recipient: Option<String>,
        message: Option<String>,
    ) -> GatewayResult<SmsRecord> {
        let phone = required("recipient", recipient)?;
        let message = required("message", message)?;

        let record = SmsRecord::new(Direction::Outbound, phone, message);
        self.store.insert(&record).await?;

        info!(
            "Simulated delivery of SMS {} to {}: {}",
            record.id, record.phone, record.message
        );
        Ok(record)
    }

    pub async fn health(&self) -> HealthReport {
        let redis = match self.store.ping().await {
            Ok(()) => StoreHealth::Healthy,
            Err(e) => {
                warn!("Store health check failed: {}", e);
                StoreHealth::Unhealthy
            }
        };

        HealthReport {
            status: match redis {
                StoreHealth::Healthy => "healthy",
                StoreHealth::Unhealthy => "degraded",
            },
            redis,
            timestamp: Utc::now(),
        }
    }

    pub async fn stats(&self) -> GatewayResult<SmsStats> {
        self.store.stats().await
    }

    /// Lists the most recent records across both directions, newest first.
    ///
    /// `limit` is the raw query value; see [`parse_limit`].
    pub async fn list(&self, limit: Option<&str>) -> GatewayResult<Vec<SmsRecord>> {
        let limit = parse_limit(limit)?;
        self.store.recent(limit).await
    }

    async fn forward(&self, record: &SmsRecord) -> ForwardStatus {
        let Some(forwarder) = &self.forwarder else {
            return ForwardStatus::Disabled;
        };

        match forwarder.forward(record).await {
            Ok(()) => {
                info!("Forwarded SMS {} to DHIS2", record.id);
                ForwardStatus::Forwarded
            }
            Err(e) => {
                warn!("Could not forward SMS {} to DHIS2: {}", record.id, e);
                ForwardStatus::Failed
            }
        }
    }
}

fn required(field: &str, value: Option<String>) -> GatewayResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(GatewayError::Validation(format!(
            "missing required field '{field}'"
        ))),
    }
}

/// Parses the `limit` query value.
///
/// Absent or empty means [`DEFAULT_LIST_LIMIT`]; values above
/// [`MAX_LIST_LIMIT`] are capped, however many digits they have. Anything
/// that is not a positive integer is rejected.
pub fn parse_limit(raw: Option<&str>) -> GatewayResult<usize> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(DEFAULT_LIST_LIMIT),
        Some(raw) => raw,
    };

    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GatewayError::Validation(format!(
            "limit must be a positive integer, got '{raw}'"
        )));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Err(GatewayError::Validation(
            "limit must be a positive integer, got 0".to_string(),
        ));
    }

    Ok(digits
        .parse::<usize>()
        .map_or(MAX_LIST_LIMIT, |value| value.min(MAX_LIST_LIMIT)))
}
