use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Forwarding state of an inbound SMS.
///
/// Stored records carry `Pending` or `Disabled`, fixed before the write;
/// `Forwarded` and `Failed` are the outcome reported to the caller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ForwardStatus {
    Pending,
    Forwarded,
    Failed,
    Disabled,
}

/// A single SMS as persisted in the store. Never mutated after the write.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SmsRecord {
    /// UUIDv7, so ids sort by creation time.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub phone: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_status: Option<ForwardStatus>,
}

impl SmsRecord {
    pub fn new(direction: Direction, phone: String, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            direction,
            phone,
            message,
            timestamp: Utc::now(),
            forward_status: None,
        }
    }

    pub fn with_forward_status(mut self, status: ForwardStatus) -> Self {
        self.forward_status = Some(status);
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SmsStats {
    pub inbound: u64,
    pub outbound: u64,
}

impl SmsStats {
    pub fn total(&self) -> u64 {
        self.inbound + self.outbound
    }
}
