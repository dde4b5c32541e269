use super::SmsForwarder;
use crate::error::{GatewayError, GatewayResult};
use crate::types::SmsRecord;
use async_trait::async_trait;
use std::sync::Mutex;

/// Records every forwarded SMS; optionally fails each call.
#[derive(Default)]
pub struct RecordingForwarder {
    pub forwarded: Mutex<Vec<SmsRecord>>,
    pub fail: bool,
}

impl RecordingForwarder {
    pub fn failing() -> Self {
        Self {
            forwarded: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.forwarded.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsForwarder for RecordingForwarder {
    async fn forward(&self, record: &SmsRecord) -> GatewayResult<()> {
        self.forwarded.lock().unwrap().push(record.clone());
        if self.fail {
            return Err(GatewayError::UpstreamForward("DHIS2 returned 500".to_string()));
        }
        Ok(())
    }
}
