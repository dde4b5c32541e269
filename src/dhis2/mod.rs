//! HTTP client that forwards inbound SMS to a DHIS2 instance.
//!
//! Messages are posted to DHIS2's `/api/sms/inbound` import endpoint with
//! basic authentication, where the SMS command parsers route them into
//! tracker or aggregate data.
#[cfg(test)]
pub mod fake;

use crate::error::{GatewayError, GatewayResult};
use crate::types::SmsRecord;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// A trait for handing inbound SMS to an upstream system.
#[async_trait]
pub trait SmsForwarder {
    /// Forwards one inbound record.
    ///
    /// # Errors
    ///
    /// Returns `UpstreamForward` if the upstream could not be reached or did
    /// not accept the message.
    async fn forward(&self, record: &SmsRecord) -> GatewayResult<()>;
}

#[derive(Clone, Debug)]
pub struct Dhis2Settings {
    /// Base URL of the DHIS2 instance, e.g. `http://dhis2:8080`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Reported to DHIS2 as the gateway the SMS arrived through.
    pub gateway_id: String,
    pub timeout: Duration,
}

/// Body accepted by `POST /api/sms/inbound`.
#[derive(Serialize, Debug)]
struct InboundSmsPayload<'a> {
    text: &'a str,
    originator: &'a str,
    gatewayid: &'a str,
    receiveddate: String,
    sentdate: String,
    smsencoding: &'static str,
}

#[derive(Clone)]
pub struct Dhis2Client {
    inner: Client,
    endpoint: String,
    username: String,
    password: String,
    gateway_id: String,
}

impl Dhis2Client {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(settings: &Dhis2Settings) -> GatewayResult<Self> {
        let inner = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            endpoint: inbound_endpoint(&settings.base_url),
            username: settings.username.clone(),
            password: settings.password.clone(),
            gateway_id: settings.gateway_id.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn inbound_endpoint(base_url: &str) -> String {
    format!("{}/api/sms/inbound", base_url.trim_end_matches('/'))
}

#[async_trait]
impl SmsForwarder for Dhis2Client {
    async fn forward(&self, record: &SmsRecord) -> GatewayResult<()> {
        let date = record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let payload = InboundSmsPayload {
            text: &record.message,
            originator: &record.phone,
            gatewayid: &self.gateway_id,
            receiveddate: date.clone(),
            sentdate: date,
            smsencoding: "1",
        };

        let response = self
            .inner
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamForward(format!(
                "DHIS2 returned {status}: {body}"
            )));
        }

        debug!("DHIS2 accepted SMS {} ({})", record.id, status);
        Ok(())
    }
}
