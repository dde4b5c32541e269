//! This module defines the HTTP API endpoints of the SMS receiver.
use crate::error::GatewayError;
use crate::service::{HealthReport, SmsService};
use crate::types::{ForwardStatus, SmsRecord};
use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequest, Query, Request, State},
    http::header,
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request body for an inbound SMS.
#[derive(Deserialize, Debug, Default)]
pub struct InboundSmsRequest {
    /// The sender's phone number.
    #[serde(default, alias = "from")]
    originator: Option<String>,
    #[serde(default, alias = "text")]
    message: Option<String>,
}

/// Request body for an outbound SMS.
#[derive(Deserialize, Debug, Default)]
pub struct OutboundSmsRequest {
    /// The destination phone number.
    #[serde(default, alias = "to")]
    recipient: Option<String>,
    #[serde(default, alias = "text")]
    message: Option<String>,
}

/// Response for an accepted SMS.
#[derive(Serialize)]
pub struct SubmitResponse {
    status: &'static str,
    /// The id of the stored record.
    id: Uuid,
    message: &'static str,
    /// Outcome of forwarding to DHIS2; inbound only.
    #[serde(skip_serializing_if = "Option::is_none")]
    forward_status: Option<ForwardStatus>,
}

/// Response structure for the message counters.
#[derive(Serialize)]
pub struct StatsResponse {
    status: &'static str,
    total_sms: u64,
    inbound: u64,
    outbound: u64,
}

/// Query parameters for listing messages.
#[derive(Deserialize)]
pub struct ListQuery {
    /// Kept as text so malformed values surface as a validation error.
    limit: Option<String>,
}

#[derive(Serialize)]
pub struct ListResponse {
    status: &'static str,
    count: usize,
    sms: Vec<SmsRecord>,
}

/// Extracts an SMS payload from a JSON body, a form-urlencoded body, or the
/// query string, depending on the request's content type.
pub struct SmsPayload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for SmsPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let is_json = content_type.starts_with("application/json");
        let is_form = content_type.starts_with("application/x-www-form-urlencoded");

        if is_json {
            let Json(payload) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| GatewayError::Validation(e.body_text()))?;
            Ok(Self(payload))
        } else if is_form {
            let Form(payload) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| GatewayError::Validation(e.body_text()))?;
            Ok(Self(payload))
        } else {
            // Gateways that post `?originator=..&message=..` with no body.
            let Query(payload) = Query::<T>::try_from_uri(req.uri())
                .map_err(|e| GatewayError::Validation(e.body_text()))?;
            Ok(Self(payload))
        }
    }
}

/// Receives an SMS from the gateway and stores it.
#[axum::debug_handler]
pub async fn receive_sms(
    State(service): State<Arc<SmsService>>,
    SmsPayload(req): SmsPayload<InboundSmsRequest>,
) -> Result<Json<SubmitResponse>, GatewayError> {
    let receipt = service.receive(req.originator, req.message).await?;
    Ok(Json(SubmitResponse {
        status: "success",
        id: receipt.record.id,
        message: "SMS received successfully",
        forward_status: Some(receipt.forward_status),
    }))
}

/// Accepts an outgoing SMS.
#[axum::debug_handler]
pub async fn send_sms(
    State(service): State<Arc<SmsService>>,
    SmsPayload(req): SmsPayload<OutboundSmsRequest>,
) -> Result<Json<SubmitResponse>, GatewayError> {
    let record = service.send(req.recipient, req.message).await?;
    Ok(Json(SubmitResponse {
        status: "success",
        id: record.id,
        message: "SMS queued for delivery",
        forward_status: None,
    }))
}

/// Reports store reachability. Always answers 200.
#[axum::debug_handler]
pub async fn health(State(service): State<Arc<SmsService>>) -> Json<HealthReport> {
    Json(service.health().await)
}

#[axum::debug_handler]
pub async fn stats(
    State(service): State<Arc<SmsService>>,
) -> Result<Json<StatsResponse>, GatewayError> {
    let stats = service.stats().await?;
    Ok(Json(StatsResponse {
        status: "success",
        total_sms: stats.total(),
        inbound: stats.inbound,
        outbound: stats.outbound,
    }))
}

/// Lists the most recent messages, newest first.
#[axum::debug_handler]
pub async fn list_sms(
    State(service): State<Arc<SmsService>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, GatewayError> {
    let Query(query) = query.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let sms = service.list(query.limit.as_deref()).await?;
    Ok(Json(ListResponse {
        status: "success",
        count: sms.len(),
        sms,
    }))
}
