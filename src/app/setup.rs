//! This module handles the initial setup of the application.
use super::args::{AppArgs, StoreBackend};
use crate::dhis2::{Dhis2Client, Dhis2Settings, SmsForwarder};
use crate::logging::{self, LogGuard};
use crate::service::SmsService;
use crate::storage::{MemorySmsStore, RedisSettings, RedisSmsStore, SmsStore};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Contains all the necessary components for the receiver to run.
pub struct PreparedApp {
    /// The address the HTTP server binds to.
    pub addr: String,
    pub service: Arc<SmsService>,
    /// Held for the lifetime of the process so file logs get flushed.
    pub log_guard: Option<LogGuard>,
}

/// Prepares the application for running.
///
/// This function performs the following steps:
/// 1. Configures logging.
/// 2. Builds the store client for the selected backend.
/// 3. Builds the DHIS2 forwarder if a DHIS2 URL is configured.
///
/// # Errors
///
/// This function will return an error if any of the setup steps fail.
pub fn prepare(args: AppArgs) -> Result<PreparedApp> {
    let log_guard = logging::init(&args.log_level, args.log_dir.as_deref())?;

    info!("Starting DHIS2 SMS receiver");

    let store = build_store(&args)?;
    let forwarder = build_forwarder(&args)?;
    let service = Arc::new(SmsService::new(store, forwarder));

    Ok(PreparedApp {
        addr: format!("{}:{}", args.host, args.port),
        service,
        log_guard,
    })
}

fn build_store(args: &AppArgs) -> Result<Arc<dyn SmsStore + Send + Sync>> {
    match args.store {
        StoreBackend::Redis => {
            let settings = redis_settings(args);
            info!(
                "Using Redis store at {}:{} (db {}, prefix '{}')",
                settings.host, settings.port, settings.db, settings.key_prefix
            );
            Ok(Arc::new(RedisSmsStore::new(&settings)?))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; records are lost on restart");
            Ok(Arc::new(MemorySmsStore::new(args.retention)))
        }
    }
}

fn redis_settings(args: &AppArgs) -> RedisSettings {
    RedisSettings {
        host: args.redis_host.clone(),
        port: args.redis_port,
        db: args.redis_db,
        password: args.redis_password.clone(),
        key_prefix: args.key_prefix.clone(),
        retention: args.retention,
        timeout: Duration::from_millis(args.redis_timeout_ms),
    }
}

fn build_forwarder(args: &AppArgs) -> Result<Option<Arc<dyn SmsForwarder + Send + Sync>>> {
    let Some(base_url) = args.dhis2_url.as_deref().filter(|url| !url.trim().is_empty()) else {
        info!("DHIS2 forwarding disabled (no DHIS2 URL configured)");
        return Ok(None);
    };

    let client = Dhis2Client::new(&Dhis2Settings {
        base_url: base_url.to_string(),
        username: args.dhis2_username.clone(),
        password: args.dhis2_password.clone(),
        gateway_id: args.dhis2_gateway_id.clone(),
        timeout: Duration::from_millis(args.dhis2_timeout_ms),
    })?;
    info!("Forwarding inbound SMS to {}", client.endpoint());

    Ok(Some(Arc::new(client)))
}
