//! The main entry point for the DHIS2 SMS receiver.
mod app;
mod dhis2;
mod error;
mod logging;
mod service;
mod storage;
mod types;
mod web;

use anyhow::Result;

/// The main function of the application.
///
/// Parses configuration from flags and environment, then serves the HTTP API
/// until interrupted.
///
/// # Errors
///
/// Returns an error if setup fails or the listener cannot be bound.
#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
