//! Library root for `query-relay`.
//!
//! Query-relay is a Slack bot that answers questions with data:
//! - Listens for @-mentions and channel messages
//! - Sends the text as a prompt to a DuckDB-backed query service
//! - Replies in the thread with a summary and uploads the rows as CSV
//!
//! The bot integrates with Slack for chat and DuckDB for queries. Both sit
//! behind traits so the relay can be exercised against other implementations.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the relay runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with query and chat clients
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting query-relay ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
