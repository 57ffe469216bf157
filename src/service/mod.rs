//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the relay:
//! - Chat services (e.g., Slack)
//! - Query services (e.g., DuckDB)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod query;
