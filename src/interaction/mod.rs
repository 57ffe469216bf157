//! Event handling and user interactions for the relay.
//!
//! This module provides functionality for handling chat events:
//! - Extracting a prompt from mentions and plain messages
//! - Coordinating the acknowledgment, query, and reply for each event

pub mod chat_event;
pub mod extract;
