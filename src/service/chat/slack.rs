//! Chat service integration for the relay.
//!
//! This module provides the Slack implementation of `GenericChatClient`:
//! - Receiving `app_mention` and `message` events over Socket Mode
//! - Posting, updating, and reacting to messages
//! - Uploading result files into threads

use crate::{
    base::{
        config::Config,
        types::{EventKind, InboundEvent, Res, Void},
    },
    interaction,
    service::query::QueryClient,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use serde::Serialize;
use slack_morphism::prelude::*;
use tracing::{debug, info, instrument, warn};

use std::sync::Arc;

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, query: QueryClient) -> Res<Self> {
        let client = SlackChatClient::new(config, query).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    chat: ChatClient,
    query: QueryClient,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub client: Arc<FullClient>,
    pub query: QueryClient,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, query: QueryClient) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Verify the bot token before listening.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await.map_err(|e| anyhow::anyhow!("Failed to authenticate with Slack: {}", e))?;

        info!("Slack bot user ID: {}", bot_user.user_id.0);

        Ok(Self {
            app_token,
            bot_token,
            client,
            query,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            chat: ChatClient::from(self.clone()),
            query: self.query.clone(),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn post_message(&self, channel_id: &str, thread_ts: &str, text: &str) -> Res<String> {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message).with_thread_ts(SlackTs(thread_ts.to_string()));

        let session = self.client.open_session(&self.bot_token);

        let response = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(response.ts.0)
    }

    #[instrument(skip(self))]
    async fn update_message(&self, channel_id: &str, ts: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatUpdateRequest::new(SlackChannelId(channel_id.to_string()), message, SlackTs(ts.to_string()));

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_update(&request).await.map_err(|e| anyhow::anyhow!("Failed to update message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, channel_id: &str, ts: &str, emoji: &str) -> Void {
        let request = SlackApiReactionsAddRequest {
            channel: SlackChannelId(channel_id.to_string()),
            name: SlackReactionName(emoji.to_string()),
            timestamp: SlackTs(ts.to_string()),
        };

        let session = self.client.open_session(&self.bot_token);

        let _ = session.reactions_add(&request).await.map_err(|e| anyhow::anyhow!("Failed to react to message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self, content))]
    async fn upload_file(&self, channel_id: &str, thread_ts: &str, content: &str, filename: &str, title: &str) -> Void {
        let session = self.client.open_session(&self.bot_token);

        // Reserve an upload URL, push the bytes, then share the file into the thread.

        let upload = session
            .get_upload_url_external(&SlackApiFilesGetUploadUrlExternalRequest::new(filename.to_string(), content.len()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get upload URL: {}", e))?;

        session
            .files_upload_via_url(&SlackApiFilesUploadViaUrlRequest::new(
                upload.upload_url,
                content.as_bytes().to_vec(),
                content_type_for(filename).to_string(),
            ))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload file: {}", e))?;

        let file = SlackApiFilesComplete::new(upload.file_id).with_title(title.to_string());
        let request = SlackApiFilesCompleteUploadExternalRequest::new(vec![file])
            .with_channel_id(SlackChannelId(channel_id.to_string()))
            .with_thread_ts(SlackTs(thread_ts.to_string()));

        let _ = session
            .files_complete_upload_external(&request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to complete file upload: {}", e))?;

        Ok(())
    }
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let event = event_callback.event;
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let inbound = match event {
        SlackEventCallbackBody::AppMention(slack_app_mention_event) => {
            info!("Received app mention event ...");
            mention_to_inbound(&slack_app_mention_event)
        }
        SlackEventCallbackBody::Message(slack_message_event) => {
            info!("Received message event ...");

            let Some(inbound) = message_to_inbound(&slack_message_event) else {
                warn!("Skipping message event without a channel.");
                return Ok(());
            };

            inbound
        }
        _ => {
            debug!("Received unhandled push event.");
            return Ok(());
        }
    };

    interaction::chat_event::handle_chat_event(inbound, user_state.chat.clone(), user_state.query.clone());

    Ok(())
}

// Conversions.

/// Reduce an `app_mention` event to what the relay needs.
fn mention_to_inbound(event: &SlackAppMentionEvent) -> InboundEvent {
    InboundEvent {
        kind: EventKind::Mention,
        text: event.content.text.clone().unwrap_or_default(),
        channel_id: event.channel.0.clone(),
        ts: event.origin.ts.0.clone(),
        thread_ts: event.origin.thread_ts.as_ref().map(|ts| ts.0.clone()),
        bot_id: None,
        subtype: None,
    }
}

/// Reduce a `message` event to what the relay needs; `None` if it has no channel.
fn message_to_inbound(event: &SlackMessageEvent) -> Option<InboundEvent> {
    let channel_id = event.origin.channel.as_ref()?.0.clone();

    Some(InboundEvent {
        kind: EventKind::Message,
        text: event.content.as_ref().and_then(|c| c.text.clone()).unwrap_or_default(),
        channel_id,
        ts: event.origin.ts.0.clone(),
        thread_ts: event.origin.thread_ts.as_ref().map(|ts| ts.0.clone()),
        bot_id: event.sender.bot_id.as_ref().map(|id| id.0.clone()),
        subtype: event.subtype.as_ref().map(wire_name),
    })
}

/// The name a value has on the wire, e.g. `message_changed`.
fn wire_name<T: Serialize + std::fmt::Debug>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => format!("{value:?}"),
    }
}

/// MIME type for an uploaded text file.
fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".csv") { "text/csv" } else { "text/plain" }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_mention_in_channel() {
        let event: SlackAppMentionEvent = serde_json::from_value(json!({
            "type": "app_mention",
            "user": "U54321",
            "text": "<@U12345> list users",
            "ts": "1700000000.000100",
            "channel": "C01TEST",
            "event_ts": "1700000000.000100",
        }))
        .unwrap();

        let inbound = mention_to_inbound(&event);

        assert_eq!(inbound.kind, EventKind::Mention);
        assert_eq!(inbound.text, "<@U12345> list users");
        assert_eq!(inbound.channel_id, "C01TEST");
        assert_eq!(inbound.thread_root(), "1700000000.000100");
    }

    #[test]
    fn converts_mention_in_thread() {
        let event: SlackAppMentionEvent = serde_json::from_value(json!({
            "user": "U54321",
            "text": "<@U12345> again",
            "ts": "1700000000.000200",
            "thread_ts": "1700000000.000100",
            "channel": "C01TEST",
        }))
        .unwrap();

        let inbound = mention_to_inbound(&event);

        assert_eq!(inbound.thread_ts.as_deref(), Some("1700000000.000100"));
        assert_eq!(inbound.thread_root(), "1700000000.000100");
    }

    #[test]
    fn converts_plain_message() {
        let event: SlackMessageEvent = serde_json::from_value(json!({
            "user": "U54321",
            "text": "how many orders today",
            "ts": "1700000000.000300",
            "channel": "C01TEST",
            "channel_type": "channel",
        }))
        .unwrap();

        let inbound = message_to_inbound(&event).unwrap();

        assert_eq!(inbound.kind, EventKind::Message);
        assert_eq!(inbound.text, "how many orders today");
        assert!(inbound.bot_id.is_none());
        assert!(inbound.subtype.is_none());
    }

    #[test]
    fn carries_bot_marker() {
        let event: SlackMessageEvent = serde_json::from_value(json!({
            "bot_id": "B999",
            "text": "Working on: _x_",
            "ts": "1700000000.000400",
            "channel": "C01TEST",
        }))
        .unwrap();

        let inbound = message_to_inbound(&event).unwrap();

        assert_eq!(inbound.bot_id.as_deref(), Some("B999"));
    }

    #[test]
    fn carries_subtype_marker() {
        let event: SlackMessageEvent = serde_json::from_value(json!({
            "subtype": "channel_join",
            "user": "U54321",
            "text": "<@U54321> has joined the channel",
            "ts": "1700000000.000500",
            "channel": "C01TEST",
        }))
        .unwrap();

        let inbound = message_to_inbound(&event).unwrap();

        assert_eq!(inbound.subtype.as_deref(), Some("channel_join"));
    }

    #[test]
    fn picks_content_type_from_filename() {
        assert_eq!(content_type_for("results.csv"), "text/csv");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
    }
}
