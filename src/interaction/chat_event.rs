//! Relays a chat event to the query backend and renders the answer into the thread.

use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::{
    base::{
        messages,
        types::{Extraction, InboundEvent, Void},
    },
    interaction::extract::extract_prompt,
    service::{chat::ChatClient, query::QueryClient},
};

/// Handles an inbound chat event.
///
/// Spawns a new task so the listener can keep dispatching; errors are logged
/// and end only this event's handling.
#[instrument(skip_all)]
pub fn handle_chat_event(event: InboundEvent, chat: ChatClient, query: QueryClient) {
    tokio::spawn(async move {
        // Process the event.
        let result = process_chat_event(event, &chat, &query).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling: {}", err);
        }
    });
}

/// Processes one event to completion.
///
/// Acknowledge, post a placeholder, run the query, overwrite the placeholder
/// with the summary, then upload the CSV if there is one. A mention with no
/// prompt is acknowledged and answered with a request to clarify.
#[instrument(skip_all, fields(channel = %event.channel_id, ts = %event.ts))]
pub async fn process_chat_event(event: InboundEvent, chat: &ChatClient, query: &QueryClient) -> Void {
    let thread_ts = event.thread_root();

    let extraction = extract_prompt(&event);

    if extraction == Extraction::Skip {
        debug!("Skipping event.");
        return Ok(());
    }

    // Acknowledge the request.

    best_effort("reaction", chat.react_to_message(&event.channel_id, &event.ts, messages::ACK_REACTION)).await;

    let Extraction::Prompt(prompt) = extraction else {
        info!("Mention without a prompt; asking for clarification ...");
        chat.post_message(&event.channel_id, thread_ts, messages::CLARIFICATION).await?;
        return Ok(());
    };

    let placeholder_ts = chat.post_message(&event.channel_id, thread_ts, &messages::working_on(&prompt)).await?;

    // Run the query.

    info!("Running query ...");
    let response = query.execute(&prompt).await;

    // Render the result.

    chat.update_message(&event.channel_id, &placeholder_ts, &messages::rendered(&prompt, &response.summary)).await?;

    if let Some(csv) = &response.csv {
        info!("Uploading results ...");
        chat.upload_file(&event.channel_id, thread_ts, csv, messages::ARTIFACT_FILENAME, messages::ARTIFACT_TITLE).await?;
    }

    Ok(())
}

/// Runs an action whose failure does not matter, logging and discarding any error.
pub async fn best_effort(action: &str, fut: impl Future<Output = Void>) {
    if let Err(err) = fut.await {
        warn!("Best-effort {} failed: {}", action, err);
    }
}
