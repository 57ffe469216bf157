//! Common types shared across the relay.

/// The error type used throughout the relay.
pub type Err = anyhow::Error;
/// A result carrying the relay's error type.
pub type Res<T> = Result<T, Err>;
/// A result with no value.
pub type Void = Res<()>;

/// The kind of inbound chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The bot was @-mentioned.
    Mention,
    /// A plain message was posted in a channel the bot is in.
    Message,
}

/// A chat event, reduced to what the relay needs.
///
/// Built by the chat binding, consumed once by the relay, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Whether this was a mention or a plain message.
    pub kind: EventKind,
    /// Raw message text, including any mention markup.
    pub text: String,
    /// Channel the event happened in.
    pub channel_id: String,
    /// Timestamp id of the originating message.
    pub ts: String,
    /// Thread the message was posted in, if any.
    pub thread_ts: Option<String>,
    /// Set when the message was posted by a bot (including this one).
    pub bot_id: Option<String>,
    /// Set for edits, deletes, joins, and other non-plain messages.
    pub subtype: Option<String>,
}

impl InboundEvent {
    /// The thread replies go to: the event's own thread, or a new one rooted at the event.
    pub fn thread_root(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

/// Outcome of prompt extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A non-empty prompt to send to the backend.
    Prompt(String),
    /// The user mentioned the bot without asking anything.
    Clarify,
    /// Nothing to do, and nothing to say.
    Skip,
}

/// Tabular result returned by the query backend.
///
/// Values are already in their default string form; `None` is a SQL `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Option<String>>>,
}

/// What the relay posts back: a summary line and, when there are rows, a CSV artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    /// One-line outcome shown in the thread.
    pub summary: String,
    /// CSV rendering of the rows, when there are any.
    pub csv: Option<String>,
}
