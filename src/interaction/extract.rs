//! Prompt extraction from inbound chat events.

use std::sync::LazyLock;

use regex::Regex;

use crate::base::types::{EventKind, Extraction, InboundEvent};

/// A user mention token plus any whitespace after it.
static MENTION_WITH_TRAILING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@[A-Z0-9]+>\s*").expect("valid mention pattern"));

/// A bare user mention token.
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<@[A-Z0-9]+>").expect("valid mention pattern"));

/// Decide what, if anything, the relay should do with an event.
///
/// Mentions always get an answer: a prompt, or a request to clarify. Plain
/// messages are skipped silently when they come from a bot, carry a subtype,
/// or contain a mention (the mention path owns those).
pub fn extract_prompt(event: &InboundEvent) -> Extraction {
    match event.kind {
        EventKind::Mention => {
            let prompt = MENTION_WITH_TRAILING_SPACE.replace_all(&event.text, "");
            let prompt = prompt.trim();

            if prompt.is_empty() { Extraction::Clarify } else { Extraction::Prompt(prompt.to_string()) }
        }
        EventKind::Message => {
            if event.bot_id.is_some() || event.subtype.is_some() || MENTION.is_match(&event.text) {
                return Extraction::Skip;
            }

            let prompt = event.text.trim();

            if prompt.is_empty() { Extraction::Skip } else { Extraction::Prompt(prompt.to_string()) }
        }
    }
}
