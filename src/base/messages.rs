//! User-facing text and fixed artifact metadata.

use std::fmt::Display;

/// Reply when the bot is mentioned with nothing after the mention.
pub const CLARIFICATION: &str = "Please include a question or query after mentioning me.";

/// Summary when the backend returns no rows.
pub const NO_RESULTS: &str = "_No results_";

/// Reaction used to acknowledge an event.
pub const ACK_REACTION: &str = "eyes";

/// Filename of the uploaded CSV artifact.
pub const ARTIFACT_FILENAME: &str = "results.csv";

/// Title of the uploaded CSV artifact.
pub const ARTIFACT_TITLE: &str = "Query Results";

/// Placeholder posted while the backend works.
pub fn working_on(prompt: &str) -> String {
    format!("Working on: _{prompt}_")
}

/// Final text the placeholder is overwritten with.
pub fn rendered(prompt: &str, summary: &str) -> String {
    format!("*Query:* _{prompt}_\n\n{summary}")
}

/// Summary for a non-empty result.
pub fn row_summary(rows: usize, columns: usize) -> String {
    format!("Returned {rows} row(s), {columns} column(s)")
}

/// Summary for a failed query.
pub fn error_summary(err: impl Display) -> String {
    format!("*Error:* `{err:#}`")
}
