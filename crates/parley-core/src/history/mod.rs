//! History Module
//!
//! Bounded records of what the engine has done:
//! - Context memory: per-user rolling window of matched exchanges
//! - Event log: audit trail of learn/recall events (never read by matching)

mod context;
mod events;

pub use context::{ContextEntry, ContextMemory, DEFAULT_CONTEXT_WINDOW};
pub use events::{Event, EventKind, EventLog, DEFAULT_EVENT_LOG_CAPACITY};

/// Default number of characters kept from questions/responses in summaries
pub const DEFAULT_PREFIX_CHARS: usize = 50;

/// First `max_chars` characters of `text`, never splitting a character
pub fn prefix(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
