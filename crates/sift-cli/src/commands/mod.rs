//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `classify` - Suggestion, pending queue, decision, and improve commands
//! - `autotag` - Bulk auto-tag command
//! - `rules` - Rule catalog commands
//! - `serve` - Web server command
//! - `transactions` - Transaction commands (add, list)

pub mod autotag;
pub mod classify;
pub mod core;
pub mod rules;
pub mod serve;
pub mod transactions;

// Re-export command functions for main.rs
pub use autotag::*;
pub use classify::*;
pub use core::*;
pub use rules::*;
pub use serve::*;
pub use transactions::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}

/// Split a comma-separated tag argument into trimmed, non-empty tags
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
