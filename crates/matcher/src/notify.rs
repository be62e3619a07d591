//! Notification sink: informed once per event that produced matches.

use tracing::info;

use crate::types::MatchResult;

pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Sink that writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str) {
        info!(notification = message, "match_notification");
    }
}

impl<F> NotificationSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Human-readable summary of a non-empty result: which items, by name,
/// and when each was last updated.
pub fn format_notification(result: &MatchResult) -> String {
    let noun = if result.len() == 1 { "note" } else { "notes" };
    let listed: Vec<String> = result
        .hits
        .iter()
        .map(|hit| {
            let label = if hit.item.name.trim().is_empty() {
                hit.item.id.as_str()
            } else {
                hit.item.name.as_str()
            };
            format!(
                "\"{label}\" (updated {})",
                hit.item.updated_at.format("%Y-%m-%d %H:%M UTC")
            )
        })
        .collect();
    format!(
        "{} {noun} matched this event: {}",
        result.len(),
        listed.join(", ")
    )
}
