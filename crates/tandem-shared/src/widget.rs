//! Cross-process widget projection shapes.
//!
//! The main app process owns these; the home-screen widget process reads
//! them. Three producers write the summary: pairing changes, new letters,
//! and new shared tracks, each touching only its own fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The newest partner-sent letter, reduced for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetLetter {
    pub content: String,
    pub sender_name: String,
    pub date: DateTime<Utc>,
}

/// The newest partner-shared track, reduced for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetTrack {
    pub track_name: String,
    pub artist_name: String,
    pub sender_name: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// The full widget surface payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WidgetSummary {
    pub heart_name: String,
    pub partner_name: String,
    pub is_paired: bool,
    pub latest_letter: Option<WidgetLetter>,
    pub latest_track: Option<WidgetTrack>,
    pub last_updated: DateTime<Utc>,
}

impl WidgetSummary {
    /// An empty summary for a device that has never paired.
    pub fn empty() -> Self {
        Self {
            heart_name: String::new(),
            partner_name: String::new(),
            is_paired: false,
            latest_letter: None,
            latest_track: None,
            last_updated: Utc::now(),
        }
    }

    /// Whether the summary is older than `max_age_secs` as of `now`.
    ///
    /// The widget renderer uses this against the ~15 minute timeline cadence
    /// to decide whether to show a refresh hint.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age_secs: i64) -> bool {
        (now - self.last_updated).num_seconds() > max_age_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_staleness() {
        let summary = WidgetSummary::empty();
        let now = summary.last_updated;

        assert!(!summary.is_stale(now, 900));
        assert!(!summary.is_stale(now + Duration::seconds(900), 900));
        assert!(summary.is_stale(now + Duration::seconds(901), 900));
    }
}
