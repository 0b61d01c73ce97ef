//! Domain model structs shared between the registry, the session layer, and
//! the HTTP API.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can cross the
//! process boundary to the widget surface and the REST facade unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::HeartCode;
use crate::types::{HeartRole, UserId};

// ---------------------------------------------------------------------------
// Heart
// ---------------------------------------------------------------------------

/// The shared pairing unit between two accounts, keyed by its invite code.
///
/// `is_paired` transitions false -> true exactly once, atomically with the
/// partner fields and `paired_at`. The code never changes and is never
/// reassigned, even after one side unpairs locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartRecord {
    /// Invite code, globally unique across the registry.
    pub code: HeartCode,
    /// Display name chosen by the creator; the creator may rename it later.
    pub name: String,
    /// Account that created the heart.
    pub creator_id: UserId,
    pub creator_name: String,
    /// Account that joined; empty until the join transaction commits.
    pub partner_id: UserId,
    pub partner_name: String,
    pub is_paired: bool,
    pub created_at: DateTime<Utc>,
    /// Set once, by the join transaction.
    pub paired_at: Option<DateTime<Utc>>,
}

impl HeartRecord {
    /// A fresh, unpaired heart.
    pub fn new(
        code: HeartCode,
        name: impl Into<String>,
        creator_id: UserId,
        creator_name: impl Into<String>,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            creator_id,
            creator_name: creator_name.into(),
            partner_id: UserId::new(""),
            partner_name: String::new(),
            is_paired: false,
            created_at: Utc::now(),
            paired_at: None,
        }
    }

    /// The display name of the counterpart, from one member's point of view.
    pub fn counterpart_name(&self, is_creator: bool) -> &str {
        if is_creator {
            &self.partner_name
        } else {
            &self.creator_name
        }
    }
}

/// Reduced heart view returned to a successful joiner and by the watch feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartSnapshot {
    pub code: HeartCode,
    pub name: String,
    pub creator_name: String,
    pub partner_name: String,
    pub is_paired: bool,
}

impl From<&HeartRecord> for HeartSnapshot {
    fn from(record: &HeartRecord) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            creator_name: record.creator_name.clone(),
            partner_name: record.partner_name.clone(),
            is_paired: record.is_paired,
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A registered account as the registry sees it.
///
/// A set `heart_code` implies the referenced heart exists and lists this
/// account in the slot named by `heart_role`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub heart_code: Option<HeartCode>,
    pub heart_role: Option<HeartRole>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            heart_code: None,
            heart_role: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pairing session snapshot (local, per device)
// ---------------------------------------------------------------------------

/// The locally persisted pairing projection.
///
/// `needs_repairing` distinguishes "was paired, user explicitly unpaired"
/// from "never paired" while `heart_code` is unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairingSnapshot {
    pub current_user_name: String,
    pub partner_name: String,
    pub heart_name: String,
    pub heart_code: Option<HeartCode>,
    pub is_paired: bool,
    pub is_creator: bool,
    pub needs_repairing: bool,
}

// ---------------------------------------------------------------------------
// Content entities
// ---------------------------------------------------------------------------

/// A letter from one partner to the other. Immutable after creation except
/// for the read flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Letter {
    pub id: Uuid,
    pub heart_code: HeartCode,
    pub sender_id: UserId,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// A daily mood check-in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckIn {
    pub id: Uuid,
    pub heart_code: HeartCode,
    pub user_id: UserId,
    pub user_name: String,
    /// One of [`crate::prompts::MOOD_OPTIONS`].
    pub mood: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// An answer to one of the fixed relationship prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionAnswer {
    pub id: Uuid,
    pub heart_code: HeartCode,
    pub question_id: String,
    pub question: String,
    pub user_id: UserId,
    pub user_name: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// A music recommendation shared with the partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MusicTrack {
    pub id: Uuid,
    pub heart_code: HeartCode,
    pub user_id: UserId,
    pub user_name: String,
    pub track_name: String,
    pub artist_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
