//! The injectable document-store seam.
//!
//! [`RegistryStore`] models the hosted database the app talks to: document
//! CRUD, one compare-and-set transaction primitive keyed by invite code, and
//! per-key watch streams. Watch streams are `tokio::sync::watch` receivers:
//! the current value is readable immediately on subscribe, every committed
//! change wakes the receiver, delivery is at-least-once, and a receiver for
//! a single key never observes a state older than one it already observed.
//! Dropping the receiver cancels the subscription.

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

use tandem_shared::{
    CheckIn, HeartCode, HeartRecord, HeartRole, Letter, MusicTrack, QuestionAnswer, UserAccount,
    UserId,
};

use crate::error::Result;

pub trait RegistryStore: Send + Sync + 'static {
    // ------------------------------------------------------------------
    // Hearts
    // ------------------------------------------------------------------

    /// Insert a new heart record unless its code is already claimed.
    ///
    /// Returns `false` (without touching the existing record) on collision.
    fn insert_heart_if_absent(
        &self,
        record: HeartRecord,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn get_heart(&self, code: &HeartCode) -> impl Future<Output = Result<HeartRecord>> + Send;

    /// Atomic read-modify-write of a single heart record.
    ///
    /// `apply` receives the current record (`None` if the code is unknown)
    /// and either returns the record to commit or an error, in which case
    /// nothing is written. The store must serialize concurrent transactions
    /// on the same code: of two simultaneous joiners, exactly one observes
    /// the pre-commit state.
    fn transact_heart<F>(
        &self,
        code: &HeartCode,
        apply: F,
    ) -> impl Future<Output = Result<HeartRecord>> + Send
    where
        F: FnOnce(Option<HeartRecord>) -> Result<HeartRecord> + Send;

    /// Overwrite the heart's display name.
    fn update_heart_name(
        &self,
        code: &HeartCode,
        name: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Live snapshot stream for one heart.
    fn watch_heart(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<watch::Receiver<HeartRecord>>> + Send;

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    fn put_account(&self, account: UserAccount) -> impl Future<Output = Result<()>> + Send;

    fn get_account(&self, id: &UserId) -> impl Future<Output = Result<UserAccount>> + Send;

    /// Set or clear the account's heart linkage.
    fn set_account_pairing(
        &self,
        id: &UserId,
        pairing: Option<(HeartCode, HeartRole)>,
    ) -> impl Future<Output = Result<()>> + Send;

    // ------------------------------------------------------------------
    // Content collections (scoped by heart code, newest first)
    // ------------------------------------------------------------------

    fn add_letter(&self, letter: Letter) -> impl Future<Output = Result<()>> + Send;

    fn letters_for(&self, code: &HeartCode) -> impl Future<Output = Result<Vec<Letter>>> + Send;

    fn watch_letters(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<watch::Receiver<Vec<Letter>>>> + Send;

    fn mark_letter_read(
        &self,
        code: &HeartCode,
        letter_id: Uuid,
    ) -> impl Future<Output = Result<()>> + Send;

    fn add_check_in(&self, check_in: CheckIn) -> impl Future<Output = Result<()>> + Send;

    fn check_ins_for(&self, code: &HeartCode)
        -> impl Future<Output = Result<Vec<CheckIn>>> + Send;

    fn watch_check_ins(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<watch::Receiver<Vec<CheckIn>>>> + Send;

    fn add_answer(&self, answer: QuestionAnswer) -> impl Future<Output = Result<()>> + Send;

    fn answers_for(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<Vec<QuestionAnswer>>> + Send;

    fn watch_answers(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<watch::Receiver<Vec<QuestionAnswer>>>> + Send;

    fn add_track(&self, track: MusicTrack) -> impl Future<Output = Result<()>> + Send;

    fn tracks_for(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<Vec<MusicTrack>>> + Send;

    fn watch_tracks(
        &self,
        code: &HeartCode,
    ) -> impl Future<Output = Result<watch::Receiver<Vec<MusicTrack>>>> + Send;
}
