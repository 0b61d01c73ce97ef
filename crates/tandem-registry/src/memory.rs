//! In-memory reference implementation of [`RegistryStore`].
//!
//! Backs the test suite and local single-process deployments. One
//! `tokio::sync::RwLock` guards the whole store; `transact_heart` holds the
//! write guard across its read-modify-write closure, which is what makes the
//! join transaction serializable. Live feeds are `watch` channels, one per
//! key, created lazily and kept alive for the lifetime of the store so late
//! subscribers still observe the current value.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use tandem_shared::{
    CheckIn, HeartCode, HeartRecord, HeartRole, Letter, MusicTrack, QuestionAnswer, UserAccount,
    UserId,
};

use crate::error::{RegistryError, Result};
use crate::store::RegistryStore;

#[derive(Default)]
struct Shared {
    hearts: HashMap<HeartCode, watch::Sender<HeartRecord>>,
    accounts: HashMap<UserId, UserAccount>,
    letters: HashMap<HeartCode, watch::Sender<Vec<Letter>>>,
    check_ins: HashMap<HeartCode, watch::Sender<Vec<CheckIn>>>,
    answers: HashMap<HeartCode, watch::Sender<Vec<QuestionAnswer>>>,
    tracks: HashMap<HeartCode, watch::Sender<Vec<MusicTrack>>>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Shared>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Content entries carry their creation timestamp; feeds are kept sorted
/// newest first on append.
trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

impl_timestamped!(Letter, CheckIn, QuestionAnswer, MusicTrack);

fn append_to_feed<T: Timestamped + Clone>(
    feeds: &mut HashMap<HeartCode, watch::Sender<Vec<T>>>,
    code: &HeartCode,
    item: T,
) {
    let tx = feeds
        .entry(code.clone())
        .or_insert_with(|| watch::channel(Vec::new()).0);

    let mut items = tx.borrow().clone();
    items.push(item);
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    tx.send_replace(items);
}

fn list_feed<T: Clone>(
    feeds: &HashMap<HeartCode, watch::Sender<Vec<T>>>,
    code: &HeartCode,
) -> Vec<T> {
    feeds
        .get(code)
        .map(|tx| tx.borrow().clone())
        .unwrap_or_default()
}

fn subscribe_feed<T: Clone>(
    feeds: &mut HashMap<HeartCode, watch::Sender<Vec<T>>>,
    code: &HeartCode,
) -> watch::Receiver<Vec<T>> {
    feeds
        .entry(code.clone())
        .or_insert_with(|| watch::channel(Vec::new()).0)
        .subscribe()
}

impl RegistryStore for MemoryStore {
    // ------------------------------------------------------------------
    // Hearts
    // ------------------------------------------------------------------

    async fn insert_heart_if_absent(&self, record: HeartRecord) -> Result<bool> {
        let mut shared = self.inner.write().await;

        if shared.hearts.contains_key(&record.code) {
            return Ok(false);
        }

        let code = record.code.clone();
        let (tx, _rx) = watch::channel(record);
        shared.hearts.insert(code, tx);
        Ok(true)
    }

    async fn get_heart(&self, code: &HeartCode) -> Result<HeartRecord> {
        let shared = self.inner.read().await;

        shared
            .hearts
            .get(code)
            .map(|tx| tx.borrow().clone())
            .ok_or(RegistryError::NotFound)
    }

    async fn transact_heart<F>(&self, code: &HeartCode, apply: F) -> Result<HeartRecord>
    where
        F: FnOnce(Option<HeartRecord>) -> Result<HeartRecord> + Send,
    {
        // Write guard held across the closure: concurrent transactions on
        // the same code observe each other's commits, never interleave.
        let shared = self.inner.write().await;

        let current = shared.hearts.get(code).map(|tx| tx.borrow().clone());
        let updated = apply(current)?;

        match shared.hearts.get(code) {
            Some(tx) => {
                tx.send_replace(updated.clone());
                Ok(updated)
            }
            // The closure produced a record for a code that was never
            // inserted; hearts are only created via insert_heart_if_absent.
            None => Err(RegistryError::NotFound),
        }
    }

    async fn update_heart_name(&self, code: &HeartCode, name: &str) -> Result<()> {
        let shared = self.inner.write().await;

        let tx = shared.hearts.get(code).ok_or(RegistryError::NotFound)?;
        let mut record = tx.borrow().clone();
        record.name = name.to_string();
        tx.send_replace(record);
        Ok(())
    }

    async fn watch_heart(&self, code: &HeartCode) -> Result<watch::Receiver<HeartRecord>> {
        let shared = self.inner.read().await;

        shared
            .hearts
            .get(code)
            .map(|tx| tx.subscribe())
            .ok_or(RegistryError::NotFound)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    async fn put_account(&self, account: UserAccount) -> Result<()> {
        let mut shared = self.inner.write().await;
        shared.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn get_account(&self, id: &UserId) -> Result<UserAccount> {
        let shared = self.inner.read().await;
        shared
            .accounts
            .get(id)
            .cloned()
            .ok_or(RegistryError::NotFound)
    }

    async fn set_account_pairing(
        &self,
        id: &UserId,
        pairing: Option<(HeartCode, HeartRole)>,
    ) -> Result<()> {
        let mut shared = self.inner.write().await;

        let account = shared.accounts.get_mut(id).ok_or(RegistryError::NotFound)?;
        match pairing {
            Some((code, role)) => {
                account.heart_code = Some(code);
                account.heart_role = Some(role);
            }
            None => {
                account.heart_code = None;
                account.heart_role = None;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Content collections
    // ------------------------------------------------------------------

    async fn add_letter(&self, letter: Letter) -> Result<()> {
        let mut shared = self.inner.write().await;
        let code = letter.heart_code.clone();
        append_to_feed(&mut shared.letters, &code, letter);
        Ok(())
    }

    async fn letters_for(&self, code: &HeartCode) -> Result<Vec<Letter>> {
        let shared = self.inner.read().await;
        Ok(list_feed(&shared.letters, code))
    }

    async fn watch_letters(&self, code: &HeartCode) -> Result<watch::Receiver<Vec<Letter>>> {
        let mut shared = self.inner.write().await;
        Ok(subscribe_feed(&mut shared.letters, code))
    }

    async fn mark_letter_read(&self, code: &HeartCode, letter_id: Uuid) -> Result<()> {
        let shared = self.inner.write().await;

        let tx = shared.letters.get(code).ok_or(RegistryError::NotFound)?;
        let mut items = tx.borrow().clone();
        let letter = items
            .iter_mut()
            .find(|l| l.id == letter_id)
            .ok_or(RegistryError::NotFound)?;
        letter.read = true;
        tx.send_replace(items);
        Ok(())
    }

    async fn add_check_in(&self, check_in: CheckIn) -> Result<()> {
        let mut shared = self.inner.write().await;
        let code = check_in.heart_code.clone();
        append_to_feed(&mut shared.check_ins, &code, check_in);
        Ok(())
    }

    async fn check_ins_for(&self, code: &HeartCode) -> Result<Vec<CheckIn>> {
        let shared = self.inner.read().await;
        Ok(list_feed(&shared.check_ins, code))
    }

    async fn watch_check_ins(&self, code: &HeartCode) -> Result<watch::Receiver<Vec<CheckIn>>> {
        let mut shared = self.inner.write().await;
        Ok(subscribe_feed(&mut shared.check_ins, code))
    }

    async fn add_answer(&self, answer: QuestionAnswer) -> Result<()> {
        let mut shared = self.inner.write().await;
        let code = answer.heart_code.clone();
        append_to_feed(&mut shared.answers, &code, answer);
        Ok(())
    }

    async fn answers_for(&self, code: &HeartCode) -> Result<Vec<QuestionAnswer>> {
        let shared = self.inner.read().await;
        Ok(list_feed(&shared.answers, code))
    }

    async fn watch_answers(
        &self,
        code: &HeartCode,
    ) -> Result<watch::Receiver<Vec<QuestionAnswer>>> {
        let mut shared = self.inner.write().await;
        Ok(subscribe_feed(&mut shared.answers, code))
    }

    async fn add_track(&self, track: MusicTrack) -> Result<()> {
        let mut shared = self.inner.write().await;
        let code = track.heart_code.clone();
        append_to_feed(&mut shared.tracks, &code, track);
        Ok(())
    }

    async fn tracks_for(&self, code: &HeartCode) -> Result<Vec<MusicTrack>> {
        let shared = self.inner.read().await;
        Ok(list_feed(&shared.tracks, code))
    }

    async fn watch_tracks(&self, code: &HeartCode) -> Result<watch::Receiver<Vec<MusicTrack>>> {
        let mut shared = self.inner.write().await;
        Ok(subscribe_feed(&mut shared.tracks, code))
    }
}
