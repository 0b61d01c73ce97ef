//! Live content feeds for a bound heart.
//!
//! Each feed wraps a registry watch stream. The letter and track feeds
//! additionally project the newest *partner-sent* item into the widget
//! summary from a background task; check-ins and question answers only
//! expose display queries. Dropping a feed cancels its task and its
//! subscription.

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use tandem_registry::{HeartRegistry, RegistryError, RegistryStore};
use tandem_shared::constants::CHECK_IN_HISTORY_LIMIT;
use tandem_shared::{
    CheckIn, HeartCode, Letter, MusicTrack, QuestionAnswer, UserId, WidgetLetter, WidgetTrack,
};
use tandem_store::WidgetStore;

// ---------------------------------------------------------------------------
// Pure selection helpers
// ---------------------------------------------------------------------------

/// The newest letter not sent by `viewer`. Input is newest first.
pub fn latest_partner_letter<'a>(letters: &'a [Letter], viewer: &UserId) -> Option<&'a Letter> {
    letters.iter().find(|l| &l.sender_id != viewer)
}

/// The newest track not shared by `viewer`. Input is newest first.
pub fn latest_partner_track<'a>(tracks: &'a [MusicTrack], viewer: &UserId) -> Option<&'a MusicTrack> {
    tracks.iter().find(|t| &t.user_id != viewer)
}

/// `viewer`'s check-in from the same UTC day as `now`, if any.
pub fn today_check_in<'a>(
    check_ins: &'a [CheckIn],
    viewer: &UserId,
    now: DateTime<Utc>,
) -> Option<&'a CheckIn> {
    check_ins
        .iter()
        .find(|c| &c.user_id == viewer && c.created_at.date_naive() == now.date_naive())
}

/// All answers to one prompt, newest first.
pub fn answers_for_question<'a>(
    answers: &'a [QuestionAnswer],
    question_id: &str,
) -> Vec<&'a QuestionAnswer> {
    answers
        .iter()
        .filter(|a| a.question_id == question_id)
        .collect()
}

/// Whether `viewer` already answered the prompt.
pub fn has_user_answered(answers: &[QuestionAnswer], question_id: &str, viewer: &UserId) -> bool {
    answers
        .iter()
        .any(|a| a.question_id == question_id && &a.user_id == viewer)
}

// ---------------------------------------------------------------------------
// Letter feed
// ---------------------------------------------------------------------------

/// Live letter list plus widget projection of the latest partner letter.
pub struct LetterFeed {
    rx: watch::Receiver<Vec<Letter>>,
    task: JoinHandle<()>,
}

impl LetterFeed {
    pub async fn open<S: RegistryStore>(
        registry: &HeartRegistry<S>,
        code: &HeartCode,
        viewer: UserId,
        widget: WidgetStore,
    ) -> Result<Self, RegistryError> {
        let rx = registry.watch_letters(code).await?;

        let mut task_rx = rx.clone();
        let task = tokio::spawn(async move {
            loop {
                let letters = task_rx.borrow_and_update().clone();
                if let Some(letter) = latest_partner_letter(&letters, &viewer) {
                    let projected = WidgetLetter {
                        content: letter.content.clone(),
                        sender_name: letter.sender_name.clone(),
                        date: letter.created_at,
                    };
                    if let Err(e) = widget.update_latest_letter(projected) {
                        warn!(error = %e, "failed to project letter into widget summary");
                    }
                }

                if task_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Ok(Self { rx, task })
    }

    /// Current letters, newest first.
    pub fn letters(&self) -> Vec<Letter> {
        self.rx.borrow().clone()
    }

    /// Wait for the next update. `false` once the feed has closed.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for LetterFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Track feed
// ---------------------------------------------------------------------------

/// Live track list plus widget projection of the latest partner track.
pub struct TrackFeed {
    rx: watch::Receiver<Vec<MusicTrack>>,
    task: JoinHandle<()>,
}

impl TrackFeed {
    pub async fn open<S: RegistryStore>(
        registry: &HeartRegistry<S>,
        code: &HeartCode,
        viewer: UserId,
        widget: WidgetStore,
    ) -> Result<Self, RegistryError> {
        let rx = registry.watch_tracks(code).await?;

        let mut task_rx = rx.clone();
        let task = tokio::spawn(async move {
            loop {
                let tracks = task_rx.borrow_and_update().clone();
                if let Some(track) = latest_partner_track(&tracks, &viewer) {
                    let projected = WidgetTrack {
                        track_name: track.track_name.clone(),
                        artist_name: track.artist_name.clone(),
                        sender_name: track.user_name.clone(),
                        message: track.message.clone(),
                        date: track.created_at,
                    };
                    if let Err(e) = widget.update_latest_track(projected) {
                        warn!(error = %e, "failed to project track into widget summary");
                    }
                }

                if task_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Ok(Self { rx, task })
    }

    /// Current tracks, newest first.
    pub fn tracks(&self) -> Vec<MusicTrack> {
        self.rx.borrow().clone()
    }

    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

impl Drop for TrackFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// Check-in feed
// ---------------------------------------------------------------------------

pub struct CheckInFeed {
    rx: watch::Receiver<Vec<CheckIn>>,
}

impl CheckInFeed {
    pub async fn open<S: RegistryStore>(
        registry: &HeartRegistry<S>,
        code: &HeartCode,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            rx: registry.watch_check_ins(code).await?,
        })
    }

    /// The display window: most recent check-ins, newest first.
    pub fn recent(&self) -> Vec<CheckIn> {
        let mut check_ins = self.rx.borrow().clone();
        check_ins.truncate(CHECK_IN_HISTORY_LIMIT);
        check_ins
    }

    pub fn today_for(&self, viewer: &UserId, now: DateTime<Utc>) -> Option<CheckIn> {
        today_check_in(&self.rx.borrow(), viewer, now).cloned()
    }

    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Question answer feed
// ---------------------------------------------------------------------------

pub struct AnswerFeed {
    rx: watch::Receiver<Vec<QuestionAnswer>>,
}

impl AnswerFeed {
    pub async fn open<S: RegistryStore>(
        registry: &HeartRegistry<S>,
        code: &HeartCode,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            rx: registry.watch_answers(code).await?,
        })
    }

    pub fn answers(&self) -> Vec<QuestionAnswer> {
        self.rx.borrow().clone()
    }

    pub fn for_question(&self, question_id: &str) -> Vec<QuestionAnswer> {
        answers_for_question(&self.rx.borrow(), question_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn has_answered(&self, question_id: &str, viewer: &UserId) -> bool {
        has_user_answered(&self.rx.borrow(), question_id, viewer)
    }

    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    use tandem_registry::MemoryStore;

    fn letter(sender: &str, content: &str, offset_secs: i64) -> Letter {
        Letter {
            id: Uuid::new_v4(),
            heart_code: HeartCode::parse("A1B2C3").unwrap(),
            sender_id: UserId::from(sender),
            sender_name: sender.to_string(),
            content: content.to_string(),
            created_at: Utc::now() + chrono::Duration::seconds(offset_secs),
            read: false,
        }
    }

    #[test]
    fn test_latest_partner_letter_skips_own() {
        let viewer = UserId::from("alex-id");
        let letters = vec![
            letter("alex-id", "mine, newest", 2),
            letter("sam-id", "theirs", 1),
            letter("sam-id", "theirs, older", 0),
        ];

        let latest = latest_partner_letter(&letters, &viewer).unwrap();
        assert_eq!(latest.content, "theirs");
    }

    #[test]
    fn test_latest_partner_letter_none_when_only_own() {
        let viewer = UserId::from("alex-id");
        let letters = vec![letter("alex-id", "mine", 0)];
        assert!(latest_partner_letter(&letters, &viewer).is_none());
    }

    #[test]
    fn test_today_check_in_matches_day_and_user() {
        let now = Utc::now();
        let viewer = UserId::from("alex-id");

        let today = CheckIn {
            id: Uuid::new_v4(),
            heart_code: HeartCode::parse("A1B2C3").unwrap(),
            user_id: viewer.clone(),
            user_name: "Alex".to_string(),
            mood: "😊".to_string(),
            note: String::new(),
            created_at: now,
        };
        let mut yesterday = today.clone();
        yesterday.id = Uuid::new_v4();
        yesterday.created_at = now - chrono::Duration::days(1);
        let mut partner_today = today.clone();
        partner_today.id = Uuid::new_v4();
        partner_today.user_id = UserId::from("sam-id");

        let check_ins = vec![today.clone(), yesterday, partner_today];
        let found = today_check_in(&check_ins, &viewer, now).unwrap();
        assert_eq!(found.id, today.id);

        assert!(today_check_in(&check_ins, &viewer, now + chrono::Duration::days(2)).is_none());
    }

    #[test]
    fn test_answer_queries() {
        let viewer = UserId::from("alex-id");
        let answer = |user: &str, question_id: &str| QuestionAnswer {
            id: Uuid::new_v4(),
            heart_code: HeartCode::parse("A1B2C3").unwrap(),
            question_id: question_id.to_string(),
            question: "q".to_string(),
            user_id: UserId::from(user),
            user_name: user.to_string(),
            answer: "a".to_string(),
            created_at: Utc::now(),
        };

        let answers = vec![
            answer("alex-id", "1"),
            answer("sam-id", "1"),
            answer("sam-id", "2"),
        ];

        assert_eq!(answers_for_question(&answers, "1").len(), 2);
        assert!(has_user_answered(&answers, "1", &viewer));
        assert!(!has_user_answered(&answers, "2", &viewer));
    }

    #[tokio::test]
    async fn test_letter_feed_projects_partner_letter_into_widget() {
        let registry = Arc::new(HeartRegistry::new(MemoryStore::new()));
        let alex = UserId::from("alex-id");
        let sam = UserId::from("sam-id");
        registry
            .register_account(&alex, "Alex", "alex@example.com")
            .await
            .unwrap();
        registry
            .register_account(&sam, "Sam", "sam@example.com")
            .await
            .unwrap();
        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();
        registry.join_heart(&code, &sam, "Sam").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let widget = WidgetStore::at_path(dir.path().join("widget.json"));
        widget.update_pairing("Us", "Sam", true).unwrap();

        let _feed = LetterFeed::open(&registry, &code, alex.clone(), widget.clone())
            .await
            .unwrap();

        // Alex's own letter must never reach Alex's widget.
        registry
            .send_letter(&code, &alex, "Alex", "from me")
            .await
            .unwrap();
        registry
            .send_letter(&code, &sam, "Sam", "from Sam")
            .await
            .unwrap();

        // The projection task runs asynchronously; poll briefly.
        let mut projected = None;
        for _ in 0..100 {
            if let Some(summary) = widget.load().unwrap() {
                if let Some(letter) = summary.latest_letter {
                    projected = Some(letter);
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let letter = projected.expect("partner letter should be projected");
        assert_eq!(letter.sender_name, "Sam");
        assert_eq!(letter.content, "from Sam");
    }
}
