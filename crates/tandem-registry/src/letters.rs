//! Letters exchanged between the two partners.

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use tandem_shared::{HeartCode, Letter, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    /// Write a letter into the heart's feed. Timestamp is registry-assigned.
    pub async fn send_letter(
        &self,
        code: &HeartCode,
        sender_id: &UserId,
        sender_name: &str,
        content: &str,
    ) -> Result<Letter> {
        if sender_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }
        self.ensure_paired(code).await?;

        let letter = Letter {
            id: Uuid::new_v4(),
            heart_code: code.clone(),
            sender_id: sender_id.clone(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            read: false,
        };

        self.store().add_letter(letter.clone()).await?;
        info!(code = %code, letter = %letter.id, "letter sent");
        Ok(letter)
    }

    /// All letters for a heart, newest first.
    pub async fn letters_for(&self, code: &HeartCode) -> Result<Vec<Letter>> {
        self.store().letters_for(code).await
    }

    pub async fn watch_letters(&self, code: &HeartCode) -> Result<watch::Receiver<Vec<Letter>>> {
        self.store().watch_letters(code).await
    }

    pub async fn mark_letter_read(&self, code: &HeartCode, letter_id: Uuid) -> Result<()> {
        self.store().mark_letter_read(code, letter_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn paired_heart(registry: &HeartRegistry<MemoryStore>) -> (HeartCode, UserId, UserId) {
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
        (code, alex, sam)
    }

    #[tokio::test]
    async fn test_send_and_list() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let (code, alex, sam) = paired_heart(&registry).await;

        registry
            .send_letter(&code, &alex, "Alex", "miss you")
            .await
            .unwrap();
        registry
            .send_letter(&code, &sam, "Sam", "miss you too")
            .await
            .unwrap();

        let letters = registry.letters_for(&code).await.unwrap();
        assert_eq!(letters.len(), 2);
        assert!(letters.iter().all(|l| !l.read));
        assert!(letters[0].created_at >= letters[1].created_at);
    }

    #[tokio::test]
    async fn test_send_into_unpaired_heart_rejected() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let alex = UserId::from("alex-id");
        registry
            .register_account(&alex, "Alex", "alex@example.com")
            .await
            .unwrap();
        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();

        let result = registry.send_letter(&code, &alex, "Alex", "early").await;
        assert!(matches!(result, Err(RegistryError::WriteFailure(_))));
    }

    #[tokio::test]
    async fn test_watch_letters_sees_new_letter() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let (code, alex, _) = paired_heart(&registry).await;

        let mut rx = registry.watch_letters(&code).await.unwrap();
        assert!(rx.borrow().is_empty());

        registry
            .send_letter(&code, &alex, "Alex", "hello")
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
