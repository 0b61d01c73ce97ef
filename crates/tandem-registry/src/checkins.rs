//! Daily mood check-ins.

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use tandem_shared::constants::CHECK_IN_HISTORY_LIMIT;
use tandem_shared::{CheckIn, HeartCode, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    pub async fn submit_check_in(
        &self,
        code: &HeartCode,
        user_id: &UserId,
        user_name: &str,
        mood: &str,
        note: &str,
    ) -> Result<CheckIn> {
        if user_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }
        self.ensure_paired(code).await?;

        let check_in = CheckIn {
            id: Uuid::new_v4(),
            heart_code: code.clone(),
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            mood: mood.to_string(),
            note: note.to_string(),
            created_at: Utc::now(),
        };

        self.store().add_check_in(check_in.clone()).await?;
        info!(code = %code, user = %user_id, "check-in submitted");
        Ok(check_in)
    }

    /// The most recent check-ins, newest first, capped at the display window.
    pub async fn check_ins_for(&self, code: &HeartCode) -> Result<Vec<CheckIn>> {
        let mut check_ins = self.store().check_ins_for(code).await?;
        check_ins.truncate(CHECK_IN_HISTORY_LIMIT);
        Ok(check_ins)
    }

    pub async fn watch_check_ins(
        &self,
        code: &HeartCode,
    ) -> Result<watch::Receiver<Vec<CheckIn>>> {
        self.store().watch_check_ins(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_history_capped_at_display_window() {
        let registry = HeartRegistry::new(MemoryStore::new());
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

        for i in 0..CHECK_IN_HISTORY_LIMIT + 5 {
            registry
                .submit_check_in(&code, &alex, "Alex", "😊", &format!("day {i}"))
                .await
                .unwrap();
        }

        let check_ins = registry.check_ins_for(&code).await.unwrap();
        assert_eq!(check_ins.len(), CHECK_IN_HISTORY_LIMIT);
    }
}
