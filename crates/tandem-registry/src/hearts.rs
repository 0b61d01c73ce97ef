//! Heart lifecycle: create, join (the one consistency-sensitive claim),
//! fetch, rename, and live watch.

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use tandem_shared::constants::MAX_CODE_ATTEMPTS;
use tandem_shared::{HeartCode, HeartRecord, HeartRole, HeartSnapshot, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    /// Create a new heart and link it to the creator's account.
    ///
    /// The invite code is drawn at random and inserted with
    /// insert-if-absent semantics; on collision a fresh code is drawn, up
    /// to [`MAX_CODE_ATTEMPTS`] times. The heart write and the account
    /// update are two separate writes -- the backing store only guarantees
    /// a transaction for the join path -- so a failed account update
    /// surfaces as [`RegistryError::WriteFailure`] and leaves an unlinked
    /// heart behind (harmless: its code is simply never handed out).
    pub async fn create_heart(
        &self,
        name: &str,
        creator_id: &UserId,
        creator_name: &str,
    ) -> Result<HeartCode> {
        if creator_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = HeartCode::generate();
            let record = HeartRecord::new(code.clone(), name, creator_id.clone(), creator_name);

            if !self.store().insert_heart_if_absent(record).await? {
                warn!(attempt, "invite code collision, drawing a fresh code");
                continue;
            }

            if let Err(e) = self
                .store()
                .set_account_pairing(creator_id, Some((code.clone(), HeartRole::Creator)))
                .await
            {
                warn!(code = %code, error = %e, "heart created but creator account update failed");
                return Err(RegistryError::WriteFailure(format!(
                    "creator account update failed: {e}"
                )));
            }

            info!(code = %code, creator = %creator_id, "heart created");
            return Ok(code);
        }

        Err(RegistryError::WriteFailure(
            "could not allocate a unique invite code".to_string(),
        ))
    }

    /// Claim the partner slot of a heart. Exactly-once under concurrency.
    ///
    /// Runs as a single atomic read-modify-write against the record keyed
    /// by `code`: of two simultaneous joiners, exactly one observes
    /// `is_paired == false` and commits; the other observes the committed
    /// state and fails with [`RegistryError::AlreadyPaired`]. The joiner's
    /// account update is a compensable follow-up (one retry) -- the
    /// registry commit is the source of truth for "paired".
    pub async fn join_heart(
        &self,
        code: &HeartCode,
        joiner_id: &UserId,
        joiner_name: &str,
    ) -> Result<HeartSnapshot> {
        if joiner_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }

        let joiner_name = joiner_name.to_string();
        let record = self
            .store()
            .transact_heart(code, {
                let joiner_id = joiner_id.clone();
                move |existing| {
                    let mut record = existing.ok_or(RegistryError::NotFound)?;

                    if record.is_paired {
                        return Err(RegistryError::AlreadyPaired);
                    }
                    if record.creator_id == joiner_id {
                        return Err(RegistryError::SelfJoin);
                    }

                    record.partner_id = joiner_id;
                    record.partner_name = joiner_name;
                    record.is_paired = true;
                    record.paired_at = Some(Utc::now());
                    Ok(record)
                }
            })
            .await?;

        let pairing = Some((code.clone(), HeartRole::Partner));
        let mut account_update = self
            .store()
            .set_account_pairing(joiner_id, pairing.clone())
            .await;
        if account_update.is_err() {
            account_update = self.store().set_account_pairing(joiner_id, pairing).await;
        }
        if let Err(e) = account_update {
            warn!(
                code = %code,
                joiner = %joiner_id,
                error = %e,
                "joiner account update failed after retry; heart record is paired"
            );
        }

        info!(code = %code, joiner = %joiner_id, "heart paired");
        Ok(HeartSnapshot::from(&record))
    }

    pub async fn get_heart(&self, code: &HeartCode) -> Result<HeartRecord> {
        self.store().get_heart(code).await
    }

    /// Rename the heart. The other partner observes the change through the
    /// live subscription, not instantly.
    pub async fn rename_heart(&self, code: &HeartCode, name: &str) -> Result<()> {
        self.store().update_heart_name(code, name).await?;
        info!(code = %code, "heart renamed");
        Ok(())
    }

    /// Live snapshot stream: current value readable immediately, every
    /// committed change afterwards. Drop the receiver to cancel.
    pub async fn watch_heart(&self, code: &HeartCode) -> Result<watch::Receiver<HeartRecord>> {
        self.store().watch_heart(code).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryStore;

    fn registry() -> HeartRegistry<MemoryStore> {
        HeartRegistry::new(MemoryStore::new())
    }

    async fn registered(registry: &HeartRegistry<MemoryStore>, id: &str, name: &str) -> UserId {
        let user = UserId::from(id);
        registry
            .register_account(&user, name, &format!("{id}@example.com"))
            .await
            .unwrap();
        user
    }

    #[tokio::test]
    async fn test_create_then_join() {
        let registry = registry();
        let alex = registered(&registry, "alex-id", "Alex").await;
        let sam = registered(&registry, "sam-id", "Sam").await;

        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();
        let snapshot = registry.join_heart(&code, &sam, "Sam").await.unwrap();

        assert!(snapshot.is_paired);
        assert_eq!(snapshot.name, "Us");
        assert_eq!(snapshot.creator_name, "Alex");
        assert_eq!(snapshot.partner_name, "Sam");

        let record = registry.get_heart(&code).await.unwrap();
        assert_eq!(record.partner_id, sam);
        assert!(record.paired_at.is_some());

        // Both accounts now point at the heart with the right roles.
        let alex_account = registry.get_account(&alex).await.unwrap();
        assert_eq!(alex_account.heart_role, Some(HeartRole::Creator));
        let sam_account = registry.get_account(&sam).await.unwrap();
        assert_eq!(sam_account.heart_code, Some(code));
        assert_eq!(sam_account.heart_role, Some(HeartRole::Partner));
    }

    #[tokio::test]
    async fn test_join_unknown_code_fails_not_found() {
        let registry = registry();
        let sam = registered(&registry, "sam-id", "Sam").await;

        let code = HeartCode::parse("ZZZZZ9").unwrap();
        let result = registry.join_heart(&code, &sam, "Sam").await;
        assert!(matches!(result, Err(RegistryError::NotFound)));
    }

    #[tokio::test]
    async fn test_join_own_heart_fails_self_join() {
        let registry = registry();
        let alex = registered(&registry, "alex-id", "Alex").await;

        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();
        let result = registry.join_heart(&code, &alex, "Alex").await;
        assert!(matches!(result, Err(RegistryError::SelfJoin)));
    }

    #[tokio::test]
    async fn test_join_paired_heart_fails_and_leaves_partner_fields() {
        let registry = registry();
        let alex = registered(&registry, "alex-id", "Alex").await;
        let sam = registered(&registry, "sam-id", "Sam").await;
        let jo = registered(&registry, "jo-id", "Jo").await;

        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();
        registry.join_heart(&code, &sam, "Sam").await.unwrap();

        let result = registry.join_heart(&code, &jo, "Jo").await;
        assert!(matches!(result, Err(RegistryError::AlreadyPaired)));

        let record = registry.get_heart(&code).await.unwrap();
        assert_eq!(record.partner_id, sam);
        assert_eq!(record.partner_name, "Sam");
    }

    #[tokio::test]
    async fn test_unauthenticated_callers_rejected() {
        let registry = registry();
        let nobody = UserId::new("");

        let create = registry.create_heart("Us", &nobody, "Ghost").await;
        assert!(matches!(create, Err(RegistryError::Unauthenticated)));

        let code = HeartCode::parse("A1B2C3").unwrap();
        let join = registry.join_heart(&code, &nobody, "Ghost").await;
        assert!(matches!(join, Err(RegistryError::Unauthenticated)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_exactly_one_wins() {
        let registry = Arc::new(HeartRegistry::new(MemoryStore::new()));
        let alex = registered(&registry, "alex-id", "Alex").await;
        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let registry = Arc::clone(&registry);
            let code = code.clone();
            let joiner = registered(&registry, &format!("joiner-{i}"), "Joiner").await;
            handles.push(tokio::spawn(async move {
                registry
                    .join_heart(&code, &joiner, &format!("Joiner {i}"))
                    .await
            }));
        }

        let mut successes = 0;
        let mut already_paired = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(snapshot) => {
                    assert!(snapshot.is_paired);
                    successes += 1;
                }
                Err(RegistryError::AlreadyPaired) => already_paired += 1,
                Err(other) => panic!("unexpected join error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(already_paired, 7);

        // The committed partner is the single winner, not a mix of writers.
        let record = registry.get_heart(&code).await.unwrap();
        assert!(record.is_paired);
        assert!(record.partner_id.as_str().starts_with("joiner-"));
        assert_eq!(
            record.partner_name,
            format!("Joiner {}", &record.partner_id.as_str()["joiner-".len()..])
        );
    }

    #[tokio::test]
    async fn test_watch_streams_converge_for_both_sides() {
        let registry = registry();
        let alex = registered(&registry, "alex-id", "Alex").await;
        let sam = registered(&registry, "sam-id", "Sam").await;

        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();

        // Alex subscribes before the join and initially sees an unpaired heart.
        let mut alex_rx = registry.watch_heart(&code).await.unwrap();
        assert!(!alex_rx.borrow().is_paired);

        registry.join_heart(&code, &sam, "Sam").await.unwrap();

        alex_rx.changed().await.unwrap();
        let seen_by_alex = alex_rx.borrow_and_update().clone();
        assert!(seen_by_alex.is_paired);
        assert_eq!(seen_by_alex.counterpart_name(true), "Sam");

        // Sam subscribes after the fact and observes the paired state
        // immediately, with the creator as counterpart.
        let sam_rx = registry.watch_heart(&code).await.unwrap();
        let seen_by_sam = sam_rx.borrow().clone();
        assert!(seen_by_sam.is_paired);
        assert_eq!(seen_by_sam.counterpart_name(false), "Alex");
    }

    #[tokio::test]
    async fn test_rename_visible_through_watch() {
        let registry = registry();
        let alex = registered(&registry, "alex-id", "Alex").await;
        let code = registry.create_heart("Us", &alex, "Alex").await.unwrap();

        let mut rx = registry.watch_heart(&code).await.unwrap();
        registry.rename_heart(&code, "The two of us").await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().name, "The two of us");
    }
}
