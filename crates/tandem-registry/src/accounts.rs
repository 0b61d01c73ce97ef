//! Account records: registration and the heart linkage fields.

use tracing::{debug, info};

use tandem_shared::{UserAccount, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    /// Register (or overwrite) an account record.
    pub async fn register_account(
        &self,
        id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<UserAccount> {
        if id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }

        let account = UserAccount::new(id.clone(), name, email);
        self.store().put_account(account.clone()).await?;

        info!(id = %id, "account registered");
        Ok(account)
    }

    pub async fn get_account(&self, id: &UserId) -> Result<UserAccount> {
        self.store().get_account(id).await
    }

    /// Best-effort clear of the account's heart linkage, used by unpair.
    ///
    /// Failures are reported to the caller, which may choose to swallow
    /// them; the heart record itself is never touched here.
    pub async fn clear_account_pairing(&self, id: &UserId) -> Result<()> {
        self.store().set_account_pairing(id, None).await?;
        debug!(id = %id, "account pairing cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_register_and_fetch() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let id = UserId::from("alex-id");

        registry
            .register_account(&id, "Alex", "alex@example.com")
            .await
            .unwrap();

        let account = registry.get_account(&id).await.unwrap();
        assert_eq!(account.name, "Alex");
        assert!(account.heart_code.is_none());
    }

    #[tokio::test]
    async fn test_register_requires_id() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let result = registry
            .register_account(&UserId::new(""), "Ghost", "ghost@example.com")
            .await;
        assert!(matches!(result, Err(RegistryError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_clear_pairing_on_unknown_account_fails() {
        let registry = HeartRegistry::new(MemoryStore::new());
        let result = registry.clear_account_pairing(&UserId::from("ghost")).await;
        assert!(matches!(result, Err(RegistryError::NotFound)));
    }
}
