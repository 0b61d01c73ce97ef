//! The registry service handle.
//!
//! [`HeartRegistry`] wraps a [`RegistryStore`] backend and implements the
//! application-level operations on top of it: heart lifecycle in
//! `hearts.rs`, accounts in `accounts.rs`, and one file per content
//! collection. Constructed once and shared (`Arc`) between the session
//! layer and the HTTP facade.

use tandem_shared::HeartCode;

use crate::error::{RegistryError, Result};
use crate::store::RegistryStore;

pub struct HeartRegistry<S> {
    store: S,
}

impl<S: RegistryStore> HeartRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Direct access to the backing store.
    ///
    /// The session layer uses this for watch subscriptions; everything else
    /// should go through the typed operations.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Content may only be written into an existing, paired heart.
    pub(crate) async fn ensure_paired(&self, code: &HeartCode) -> Result<()> {
        let record = self.store.get_heart(code).await?;
        if !record.is_paired {
            return Err(RegistryError::WriteFailure(
                "heart is not paired".to_string(),
            ));
        }
        Ok(())
    }
}
