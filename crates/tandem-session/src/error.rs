use thiserror::Error;

use tandem_registry::RegistryError;
use tandem_store::StoreError;

/// Errors produced while starting or driving the session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
