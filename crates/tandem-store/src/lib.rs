//! # tandem-store
//!
//! Local per-device persistence for the Tandem app: the pairing-session
//! snapshot in SQLite (so the last known heart state renders instantly
//! offline) and the cross-process widget summary file the home-screen
//! widget reads.

pub mod database;
pub mod migrations;
pub mod session;
pub mod widget;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use widget::WidgetStore;
