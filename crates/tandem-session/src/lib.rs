//! # tandem-session
//!
//! Per-device pairing session: the locally cached heart projection, its
//! persistence, the live registry subscription, and the widget-surface
//! re-projection.
//!
//! The session runs as a single actor task; commands arrive on an mpsc
//! channel and registry updates on the watch stream, so local state never
//! has concurrent writers. State changes are persisted before they are
//! announced on the notification channel.

pub mod actor;
pub mod feeds;
pub mod state;

mod error;

pub use actor::{spawn_session, SessionCommand, SessionNotification};
pub use error::SessionError;
pub use state::SessionState;
