//! Session actor with tokio mpsc command/notification pattern.
//!
//! The session loop runs in a dedicated tokio task that owns the local
//! state, the database handle, and the registry subscription. External code
//! communicates with it through typed command and notification channels, so
//! registry updates and UI commands are serialized onto one writer.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use tandem_registry::{HeartRegistry, RegistryStore};
use tandem_shared::{HeartCode, HeartRecord, PairingSnapshot, UserId};
use tandem_store::{Database, WidgetStore};

use crate::error::SessionError;
use crate::state::SessionState;

const COMMAND_BUFFER: usize = 16;
const NOTIFICATION_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Adopt a heart after create or join and open its subscription.
    Bind {
        heart_name: String,
        code: HeartCode,
        user_name: String,
        is_creator: bool,
    },
    /// Optimistic local rename. The registry record is updated by a
    /// separate direct `rename_heart` call; the other partner observes it
    /// through their subscription.
    Rename(String),
    /// Drop the heart locally. The registry record is left untouched.
    Unpair,
    /// Request a copy of the current snapshot.
    GetState(oneshot::Sender<PairingSnapshot>),
    /// Gracefully shut down the session task.
    Shutdown,
}

/// Notifications sent *from* the session task to the UI layer.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    /// Local state changed (bind, unpair, rename, or a registry update).
    /// The snapshot has already been persisted when this arrives.
    StateChanged(PairingSnapshot),
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Spawn the session actor in a background tokio task.
///
/// Restores the persisted snapshot first: if a heart code is present the
/// session starts `Bound` and re-subscribes immediately. Returns channels
/// for sending commands and receiving notifications.
pub async fn spawn_session<S: RegistryStore>(
    registry: Arc<HeartRegistry<S>>,
    database: Database,
    widget: WidgetStore,
    user_id: UserId,
) -> Result<
    (
        mpsc::Sender<SessionCommand>,
        mpsc::Receiver<SessionNotification>,
    ),
    SessionError,
> {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (note_tx, note_rx) = mpsc::channel(NOTIFICATION_BUFFER);

    let state = match database.load_session()? {
        Some(snapshot) => {
            debug!(bound = snapshot.heart_code.is_some(), "session restored");
            SessionState::from_snapshot(snapshot)
        }
        None => SessionState::default(),
    };

    let mut actor = SessionActor {
        registry,
        database,
        widget,
        user_id,
        state,
        subscription: None,
        note_tx,
    };

    // Re-subscribe for a restored Bound session and pick up whatever the
    // registry committed while the process was down.
    if let Some(code) = actor.state.snapshot.heart_code.clone() {
        actor.open_subscription(&code).await;
    }
    actor.notify().await;

    tokio::spawn(async move {
        actor.run(cmd_rx).await;
        info!("session task stopped");
    });

    Ok((cmd_tx, note_rx))
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct SessionActor<S: RegistryStore> {
    registry: Arc<HeartRegistry<S>>,
    database: Database,
    widget: WidgetStore,
    user_id: UserId,
    state: SessionState,
    subscription: Option<watch::Receiver<HeartRecord>>,
    note_tx: mpsc::Sender<SessionNotification>,
}

impl<S: RegistryStore> SessionActor<S> {
    async fn run(&mut self, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        None => break,
                        Some(cmd) => {
                            if !self.handle_command(cmd).await {
                                break;
                            }
                        }
                    }
                }
                update = Self::next_update(&mut self.subscription) => {
                    match update {
                        Some(record) => self.apply_record(&record).await,
                        None => {
                            // A closed stream degrades to "no update
                            // delivered"; the session stays Bound and a
                            // later re-bind re-subscribes.
                            debug!("heart subscription closed");
                            self.subscription = None;
                        }
                    }
                }
            }
        }
    }

    /// Wait for the next committed heart snapshot, or forever if there is
    /// no open subscription. Cancel-safe: `watch::Receiver::changed` holds
    /// no state across polls.
    async fn next_update(
        subscription: &mut Option<watch::Receiver<HeartRecord>>,
    ) -> Option<HeartRecord> {
        match subscription {
            Some(rx) => match rx.changed().await {
                Ok(()) => Some(rx.borrow_and_update().clone()),
                Err(_) => None,
            },
            None => std::future::pending().await,
        }
    }

    /// Returns `false` when the session should stop.
    async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Bind {
                heart_name,
                code,
                user_name,
                is_creator,
            } => {
                // Always drop any prior subscription first so two
                // overlapping streams never deliver into one session.
                self.subscription = None;

                self.state.bind(&heart_name, code.clone(), &user_name, is_creator);
                info!(code = %code, is_creator, "session bound");

                self.persist_and_project();
                self.open_subscription(&code).await;
                self.notify().await;
            }

            SessionCommand::Rename(name) => {
                if !self.state.is_bound() {
                    warn!("rename ignored: session is not bound");
                    return true;
                }
                self.state.rename(&name);
                self.persist_and_project();
                self.notify().await;
            }

            SessionCommand::Unpair => {
                self.subscription = None;
                self.state.unpair();
                info!("session unpaired");

                self.persist_and_project();
                self.notify().await;

                // Best-effort: the account linkage is cosmetic next to the
                // registry record, which unpair never touches.
                if let Err(e) = self.registry.clear_account_pairing(&self.user_id).await {
                    debug!(error = %e, "account pairing clear failed, ignoring");
                }
            }

            SessionCommand::GetState(reply) => {
                let _ = reply.send(self.state.snapshot.clone());
            }

            SessionCommand::Shutdown => return false,
        }

        true
    }

    /// Open the live subscription for `code` and fold in the snapshot the
    /// registry holds right now. Failure degrades: the session stays in its
    /// current state with no stream attached.
    async fn open_subscription(&mut self, code: &HeartCode) {
        match self.registry.watch_heart(code).await {
            Ok(rx) => {
                let current = rx.borrow().clone();
                self.subscription = Some(rx);
                self.apply_record(&current).await;
            }
            Err(e) => {
                warn!(code = %code, error = %e, "heart subscription unavailable");
                self.subscription = None;
            }
        }
    }

    /// Merge one registry snapshot. Idempotent: re-delivery of an unchanged
    /// record persists and notifies nothing.
    async fn apply_record(&mut self, record: &HeartRecord) {
        if !self.state.apply(record) {
            return;
        }

        debug!(
            heart = %record.name,
            is_paired = record.is_paired,
            "registry update applied"
        );
        self.persist_and_project();
        self.notify().await;
    }

    /// Persist the snapshot, then re-project the widget summary. Both are
    /// caches of registry state; failures are logged and the session keeps
    /// going.
    fn persist_and_project(&self) {
        if let Err(e) = self.database.save_session(&self.state.snapshot) {
            tracing::error!(error = %e, "failed to persist session snapshot");
        }

        let snapshot = &self.state.snapshot;
        if let Err(e) = self.widget.update_pairing(
            &snapshot.heart_name,
            &snapshot.partner_name,
            snapshot.is_paired,
        ) {
            warn!(error = %e, "failed to update widget summary");
        }
    }

    async fn notify(&mut self) {
        let note = SessionNotification::StateChanged(self.state.snapshot.clone());
        if self.note_tx.send(note).await.is_err() {
            debug!("notification receiver dropped");
        }
    }
}
