//! The cross-process widget summary file.
//!
//! The main app process writes `widget.json` into the shared data
//! directory; the widget process reads it on its ~15 minute timeline plus
//! on-demand after any producer write. Three producers update the file --
//! pairing changes, new letters, new shared tracks -- each overwriting only
//! its own fields via read-modify-write.
//!
//! The producers take no cross-producer lock: two concurrent
//! read-modify-writes are last-write-wins and can drop one side's field
//! update. This is a known race on cosmetic display state; the next
//! producer write or timeline tick repairs it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;

use tandem_shared::{WidgetLetter, WidgetSummary, WidgetTrack};

use crate::error::{Result, StoreError};

const WIDGET_FILE: &str = "widget.json";

/// Handle on the shared widget summary file.
#[derive(Debug, Clone)]
pub struct WidgetStore {
    path: PathBuf,
}

impl WidgetStore {
    /// The default shared location next to the app database.
    pub fn shared() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "tandem", "tandem").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(WIDGET_FILE),
        })
    }

    /// A widget store at an explicit path (tests, custom layouts).
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current summary. `None` if no producer has written yet.
    pub fn load(&self) -> Result<Option<WidgetSummary>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, summary: &WidgetSummary) -> Result<()> {
        let json = serde_json::to_string_pretty(summary)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "widget summary written");
        Ok(())
    }

    /// Producer: pairing state changed.
    ///
    /// Creates the summary if it does not exist yet; preserves the latest
    /// letter and track.
    pub fn update_pairing(
        &self,
        heart_name: &str,
        partner_name: &str,
        is_paired: bool,
    ) -> Result<()> {
        let mut summary = self.load()?.unwrap_or_else(WidgetSummary::empty);

        summary.heart_name = heart_name.to_string();
        summary.partner_name = partner_name.to_string();
        summary.is_paired = is_paired;
        summary.last_updated = Utc::now();

        self.save(&summary)
    }

    /// Producer: a new partner letter arrived.
    ///
    /// A no-op until the pairing producer has created the summary; a letter
    /// without pairing context has nothing to render against.
    pub fn update_latest_letter(&self, letter: WidgetLetter) -> Result<()> {
        let Some(mut summary) = self.load()? else {
            return Ok(());
        };

        summary.latest_letter = Some(letter);
        summary.last_updated = Utc::now();

        self.save(&summary)
    }

    /// Producer: a new partner track arrived. Same no-op rule as letters.
    pub fn update_latest_track(&self, track: WidgetTrack) -> Result<()> {
        let Some(mut summary) = self.load()? else {
            return Ok(());
        };

        summary.latest_track = Some(track);
        summary.last_updated = Utc::now();

        self.save(&summary)
    }
}
