//! Music recommendations shared between the partners.

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use tandem_shared::{HeartCode, MusicTrack, UserId};

use crate::error::{RegistryError, Result};
use crate::registry::HeartRegistry;
use crate::store::RegistryStore;

impl<S: RegistryStore> HeartRegistry<S> {
    pub async fn share_track(
        &self,
        code: &HeartCode,
        user_id: &UserId,
        user_name: &str,
        track_name: &str,
        artist_name: &str,
        message: &str,
    ) -> Result<MusicTrack> {
        if user_id.is_empty() {
            return Err(RegistryError::Unauthenticated);
        }
        self.ensure_paired(code).await?;

        let track = MusicTrack {
            id: Uuid::new_v4(),
            heart_code: code.clone(),
            user_id: user_id.clone(),
            user_name: user_name.to_string(),
            track_name: track_name.to_string(),
            artist_name: artist_name.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };

        self.store().add_track(track.clone()).await?;
        info!(code = %code, track = %track.track_name, "track shared");
        Ok(track)
    }

    pub async fn tracks_for(&self, code: &HeartCode) -> Result<Vec<MusicTrack>> {
        self.store().tracks_for(code).await
    }

    pub async fn watch_tracks(
        &self,
        code: &HeartCode,
    ) -> Result<watch::Receiver<Vec<MusicTrack>>> {
        self.store().watch_tracks(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_share_and_watch() {
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

        let mut rx = registry.watch_tracks(&code).await.unwrap();

        registry
            .share_track(&code, &sam, "Sam", "Chanson", "Artiste", "for you")
            .await
            .unwrap();

        rx.changed().await.unwrap();
        let tracks = rx.borrow().clone();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].user_name, "Sam");
    }
}
