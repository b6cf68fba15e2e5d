//! Voice profile store

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

/// Persisted voice/rate preference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub voice: String,
    pub rate: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl VoiceProfile {
    pub fn new(voice: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            rate: rate.into(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self::new("en-US-AriaNeural", "+0%")
    }
}

/// Storage for the voice profile record
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load the stored profile; a missing or unreadable record yields the
    /// default profile rather than an error
    async fn load(&self) -> VoiceProfile;

    /// Persist the profile
    async fn save(&self, profile: &VoiceProfile) -> Result<(), PersistenceError>;
}

/// JSON-file backed profile store
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ProfileStore for JsonProfileStore {
    async fn load(&self) -> VoiceProfile {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "corrupt voice profile, using defaults"
                    );
                    VoiceProfile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VoiceProfile::default(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable voice profile, using defaults"
                );
                VoiceProfile::default()
            }
        }
    }

    async fn save(&self, profile: &VoiceProfile) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(profile)?;
        tokio::fs::write(&self.path, bytes).await?;
        tracing::debug!(path = %self.path.display(), "voice profile saved");
        Ok(())
    }
}
