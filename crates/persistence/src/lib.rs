//! Preference persistence for read-along
//!
//! Stores the voice/rate preference record read before and written after a
//! playback session. The store itself is a pluggable collaborator; the
//! default implementation is a small JSON file.

mod error;
mod profile;

pub use error::PersistenceError;
pub use profile::{JsonProfileStore, ProfileStore, VoiceProfile};
