//! Opaque per-client player identity.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

const ID_PREFIX: &str = "player_";
const ID_SUFFIX_LEN: usize = 13;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Stable opaque key identifying one client to the stats backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps an existing identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identity of the form `player_<13 base36 chars>`.
    #[instrument]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{ID_PREFIX}{suffix}"))
    }

    /// Reads the identity stored at `path`, creating and storing one if absent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or written.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                let id = Self::new(content.trim());
                debug!(player_id = %id, "Loaded player identity");
                Ok(id)
            }
            Ok(_) => Self::create(path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::create(path),
            Err(err) => Err(err),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let id = Self::generate();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &id.0)?;
        info!(player_id = %id, "Created player identity");
        Ok(id)
    }

    /// The identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
