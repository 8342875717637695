use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::fingerprint::Fingerprint;
use crate::io;
use crate::paths::FINGERPRINT_FILE;

/// Identifies the host build that wrote a record. A compiled config links
/// against the host's SDK and must come from the host's rustc, so records
/// from another host build or toolchain are stale.
pub fn host_version() -> String {
    format!(
        "{}+abi{}+rustc{:016x}",
        env!("CARGO_PKG_VERSION"),
        sprout_sdk::ABI_VERSION,
        sprout_sdk::RUSTC_FINGERPRINT
    )
}

#[derive(Debug, Serialize, Deserialize)]
struct FingerprintRecord {
    fingerprint: Fingerprint,
    sprout_version: String,
}

/// Persists the fingerprint of the last successfully compiled source in the
/// workspace's `config.fingerprint` sidecar.
///
/// Reads fail open: anything other than a well-formed record from this host
/// build reads as "nothing recorded", which forces a recompile. Writes fail
/// loudly.
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
    version: String,
}

impl FingerprintStore {
    pub fn new(workspace_dir: &Path) -> Self {
        Self {
            path: workspace_dir.join(FINGERPRINT_FILE),
            version: host_version(),
        }
    }

    #[cfg(test)]
    fn with_version(workspace_dir: &Path, version: &str) -> Self {
        Self {
            path: workspace_dir.join(FINGERPRINT_FILE),
            version: version.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Option<Fingerprint> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), error = %e, "fingerprint unreadable; treating as stale");
                }
                return None;
            }
        };
        let record: FingerprintRecord = match serde_json::from_str(&data) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "fingerprint corrupt; treating as stale");
                return None;
            }
        };
        if record.sprout_version != self.version {
            tracing::debug!(
                recorded = %record.sprout_version,
                current = %self.version,
                "fingerprint written by another sprout build; treating as stale"
            );
            return None;
        }
        Some(record.fingerprint)
    }

    pub fn write(&self, fingerprint: &Fingerprint) -> Result<()> {
        let record = FingerprintRecord {
            fingerprint: *fingerprint,
            sprout_version: self.version.clone(),
        };
        let data = serde_json::to_vec_pretty(&record).map_err(|e| ConfigError::Persistence {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        io::atomic_write(&self.path, &data).map_err(|source| ConfigError::Persistence {
            path: self.path.clone(),
            source,
        })
    }

    /// Forget the recorded fingerprint (no-op when none is recorded).
    pub fn clear(&self) -> Result<()> {
        io::remove_if_exists(&self.path)
            .map(|_| ())
            .map_err(|source| ConfigError::Persistence {
                path: self.path.clone(),
                source,
            })
    }
}
