use crate::checksum::Checksum;
use crate::error::Result;
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Checksums of the framework content each installed file last received.
///
/// A file whose on-disk checksum still matches its entry has not been
/// customized since the last update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, Checksum>,
}

impl Manifest {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            updated_at: Utc::now(),
            files: BTreeMap::new(),
        }
    }

    /// Load `.ai-framework/manifest.json`. `None` means nothing has been
    /// recorded yet, so no file has a baseline.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let Some(data) = io::read_optional(&paths::manifest_path(root))? else {
            return Ok(None);
        };
        let manifest: Manifest = serde_json::from_str(&data)?;
        Ok(Some(manifest))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        io::atomic_write(&paths::manifest_path(root), data.as_bytes())
    }

    pub fn checksum_for(&self, path: &str) -> Option<&Checksum> {
        self.files.get(&paths::normalize(path))
    }

    pub fn record(&mut self, path: &str, checksum: Checksum) {
        self.files.insert(paths::normalize(path), checksum);
    }

    pub fn forget(&mut self, path: &str) -> Option<Checksum> {
        self.files.remove(&paths::normalize(path))
    }

    /// Stamp a completed update.
    pub fn finish(&mut self, version: &str) {
        self.version = version.to_string();
        self.updated_at = Utc::now();
    }
}
