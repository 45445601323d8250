use crate::error::Result;
use crate::{io, paths};
use std::path::{Path, PathBuf};

/// Last framework text delivered for each merge-eligible file, kept under
/// `.ai-framework/baselines/` so later updates can run a real diff3 merge.
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    pub fn new(root: &Path) -> Self {
        Self {
            dir: paths::baselines_dir(root),
        }
    }

    pub fn load(&self, path: &str) -> Result<Option<String>> {
        io::read_optional(&paths::join_relative(&self.dir, path)?)
    }

    pub fn store(&self, path: &str, text: &str) -> Result<()> {
        io::atomic_write(&paths::join_relative(&self.dir, path)?, text.as_bytes())
    }
}
