use crate::error::{AifError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// An interrupted update never leaves a half-written instruction file behind.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Read a UTF-8 file. Binary or otherwise non-UTF-8 content is reported as
/// `AifError::NotText` rather than a bare I/O error.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => AifError::NotText(path.display().to_string()),
        _ => e.into(),
    })
}

/// Read a UTF-8 file, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match read_text(path) {
        Ok(s) => Ok(Some(s)),
        Err(AifError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CLAUDE.md");
        atomic_write(&path, b"# hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hello");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".github/deep/copilot-instructions.md");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn atomic_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lefthook.yml");
        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn non_utf8_is_not_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        atomic_write(&path, &[0x89, b'P', b'N', b'G', 0xff, 0xfe]).unwrap();
        assert!(matches!(read_text(&path), Err(AifError::NotText(_))));
        assert!(matches!(read_optional(&path), Err(AifError::NotText(_))));
    }

    #[test]
    fn read_optional_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(&dir.path().join("nope.md")).unwrap().is_none());
        std::fs::write(dir.path().join("yes.md"), "x").unwrap();
        assert_eq!(
            read_optional(&dir.path().join("yes.md")).unwrap().as_deref(),
            Some("x")
        );
    }
}
