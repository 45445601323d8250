use crate::error::{AifError, Result};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

/// Install directory for framework-owned state inside a project.
pub const FRAMEWORK_DIR: &str = ".ai-framework";
pub const BASELINES_DIR: &str = ".ai-framework/baselines";

pub const MANIFEST_FILE: &str = ".ai-framework/manifest.json";
pub const UPDATE_CONFIG_FILE: &str = ".ai-framework/update.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn framework_dir(root: &Path) -> PathBuf {
    root.join(FRAMEWORK_DIR)
}

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn update_config_path(root: &Path) -> PathBuf {
    root.join(UPDATE_CONFIG_FILE)
}

pub fn baselines_dir(root: &Path) -> PathBuf {
    root.join(BASELINES_DIR)
}

/// Normalise a repository-relative path string for rule matching and
/// manifest keys: `/` separators, no leading `./` or `/`.
pub fn normalize(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest.to_string();
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest.to_string();
        } else {
            break;
        }
    }
    p
}

/// Join a normalised relative path onto `base`, rejecting anything that
/// would resolve outside of it.
pub fn join_relative(base: &Path, rel: &str) -> Result<PathBuf> {
    let rel = normalize(rel);
    if rel.is_empty() {
        return Err(AifError::InvalidPath(rel));
    }
    let rel_path = Path::new(&rel);
    for component in rel_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(AifError::InvalidPath(rel.clone())),
        }
    }
    Ok(base.join(rel_path))
}

/// Render `path` relative to `base` with `/` separators.
pub fn relative_string(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_prefixes_and_backslashes() {
        assert_eq!(normalize("./CLAUDE.md"), "CLAUDE.md");
        assert_eq!(normalize("/hooks/pre-tool.sh"), "hooks/pre-tool.sh");
        assert_eq!(normalize(".\\knowledge\\learnings.md"), "knowledge/learnings.md");
        assert_eq!(normalize("././a/b"), "a/b");
    }

    #[test]
    fn join_relative_rejects_escape() {
        let base = Path::new("/tmp/proj");
        assert!(join_relative(base, "../etc/passwd").is_err());
        assert!(join_relative(base, "a/../../b").is_err());
        assert!(join_relative(base, "").is_err());
        assert_eq!(
            join_relative(base, "a/b.md").unwrap(),
            PathBuf::from("/tmp/proj/a/b.md")
        );
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            manifest_path(root),
            PathBuf::from("/tmp/proj/.ai-framework/manifest.json")
        );
        assert_eq!(
            update_config_path(root),
            PathBuf::from("/tmp/proj/.ai-framework/update.yaml")
        );
    }

    #[test]
    fn relative_string_uses_forward_slashes() {
        let base = Path::new("/tmp/t");
        let p = Path::new("/tmp/t/.github/copilot-instructions.md");
        assert_eq!(
            relative_string(base, p).as_deref(),
            Some(".github/copilot-instructions.md")
        );
        assert_eq!(relative_string(base, base), None);
    }
}
