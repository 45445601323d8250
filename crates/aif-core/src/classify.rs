use crate::error::AifError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// FileCategory
// ---------------------------------------------------------------------------

/// Who owns a file in an installed project, decided from its path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileCategory {
    /// Maintained by the team (knowledge, decisions). Updates never touch it.
    UserOwned,
    /// Maintained by the framework only (hook scripts). Always replaced.
    FrameworkOnly,
    /// Generated by the compiler; a team section may be carried forward.
    CompiledOutput,
    /// Framework default that the team may hand-edit. Three-way merged.
    UserCustomizable,
}

/// What the updater is allowed to do with a file of a given category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    Preserve,
    Replace,
    Regenerate,
    Merge,
}

impl FileCategory {
    pub fn all() -> &'static [FileCategory] {
        &[
            FileCategory::UserOwned,
            FileCategory::FrameworkOnly,
            FileCategory::CompiledOutput,
            FileCategory::UserCustomizable,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::UserOwned => "user-owned",
            FileCategory::FrameworkOnly => "framework-only",
            FileCategory::CompiledOutput => "compiled-output",
            FileCategory::UserCustomizable => "user-customizable",
        }
    }

    pub fn policy(self) -> UpdatePolicy {
        match self {
            FileCategory::UserOwned => UpdatePolicy::Preserve,
            FileCategory::FrameworkOnly => UpdatePolicy::Replace,
            FileCategory::CompiledOutput => UpdatePolicy::Regenerate,
            FileCategory::UserCustomizable => UpdatePolicy::Merge,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileCategory {
    type Err = AifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AifError::InvalidCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule over a normalised path.
pub struct Rule {
    pub id: &'static str,
    pub matches: fn(&str) -> bool,
    pub category: FileCategory,
}

/// A user-supplied prefix rule, checked before the built-in rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOverride {
    pub prefix: String,
    pub category: FileCategory,
}

/// Rule id reported when no rule matched.
pub const DEFAULT_RULE: &str = "default";

/// Category for paths no rule recognises. Unknown files go through the
/// three-way merge, which never overwrites edits without a conflict.
pub const DEFAULT_CATEGORY: FileCategory = FileCategory::UserCustomizable;

fn dir_components(path: &str) -> impl Iterator<Item = &str> {
    let dirs = path.rsplit_once('/').map_or("", |(d, _)| d);
    dirs.split('/').filter(|s| !s.is_empty())
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, f)| f)
}

fn is_root_file(path: &str) -> bool {
    !path.contains('/')
}

fn under_any(path: &str, names: &[&str]) -> bool {
    dir_components(path).any(|d| names.contains(&d))
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "user-knowledge",
            matches: |p| under_any(p, &["knowledge", "decisions"]),
            category: FileCategory::UserOwned,
        },
        Rule {
            id: "framework-hooks",
            matches: |p| under_any(p, &["hooks"]),
            category: FileCategory::FrameworkOnly,
        },
        Rule {
            id: "root-instructions",
            matches: |p| {
                matches!(
                    file_name(p),
                    "CLAUDE.md" | "copilot-instructions.md" | "codex.md" | "AGENTS.md"
                )
            },
            category: FileCategory::CompiledOutput,
        },
        Rule {
            id: "compiled-trees",
            matches: |p| under_any(p, &["commands", "standards", "agents", "skills"]),
            category: FileCategory::CompiledOutput,
        },
        Rule {
            id: "root-config",
            matches: |p| is_root_file(p) && matches!(p, "config.yml" | "config.yaml"),
            category: FileCategory::UserCustomizable,
        },
        Rule {
            id: "hook-runner-config",
            matches: |p| {
                is_root_file(p)
                    && matches!(
                        p,
                        "lefthook.yml" | "lefthook.yaml" | ".lefthook.yml" | ".lefthook.yaml"
                    )
            },
            category: FileCategory::UserCustomizable,
        },
    ]
}

// ---------------------------------------------------------------------------
// Classification (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Normalised path the rules were evaluated against.
    pub path: String,
    pub category: FileCategory,
    /// Id of the rule that matched, `override:<prefix>`, or `default`.
    pub rule: String,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    overrides: Vec<PathOverride>,
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            overrides: Vec::new(),
            rules,
        }
    }

    pub fn with_overrides(mut self, overrides: &[PathOverride]) -> Self {
        self.overrides = overrides
            .iter()
            .map(|o| PathOverride {
                prefix: normalize_path(&o.prefix),
                category: o.category,
            })
            .filter(|o| !o.prefix.is_empty())
            .collect();
        self
    }

    /// First match wins: overrides in declaration order, then rules in
    /// priority order, then the default category.
    pub fn classify(&self, path: &str) -> Classification {
        let path = normalize_path(path);

        if let Some(o) = self.overrides.iter().find(|o| path.starts_with(&o.prefix)) {
            return Classification {
                rule: format!("override:{}", o.prefix),
                category: o.category,
                path,
            };
        }

        for rule in &self.rules {
            if (rule.matches)(&path) {
                return Classification {
                    rule: rule.id.to_string(),
                    category: rule.category,
                    path,
                };
            }
        }

        Classification {
            rule: DEFAULT_RULE.to_string(),
            category: DEFAULT_CATEGORY,
            path,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

/// Normalise a path for rule matching, dropping the `.ai-framework/` install
/// directory so `config.yml` and `.ai-framework/config.yml` classify alike.
pub fn normalize_path(path: &str) -> String {
    let p = paths::normalize(path);
    match p.strip_prefix(paths::FRAMEWORK_DIR) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => p,
    }
}

static DEFAULT_CLASSIFIER: OnceLock<Classifier> = OnceLock::new();

/// Classify with the built-in rules only.
pub fn classify_file(path: &str) -> FileCategory {
    DEFAULT_CLASSIFIER
        .get_or_init(Classifier::default)
        .classify(path)
        .category
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
