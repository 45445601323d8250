//! Plan and apply a framework update over an installed project.
//!
//! `plan` reads the incoming template tree and the project but writes
//! nothing; `apply` executes a plan and records the new baselines.

use crate::baseline::BaselineStore;
use crate::checksum::Checksum;
use crate::classify::{Classifier, FileCategory, UpdatePolicy};
use crate::config::UpdateConfig;
use crate::error::{AifError, Result};
use crate::manifest::Manifest;
use crate::merge::{conflict_blocks, has_conflict_markers, three_way_merge_with_base, MergeAction};
use crate::sections::{carry_team_section, parse_sections};
use crate::{io, paths};
use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UpToDate,
    UserOwned,
    /// Template or project file is not UTF-8 text; left alone.
    NotText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Create {
        #[serde(skip)]
        content: String,
    },
    Replace {
        #[serde(skip)]
        content: String,
    },
    Merge {
        #[serde(skip)]
        content: String,
    },
    Conflict {
        #[serde(skip)]
        content: String,
        conflicts: usize,
    },
    Skip {
        reason: SkipReason,
    },
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Create { .. } => "create",
            FileOutcome::Replace { .. } => "replace",
            FileOutcome::Merge { .. } => "merge",
            FileOutcome::Conflict { .. } => "conflict",
            FileOutcome::Skip { .. } => "skip",
        }
    }

    /// Content to write, if this outcome writes anything.
    pub fn content(&self) -> Option<&str> {
        match self {
            FileOutcome::Create { content }
            | FileOutcome::Replace { content }
            | FileOutcome::Merge { content }
            | FileOutcome::Conflict { content, .. } => Some(content),
            FileOutcome::Skip { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub path: String,
    pub category: FileCategory,
    pub rule: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    /// Framework text the user receives with this update; its checksum
    /// becomes the file's new baseline.
    #[serde(skip)]
    pub baseline: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlan {
    pub target_version: String,
    pub entries: Vec<PlanEntry>,
}

impl UpdatePlan {
    pub fn conflicts(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, FileOutcome::Conflict { .. }))
            .map(|e| e.path.as_str())
            .collect()
    }

    pub fn has_writes(&self) -> bool {
        self.entries.iter().any(|e| e.outcome.content().is_some())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub created: usize,
    pub replaced: usize,
    pub merged: usize,
    pub skipped: usize,
    pub conflicted: Vec<String>,
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Files under these prefixes are updater state and never taken from templates.
const STATE_PREFIXES: &[&str] = &[
    paths::MANIFEST_FILE,
    paths::UPDATE_CONFIG_FILE,
    paths::BASELINES_DIR,
];

pub fn plan(
    root: &Path,
    templates: &Path,
    config: &UpdateConfig,
    target_version: &str,
) -> Result<UpdatePlan> {
    if !templates.is_dir() {
        return Err(AifError::TemplatesNotFound(templates.display().to_string()));
    }

    let manifest = Manifest::load(root)?;
    let ctx = PlanContext {
        root,
        classifier: config.classifier(),
        manifest: manifest.as_ref(),
        baselines: config.retain_baselines.then(|| BaselineStore::new(root)),
        target_version,
    };

    let mut entries = Vec::new();
    for entry in WalkDir::new(templates).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = paths::relative_string(templates, entry.path()) else {
            continue;
        };
        if STATE_PREFIXES.iter().any(|p| rel.starts_with(p)) {
            tracing::debug!(path = %rel, "skipping updater state file in templates");
            continue;
        }
        entries.push(ctx.plan_file(&rel, entry.path())?);
    }

    Ok(UpdatePlan {
        target_version: target_version.to_string(),
        entries,
    })
}

struct PlanContext<'a> {
    root: &'a Path,
    classifier: Classifier,
    manifest: Option<&'a Manifest>,
    baselines: Option<BaselineStore>,
    target_version: &'a str,
}

impl PlanContext<'_> {
    fn recorded(&self, path: &str) -> Checksum {
        self.manifest
            .and_then(|m| m.checksum_for(path))
            .cloned()
            .unwrap_or_else(Checksum::unknown)
    }

    fn plan_file(&self, rel: &str, template: &Path) -> Result<PlanEntry> {
        let classification = self.classifier.classify(rel);
        let target = paths::join_relative(self.root, rel)?;

        let decided = match classification.category.policy() {
            UpdatePolicy::Preserve => Ok((
                FileOutcome::Skip {
                    reason: SkipReason::UserOwned,
                },
                String::new(),
            )),
            policy => self.decide(policy, rel, &target, template),
        };
        let (outcome, baseline) = match decided {
            Err(AifError::NotText(file)) => {
                tracing::warn!(path = %rel, file = %file, "skipping file that is not UTF-8 text");
                (
                    FileOutcome::Skip {
                        reason: SkipReason::NotText,
                    },
                    String::new(),
                )
            }
            other => other?,
        };

        tracing::debug!(
            path = %rel,
            category = %classification.category,
            rule = %classification.rule,
            outcome = outcome.label(),
            "planned"
        );

        Ok(PlanEntry {
            path: rel.to_string(),
            category: classification.category,
            rule: classification.rule,
            outcome,
            baseline,
        })
    }

    /// Outcome and new baseline text for a file the updater may write.
    fn decide(
        &self,
        policy: UpdatePolicy,
        rel: &str,
        target: &Path,
        template: &Path,
    ) -> Result<(FileOutcome, String)> {
        let incoming = io::read_text(template)?;
        let decided = match policy {
            UpdatePolicy::Preserve => (
                FileOutcome::Skip {
                    reason: SkipReason::UserOwned,
                },
                String::new(),
            ),
            UpdatePolicy::Replace => {
                let outcome = match io::read_optional(target)? {
                    None => FileOutcome::Create {
                        content: incoming.clone(),
                    },
                    Some(current) if current == incoming => FileOutcome::Skip {
                        reason: SkipReason::UpToDate,
                    },
                    Some(_) => FileOutcome::Replace {
                        content: incoming.clone(),
                    },
                };
                (outcome, incoming)
            }
            UpdatePolicy::Regenerate => self.regenerate(rel, target, &incoming)?,
            UpdatePolicy::Merge => {
                let outcome = self.merge(rel, target, &incoming)?;
                (outcome, incoming)
            }
        };
        Ok(decided)
    }

    /// New framework region from the template, team region from the project.
    fn regenerate(
        &self,
        rel: &str,
        target: &Path,
        incoming: &str,
    ) -> Result<(FileOutcome, String)> {
        let template = parse_sections(incoming);
        let version = template.version.as_deref().unwrap_or(self.target_version);
        let current = io::read_optional(target)?;
        let regenerated = carry_team_section(version, &template.framework, current.as_deref());

        let outcome = match current {
            None => FileOutcome::Create {
                content: regenerated.clone(),
            },
            Some(current) if current == regenerated => FileOutcome::Skip {
                reason: SkipReason::UpToDate,
            },
            Some(current) => {
                if !parse_sections(&current).is_sectioned()
                    && !current.trim().is_empty()
                    && !self.recorded(rel).matches(&current)
                {
                    tracing::warn!(
                        path = %rel,
                        "legacy file without section markers is regenerated; \
                         move team content into the TEAM section to keep it"
                    );
                }
                FileOutcome::Replace {
                    content: regenerated.clone(),
                }
            }
        };
        Ok((outcome, regenerated))
    }

    fn merge(&self, rel: &str, target: &Path, incoming: &str) -> Result<FileOutcome> {
        let Some(current) = io::read_optional(target)? else {
            return Ok(FileOutcome::Create {
                content: incoming.to_string(),
            });
        };
        if has_conflict_markers(&current) {
            tracing::warn!(path = %rel, "file still contains conflict markers from a previous update");
        }

        let original = self.recorded(rel);
        let base = match &self.baselines {
            Some(store) => store.load(rel)?,
            None => None,
        };
        let result = three_way_merge_with_base(&original, base.as_deref(), &current, incoming);
        let action = result.action();

        let outcome = match (action, result.into_content()) {
            (MergeAction::Skip, _) | (_, None) => FileOutcome::Skip {
                reason: SkipReason::UpToDate,
            },
            (MergeAction::Replace, Some(content)) => FileOutcome::Replace { content },
            (MergeAction::Merge | MergeAction::Conflict, Some(content)) => {
                // leftover markers keep the file flagged until someone resolves them
                let conflicts = conflict_blocks(&content);
                if conflicts > 0 {
                    FileOutcome::Conflict { content, conflicts }
                } else if content == current {
                    FileOutcome::Skip {
                        reason: SkipReason::UpToDate,
                    }
                } else {
                    FileOutcome::Merge { content }
                }
            }
        };
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Write every planned change, then record the new baselines in the manifest.
///
/// Conflicted files are written with their markers and listed in the
/// summary; callers must surface them.
pub fn apply(root: &Path, plan: &UpdatePlan, config: &UpdateConfig) -> Result<ApplySummary> {
    let mut manifest =
        Manifest::load(root)?.unwrap_or_else(|| Manifest::new(&plan.target_version));
    let baselines = BaselineStore::new(root);
    let mut summary = ApplySummary::default();

    for entry in &plan.entries {
        if let Some(content) = entry.outcome.content() {
            let target = paths::join_relative(root, &entry.path)?;
            io::atomic_write(&target, content.as_bytes())?;
        }

        match &entry.outcome {
            FileOutcome::Create { .. } => summary.created += 1,
            FileOutcome::Replace { .. } => summary.replaced += 1,
            FileOutcome::Merge { .. } => summary.merged += 1,
            FileOutcome::Conflict { conflicts, .. } => {
                tracing::warn!(path = %entry.path, conflicts, "wrote conflict markers");
                summary.conflicted.push(entry.path.clone());
            }
            FileOutcome::Skip { .. } => summary.skipped += 1,
        }
        if entry.outcome.content().is_some() {
            tracing::info!(path = %entry.path, outcome = entry.outcome.label(), "updated");
        }

        let not_text = entry.outcome
            == FileOutcome::Skip {
                reason: SkipReason::NotText,
            };
        match entry.category.policy() {
            _ if not_text => {}
            UpdatePolicy::Preserve => {}
            UpdatePolicy::Replace | UpdatePolicy::Regenerate => {
                manifest.record(&entry.path, Checksum::of(&entry.baseline));
            }
            UpdatePolicy::Merge => {
                manifest.record(&entry.path, Checksum::of(&entry.baseline));
                if config.retain_baselines {
                    baselines.store(&entry.path, &entry.baseline)?;
                }
            }
        }
    }

    manifest.finish(&plan.target_version);
    manifest.save(root)?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
