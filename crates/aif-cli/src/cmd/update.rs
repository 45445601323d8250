use crate::output::{print_json, print_table};
use aif_core::config::{UpdateConfig, WarnLevel};
use aif_core::update::{apply, plan, ApplySummary, FileOutcome, SkipReason, UpdatePlan};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct UpdateReport<'a> {
    dry_run: bool,
    #[serde(flatten)]
    plan: &'a UpdatePlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a ApplySummary>,
}

/// `aif update`: bring framework files up to the templates in `from`.
///
/// Conflicted files are written with markers; the command then fails so
/// scripts and CI notice.
pub fn run(
    root: &Path,
    from: &Path,
    target_version: &str,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = UpdateConfig::load(root).context("failed to load update.yaml")?;
    for w in config.validate() {
        if w.level == WarnLevel::Error {
            anyhow::bail!("invalid update.yaml: {}", w.message);
        }
        tracing::warn!("{}", w.message);
    }

    let plan = plan(root, from, &config, target_version).context("failed to plan update")?;
    let summary = if dry_run {
        None
    } else {
        Some(apply(root, &plan, &config).context("failed to apply update")?)
    };

    if json {
        print_json(&UpdateReport {
            dry_run,
            plan: &plan,
            summary: summary.as_ref(),
        })?;
    } else {
        print_plan(root, &plan, dry_run);
        if !plan.has_writes() {
            println!("\nAlready up to date.");
        }
        if let Some(s) = &summary {
            println!(
                "\nUpdated to v{target_version}: {} created, {} replaced, {} merged, {} skipped, {} conflicted.",
                s.created,
                s.replaced,
                s.merged,
                s.skipped,
                s.conflicted.len()
            );
        }
    }

    let conflicts = plan.conflicts();
    if !conflicts.is_empty() {
        let verb = if dry_run { "would have" } else { "have" };
        anyhow::bail!(
            "{} file(s) {verb} conflict markers: {}",
            conflicts.len(),
            conflicts.join(", ")
        );
    }
    Ok(())
}

fn print_plan(root: &Path, plan: &UpdatePlan, dry_run: bool) {
    let heading = if dry_run { "Planned update" } else { "Updating" };
    println!("{heading} in: {}", root.display());
    println!("  target: v{}\n", plan.target_version);

    let rows: Vec<Vec<String>> = plan
        .entries
        .iter()
        .map(|e| {
            vec![
                e.path.clone(),
                e.category.to_string(),
                e.outcome.label().to_string(),
                detail(&e.outcome),
            ]
        })
        .collect();
    print_table(&["PATH", "CATEGORY", "OUTCOME", "DETAIL"], &rows);
}

fn detail(outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Skip {
            reason: SkipReason::UpToDate,
        } => "up to date".to_string(),
        FileOutcome::Skip {
            reason: SkipReason::UserOwned,
        } => "team-owned".to_string(),
        FileOutcome::Skip {
            reason: SkipReason::NotText,
        } => "not UTF-8 text".to_string(),
        FileOutcome::Conflict { conflicts, .. } => format!("{conflicts} conflict block(s)"),
        _ => String::new(),
    }
}
