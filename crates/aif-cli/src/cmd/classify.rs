use crate::output::{print_json, print_table};
use aif_core::config::{UpdateConfig, WarnLevel};
use anyhow::Context;
use std::path::Path;

/// `aif classify`: category and matching rule for each path, honouring the
/// project's overrides.
pub fn run(root: &Path, paths: &[String], json: bool) -> anyhow::Result<()> {
    let config = UpdateConfig::load(root).context("failed to load update.yaml")?;
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => tracing::error!("{}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }

    let classifier = config.classifier();
    let results: Vec<_> = paths.iter().map(|p| classifier.classify(p)).collect();

    if json {
        return print_json(&results);
    }

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|c| vec![c.path.clone(), c.category.to_string(), c.rule.clone()])
        .collect();
    print_table(&["PATH", "CATEGORY", "RULE"], &rows);
    Ok(())
}
