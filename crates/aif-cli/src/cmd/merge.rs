use crate::output::print_json;
use aif_core::checksum::Checksum;
use aif_core::io::atomic_write;
use aif_core::merge::{three_way_merge_with_base, MergeAction};
use anyhow::Context;
use std::path::Path;

/// `aif merge`: merge one file by hand. Prints the merged content, or
/// writes it back to CURRENT with `--write`.
pub fn run(
    checksum: &str,
    base: Option<&Path>,
    current: &Path,
    incoming: &Path,
    write: bool,
    json: bool,
) -> anyhow::Result<()> {
    let original: Checksum = checksum.parse().context("bad --checksum")?;
    let base = base.map(read).transpose()?;
    let current_text = read(current)?;
    let incoming_text = read(incoming)?;

    let result = three_way_merge_with_base(&original, base.as_deref(), &current_text, &incoming_text);

    if write {
        if let Some(content) = result.content() {
            atomic_write(current, content.as_bytes())
                .with_context(|| format!("failed to write {}", current.display()))?;
        }
    }

    if json {
        print_json(&result)?;
    } else if write {
        println!("{}: {}", current.display(), result.action());
    } else if let Some(content) = result.content() {
        print!("{content}");
    }

    if result.action() == MergeAction::Conflict {
        anyhow::bail!(
            "{} conflict block(s) in {}; resolve the markers by hand",
            result.conflict_count(),
            current.display()
        );
    }
    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
