use crate::output::print_json;
use aif_core::checksum::Checksum;
use anyhow::Context;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let checksum = Checksum::of(&text);
    if json {
        return print_json(&serde_json::json!({
            "path": file.display().to_string(),
            "checksum": checksum,
        }));
    }
    println!("{checksum}  {}", file.display());
    Ok(())
}
