use crate::output::print_json;
use aif_core::sections::{assemble_sections, parse_sections};
use anyhow::Context;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SectionsSubcommand {
    /// Split a document into its framework and team regions
    Parse { file: PathBuf },

    /// Build a sectioned document from framework and team content
    Assemble {
        /// Version written into the framework marker
        #[arg(long)]
        framework_version: String,

        /// File holding the framework content
        #[arg(long)]
        framework: PathBuf,

        /// File holding the team content (default: placeholder)
        #[arg(long)]
        team: Option<PathBuf>,
    },
}

pub fn run(subcmd: SectionsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SectionsSubcommand::Parse { file } => parse(&file, json),
        SectionsSubcommand::Assemble {
            framework_version,
            framework,
            team,
        } => assemble(&framework_version, &framework, team.as_deref(), json),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse(file: &Path, json: bool) -> anyhow::Result<()> {
    let sections = parse_sections(&read(file)?);
    if json {
        return print_json(&sections);
    }

    match &sections.version {
        Some(v) => println!("version: {v}"),
        None => println!("version: (legacy, no section markers)"),
    }
    println!("\n--- framework ---\n{}", sections.framework);
    println!("--- team ---\n{}", sections.team);
    Ok(())
}

fn assemble(version: &str, framework: &Path, team: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let framework = read(framework)?;
    let team = team.map(read).transpose()?.unwrap_or_default();
    let doc = assemble_sections(version, &framework, &team);
    if json {
        return print_json(&serde_json::json!({ "content": doc }));
    }
    print!("{doc}");
    Ok(())
}
