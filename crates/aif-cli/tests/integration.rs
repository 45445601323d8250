#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn aif(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aif").unwrap();
    cmd.current_dir(dir.path()).env("AIF_ROOT", dir.path());
    cmd
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(dir: &Path, rel: &str) -> String {
    std::fs::read_to_string(dir.join(rel)).unwrap()
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// aif classify
// ---------------------------------------------------------------------------

#[test]
fn classify_prints_table() {
    let dir = TempDir::new().unwrap();
    aif(&dir)
        .args(["classify", "knowledge/x.md", "hooks/pre.sh", "CLAUDE.md", "lefthook.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("user-owned"))
        .stdout(predicate::str::contains("framework-only"))
        .stdout(predicate::str::contains("compiled-output"))
        .stdout(predicate::str::contains("user-customizable"));
}

#[test]
fn classify_json_honours_overrides() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        ".ai-framework/update.yaml",
        "overrides:\n  - prefix: docs/generated/\n    category: framework-only\n",
    );
    let v = json_stdout(aif(&dir).args(["--json", "classify", "./docs/generated/a.md", "README.md"]));
    assert_eq!(v[0]["path"], "docs/generated/a.md");
    assert_eq!(v[0]["category"], "framework-only");
    assert_eq!(v[0]["rule"], "override:docs/generated/");
    assert_eq!(v[1]["category"], "user-customizable");
    assert_eq!(v[1]["rule"], "default");
}

#[test]
fn classify_requires_a_path() {
    let dir = TempDir::new().unwrap();
    aif(&dir).arg("classify").assert().failure();
}

// ---------------------------------------------------------------------------
// aif sections
// ---------------------------------------------------------------------------

#[test]
fn sections_assemble_then_parse() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "fw.md", "# Rules");
    write(dir.path(), "team.md", "use pnpm");

    let out = aif(&dir)
        .args([
            "sections",
            "assemble",
            "--framework-version",
            "2.1.0",
            "--framework",
            "fw.md",
            "--team",
            "team.md",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let doc = String::from_utf8(out.stdout).unwrap();
    assert!(doc.starts_with("<!-- BEGIN:AI-FRAMEWORK:v2.1.0 -->\n"));
    assert!(doc.contains("<!-- BEGIN:TEAM -->\n\nuse pnpm\n\n<!-- END:TEAM -->"));

    write(dir.path(), "CLAUDE.md", &doc);
    let v = json_stdout(aif(&dir).args(["-j", "sections", "parse", "CLAUDE.md"]));
    assert_eq!(v["version"], "2.1.0");
    assert_eq!(v["framework"], "# Rules");
    assert_eq!(v["team"], "use pnpm");
}

#[test]
fn sections_parse_legacy_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "AGENTS.md", "# Old agents file\n");
    aif(&dir)
        .args(["sections", "parse", "AGENTS.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy"))
        .stdout(predicate::str::contains("# Old agents file"));
}

#[test]
fn sections_parse_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    aif(&dir)
        .args(["sections", "parse", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

// ---------------------------------------------------------------------------
// aif checksum / aif merge
// ---------------------------------------------------------------------------

#[test]
fn checksum_is_sha256_hex() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", "hello\n");
    aif(&dir)
        .args(["checksum", "a.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03",
        ));
}

const HELLO_SHA: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

#[test]
fn merge_replaces_unmodified_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "current.txt", "hello\n");
    write(dir.path(), "incoming.txt", "hello world\n");
    aif(&dir)
        .args(["merge", "--checksum", HELLO_SHA, "current.txt", "incoming.txt"])
        .assert()
        .success()
        .stdout("hello world\n");
}

#[test]
fn merge_conflict_fails_and_writes_markers() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "current.txt", "line1\nmine\nline3\n");
    write(dir.path(), "incoming.txt", "line1\ntheirs\nline3\n");
    aif(&dir)
        .args([
            "merge",
            "--checksum",
            &format!("sha256:{HELLO_SHA}"),
            "--write",
            "current.txt",
            "incoming.txt",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("conflict"))
        .stderr(predicate::str::contains("1 conflict block(s)"));

    let merged = read(dir.path(), "current.txt");
    assert_eq!(
        merged,
        "line1\n<<<<<<< CURRENT\nmine\n=======\ntheirs\n>>>>>>> INCOMING\nline3\n"
    );
}

#[test]
fn merge_with_base_combines_disjoint_edits() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.txt", "hello\n");
    write(dir.path(), "current.txt", "# mine\nhello\n");
    write(dir.path(), "incoming.txt", "hello\n# theirs\n");
    let v = json_stdout(aif(&dir).args([
        "-j",
        "merge",
        "--checksum",
        HELLO_SHA,
        "--base",
        "base.txt",
        "current.txt",
        "incoming.txt",
    ]));
    assert_eq!(v["action"], "merge");
    assert_eq!(v["content"], "# mine\nhello\n# theirs\n");
    assert_eq!(v["has_conflict"], false);
}

#[test]
fn merge_rejects_bad_checksum() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", "a\n");
    aif(&dir)
        .args(["merge", "--checksum", "xyz", "a.txt", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid checksum"));
}

// ---------------------------------------------------------------------------
// aif update
// ---------------------------------------------------------------------------

fn templates(dir: &Path) {
    write(dir, "CLAUDE.md", "# Framework rules v2\n");
    write(dir, "hooks/pre-tool.sh", "echo v2\n");
    write(dir, "knowledge/README.md", "seed\n");
    write(dir, "lefthook.yml", "pre-commit:\n  lint: v2\n");
}

#[test]
fn update_fresh_project() {
    let dir = TempDir::new().unwrap();
    let tpl = TempDir::new().unwrap();
    templates(tpl.path());

    aif(&dir)
        .args(["update", "--target-version", "2.0.0", "--from"])
        .arg(tpl.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("team-owned"));

    let claude = read(dir.path(), "CLAUDE.md");
    assert!(claude.starts_with("<!-- BEGIN:AI-FRAMEWORK:v2.0.0 -->"));
    assert!(claude.contains("# Framework rules v2"));
    assert_eq!(read(dir.path(), "hooks/pre-tool.sh"), "echo v2\n");
    assert!(!dir.path().join("knowledge/README.md").exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&read(dir.path(), ".ai-framework/manifest.json")).unwrap();
    assert_eq!(manifest["version"], "2.0.0");
    assert!(manifest["files"]["lefthook.yml"].is_string());
}

#[test]
fn update_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let tpl = TempDir::new().unwrap();
    templates(tpl.path());

    let v = json_stdout(
        aif(&dir)
            .args(["-j", "update", "--dry-run", "--from"])
            .arg(tpl.path()),
    );
    assert_eq!(v["dry_run"], true);
    assert!(v.get("summary").is_none());
    assert_eq!(v["entries"].as_array().unwrap().len(), 4);
    assert!(!dir.path().join("CLAUDE.md").exists());
    assert!(!dir.path().join(".ai-framework").exists());
}

#[test]
fn update_keeps_team_section_and_reports_conflicts() {
    let dir = TempDir::new().unwrap();
    let tpl = TempDir::new().unwrap();
    templates(tpl.path());
    aif(&dir)
        .args(["update", "--target-version", "2.0.0", "--from"])
        .arg(tpl.path())
        .assert()
        .success();

    // team edits
    let claude = read(dir.path(), "CLAUDE.md").replace(
        "<!-- Add team-specific content below. It is preserved across framework updates. -->",
        "Always run cargo fmt.",
    );
    write(dir.path(), "CLAUDE.md", &claude);
    write(dir.path(), "lefthook.yml", "pre-commit:\n  lint: ours\n");

    // next framework release
    write(tpl.path(), "CLAUDE.md", "# Framework rules v3\n");
    write(tpl.path(), "lefthook.yml", "pre-commit:\n  lint: v3\n");

    aif(&dir)
        .args(["update", "--target-version", "3.0.0", "--from"])
        .arg(tpl.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 conflict block(s)"))
        .stderr(predicate::str::contains("lefthook.yml"));

    let claude = read(dir.path(), "CLAUDE.md");
    assert!(claude.contains("<!-- BEGIN:AI-FRAMEWORK:v3.0.0 -->"));
    assert!(claude.contains("# Framework rules v3"));
    assert!(claude.contains("Always run cargo fmt."));

    let lefthook = read(dir.path(), "lefthook.yml");
    assert!(lefthook.contains("<<<<<<< CURRENT\n  lint: ours\n=======\n  lint: v3\n>>>>>>> INCOMING"));
}

#[test]
fn update_rerun_is_up_to_date_and_skips_binary_templates() {
    let dir = TempDir::new().unwrap();
    let tpl = TempDir::new().unwrap();
    templates(tpl.path());
    std::fs::write(tpl.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0xff]).unwrap();
    aif(&dir)
        .args(["update", "--target-version", "2.0.0", "--from"])
        .arg(tpl.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("not UTF-8 text"));
    assert!(!dir.path().join("logo.png").exists());

    aif(&dir)
        .args(["update", "--target-version", "2.0.0", "--from"])
        .arg(tpl.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Already up to date."));
}

#[test]
fn update_missing_templates_fails() {
    let dir = TempDir::new().unwrap();
    aif(&dir)
        .args(["update", "--from", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("template directory not found"));
}

#[test]
fn update_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let tpl = TempDir::new().unwrap();
    templates(tpl.path());
    write(
        dir.path(),
        ".ai-framework/update.yaml",
        "overrides:\n  - prefix: ./\n    category: user-owned\n",
    );
    aif(&dir)
        .args(["update", "--from"])
        .arg(tpl.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid update.yaml"));
}
