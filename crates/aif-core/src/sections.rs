//! Framework/team section markers inside generated instruction files.
//!
//! A sectioned document carries exactly one framework region and one team
//! region:
//!
//! ```text
//! <!-- BEGIN:AI-FRAMEWORK:v1.2.0 -->
//! ...framework-owned...
//! <!-- END:AI-FRAMEWORK -->
//!
//! <!-- BEGIN:TEAM -->
//! ...team-owned...
//! <!-- END:TEAM -->
//! ```
//!
//! Anything else is a legacy document: all of it is framework content and
//! the team region is empty. Parsing never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Marker literals
// ---------------------------------------------------------------------------

/// Opening text of the framework-begin marker; the version follows directly.
pub const FRAMEWORK_BEGIN_OPEN: &str = "<!-- BEGIN:AI-FRAMEWORK:v";
/// Closing text shared by every marker comment.
pub const MARKER_CLOSE: &str = " -->";
pub const FRAMEWORK_END: &str = "<!-- END:AI-FRAMEWORK -->";
pub const TEAM_BEGIN: &str = "<!-- BEGIN:TEAM -->";
pub const TEAM_END: &str = "<!-- END:TEAM -->";

/// Written into an empty team region; parses back to empty team content.
pub const TEAM_PLACEHOLDER: &str =
    "<!-- Add team-specific content below. It is preserved across framework updates. -->";

pub fn framework_begin(version: &str) -> String {
    format!("{FRAMEWORK_BEGIN_OPEN}{version}{MARKER_CLOSE}")
}

static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| {
        let pattern = format!(
            r"^(?:{open}(?P<version>[0-9A-Za-z.+\-]+){close}|(?P<framework_end>{framework_end})|(?P<team_begin>{team_begin})|(?P<team_end>{team_end}))$",
            open = regex::escape(FRAMEWORK_BEGIN_OPEN),
            close = regex::escape(MARKER_CLOSE),
            framework_end = regex::escape(FRAMEWORK_END),
            team_begin = regex::escape(TEAM_BEGIN),
            team_end = regex::escape(TEAM_END),
        );
        Regex::new(&pattern).unwrap()
    })
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    pub framework: String,
    pub team: String,
    /// Version token from the framework-begin marker; `None` for legacy documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Sections {
    pub fn is_sectioned(&self) -> bool {
        self.version.is_some()
    }

    fn legacy(content: &str) -> Self {
        let framework = if content.trim().is_empty() {
            String::new()
        } else {
            content.to_string()
        };
        Sections {
            framework,
            team: String::new(),
            version: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerKind {
    FrameworkBegin,
    FrameworkEnd,
    TeamBegin,
    TeamEnd,
}

/// One marker line: byte offset where the line starts and where it ends
/// (after its line terminator).
#[derive(Debug, Clone)]
struct MarkerHit<'a> {
    kind: MarkerKind,
    start: usize,
    end: usize,
    version: Option<&'a str>,
}

fn scan_markers(content: &str) -> Vec<MarkerHit<'_>> {
    let mut hits = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let Some(caps) = marker_re().captures(line.trim()) else {
            continue;
        };
        let (kind, version) = if let Some(v) = caps.name("version") {
            (MarkerKind::FrameworkBegin, Some(v.as_str()))
        } else if caps.name("framework_end").is_some() {
            (MarkerKind::FrameworkEnd, None)
        } else if caps.name("team_begin").is_some() {
            (MarkerKind::TeamBegin, None)
        } else {
            (MarkerKind::TeamEnd, None)
        };
        hits.push(MarkerHit {
            kind,
            start,
            end: offset,
            version,
        });
    }
    hits
}

/// Split a document into its framework and team regions.
///
/// Well-formed means each marker appears exactly once, in the order
/// framework-begin, framework-end, team-begin, team-end. Any other shape
/// (no markers, a BEGIN without its END, duplicates, wrong order) is treated
/// as a legacy document.
pub fn parse_sections(content: &str) -> Sections {
    let hits = scan_markers(content);
    let order = [
        MarkerKind::FrameworkBegin,
        MarkerKind::FrameworkEnd,
        MarkerKind::TeamBegin,
        MarkerKind::TeamEnd,
    ];
    if hits.len() != order.len() || hits.iter().zip(order).any(|(h, k)| h.kind != k) {
        return Sections::legacy(content);
    }

    let framework = unpad(&content[hits[0].end..hits[1].start]);
    let team = unpad(&content[hits[2].end..hits[3].start]);
    let team = if is_empty_team(&team) {
        String::new()
    } else {
        team
    };

    Sections {
        framework,
        team,
        version: hits[0].version.map(str::to_string),
    }
}

/// Build a sectioned document. Blank team content is replaced by the
/// placeholder comment.
pub fn assemble_sections(version: &str, framework: &str, team: &str) -> String {
    let team_body = if team.trim().is_empty() {
        TEAM_PLACEHOLDER
    } else {
        team
    };
    format!(
        "{begin}\n\n{framework}\n\n{FRAMEWORK_END}\n\n{TEAM_BEGIN}\n\n{team_body}\n\n{TEAM_END}\n",
        begin = framework_begin(version),
    )
}

/// Regenerate a document with new framework content while keeping the team
/// region of `existing` (if any) verbatim.
pub fn carry_team_section(version: &str, framework: &str, existing: Option<&str>) -> String {
    let team = existing
        .map(|doc| parse_sections(doc).team)
        .unwrap_or_default();
    assemble_sections(version, framework, &team)
}

fn is_empty_team(team: &str) -> bool {
    let trimmed = team.trim();
    trimmed.is_empty() || trimmed == TEAM_PLACEHOLDER
}

/// Strip the padding `assemble_sections` puts inside a region: one newline
/// after the BEGIN line and one blank line before the END line. Regions with
/// other spacing were edited by hand and get their blank lines trimmed.
fn unpad(region: &str) -> String {
    if let Some(inner) = region
        .strip_prefix('\n')
        .and_then(|r| r.strip_suffix("\n\n"))
    {
        return inner.to_string();
    }
    trim_blank_lines(region)
}

fn trim_blank_lines(region: &str) -> String {
    let lines: Vec<&str> = region.split_inclusive('\n').collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);
    lines[first..=last]
        .concat()
        .trim_end_matches(|c| c == '\n' || c == '\r')
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
