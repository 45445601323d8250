//! Three-way merge of a user's file against new framework content.
//!
//! Only the checksum of the last framework version is guaranteed to be
//! known, so the default merge compares `current` against `incoming`
//! directly and turns every differing hunk into a conflict block. When the
//! baseline text itself was retained (and still matches the checksum) a
//! real diff3 merge runs instead and disjoint edits combine cleanly.

use crate::checksum::Checksum;
use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffTag};
use std::fmt;

pub const CONFLICT_CURRENT: &str = "<<<<<<< CURRENT";
pub const CONFLICT_SEPARATOR: &str = "=======";
pub const CONFLICT_INCOMING: &str = ">>>>>>> INCOMING";

// ---------------------------------------------------------------------------
// MergeAction / MergeResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAction {
    Replace,
    Skip,
    Merge,
    Conflict,
}

impl MergeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeAction::Replace => "replace",
            MergeAction::Skip => "skip",
            MergeAction::Merge => "merge",
            MergeAction::Conflict => "conflict",
        }
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`three_way_merge`].
///
/// `has_conflict` is true exactly when the action is `Conflict`, and
/// `content` is present for every action except `Skip`. The constructors
/// are the only way to build one, so both hold by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    action: MergeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    has_conflict: bool,
}

impl MergeResult {
    fn skip() -> Self {
        Self {
            action: MergeAction::Skip,
            content: None,
            has_conflict: false,
        }
    }

    fn replace(content: String) -> Self {
        Self {
            action: MergeAction::Replace,
            content: Some(content),
            has_conflict: false,
        }
    }

    fn merged(content: String) -> Self {
        Self {
            action: MergeAction::Merge,
            content: Some(content),
            has_conflict: false,
        }
    }

    fn conflict(content: String) -> Self {
        Self {
            action: MergeAction::Conflict,
            content: Some(content),
            has_conflict: true,
        }
    }

    pub fn action(&self) -> MergeAction {
        self.action
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn into_content(self) -> Option<String> {
        self.content
    }

    pub fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    /// Number of conflict blocks in the content.
    pub fn conflict_count(&self) -> usize {
        self.content.as_deref().map_or(0, conflict_blocks)
    }
}

/// Number of `<<<<<<< CURRENT` lines in `text`.
pub fn conflict_blocks(text: &str) -> usize {
    text.lines().filter(|l| *l == CONFLICT_CURRENT).count()
}

/// True if `text` still contains conflict marker lines from a previous merge.
pub fn has_conflict_markers(text: &str) -> bool {
    text.lines()
        .any(|l| l == CONFLICT_CURRENT || l == CONFLICT_INCOMING)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Decide how to bring `current` up to `incoming`, given the checksum of the
/// framework content the user last received.
///
/// 1. identical content: skip
/// 2. `current` still matches the checksum: replace with `incoming`
/// 3. otherwise merge, falling back to conflict blocks for any hunk that
///    cannot be attributed safely
pub fn three_way_merge(original: &Checksum, current: &str, incoming: &str) -> MergeResult {
    three_way_merge_with_base(original, None, current, incoming)
}

/// Same as [`three_way_merge`], but uses the retained baseline text for a
/// diff3 merge when it hashes to `original`. A missing or stale baseline
/// falls back to checksum-only merging.
pub fn three_way_merge_with_base(
    original: &Checksum,
    base: Option<&str>,
    current: &str,
    incoming: &str,
) -> MergeResult {
    if current == incoming {
        return MergeResult::skip();
    }
    if original.matches(current) {
        return MergeResult::replace(incoming.to_string());
    }
    if original.matches(incoming) {
        // Framework side is unchanged; the user's edits are the only change.
        return MergeResult::merged(current.to_string());
    }
    match base.filter(|b| original.matches(b)) {
        Some(base) => merge_with_base(base, current, incoming),
        None => merge_without_base(current, incoming),
    }
}

// ---------------------------------------------------------------------------
// Checksum-only merge
// ---------------------------------------------------------------------------

/// Line terminators are ignored when comparing, so CRLF/LF or final-newline
/// differences alone do not conflict. Equal runs are taken from `current`.
fn merge_without_base(current: &str, incoming: &str) -> MergeResult {
    let cur: Vec<&str> = current.split_inclusive('\n').collect();
    let inc: Vec<&str> = incoming.split_inclusive('\n').collect();
    let cur_keys: Vec<&str> = cur.iter().map(|l| line_key(l)).collect();
    let inc_keys: Vec<&str> = inc.iter().map(|l| line_key(l)).collect();

    let mut out = String::with_capacity(current.len() + incoming.len());
    let mut conflicts = 0;
    let mut pending: Option<(usize, usize, usize, usize)> = None;

    for op in capture_diff_slices(Algorithm::Myers, &cur_keys, &inc_keys) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            if let Some((cs, ce, is, ie)) = pending.take() {
                push_conflict(&mut out, &cur[cs..ce], &inc[is..ie]);
                conflicts += 1;
            }
            push_lines(&mut out, &cur[old]);
            continue;
        }
        pending = Some(match pending {
            Some((cs, _, is, _)) => (cs, old.end, is, new.end),
            None => (old.start, old.end, new.start, new.end),
        });
    }
    if let Some((cs, ce, is, ie)) = pending {
        push_conflict(&mut out, &cur[cs..ce], &inc[is..ie]);
        conflicts += 1;
    }
    let out = with_line_ending(out, line_ending(current));

    if conflicts == 0 {
        MergeResult::merged(out)
    } else {
        MergeResult::conflict(out)
    }
}

fn line_key(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn same_keys(a: &[&str], b: &[&str]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| line_key(x) == line_key(y))
}

/// Terminator of the first line of `text`; LF when there is none.
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(i) if text[..i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// Rewrite every terminated line of `out` to end with `eol`, so merged
/// content and conflict markers follow the line endings of `current`.
fn with_line_ending(out: String, eol: &str) -> String {
    if eol == "\n" {
        return out;
    }
    let mut fixed = String::with_capacity(out.len() + out.len() / 16);
    for line in out.split_inclusive('\n') {
        match line.strip_suffix('\n') {
            Some(body) => {
                fixed.push_str(body.strip_suffix('\r').unwrap_or(body));
                fixed.push_str(eol);
            }
            None => fixed.push_str(line),
        }
    }
    fixed
}

// ---------------------------------------------------------------------------
// diff3 merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Current,
    Incoming,
}

/// A change to the base: lines `start..end` of the base become `lines`.
#[derive(Debug)]
struct Hunk<'a> {
    side: Side,
    start: usize,
    end: usize,
    lines: &'a [&'a str],
}

fn changes<'a>(side: Side, base_keys: &[&str], other: &'a [&'a str]) -> Vec<Hunk<'a>> {
    let other_keys: Vec<&str> = other.iter().map(|l| line_key(l)).collect();
    let mut hunks: Vec<Hunk<'a>> = Vec::new();
    let mut pending: Option<(usize, usize, usize, usize)> = None;
    let flush = |p: (usize, usize, usize, usize), hunks: &mut Vec<Hunk<'a>>| {
        hunks.push(Hunk {
            side,
            start: p.0,
            end: p.1,
            lines: &other[p.2..p.3],
        });
    };
    for op in capture_diff_slices(Algorithm::Myers, base_keys, &other_keys) {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            if let Some(p) = pending.take() {
                flush(p, &mut hunks);
            }
            continue;
        }
        pending = Some(match pending {
            Some((bs, _, os, _)) => (bs, old.end, os, new.end),
            None => (old.start, old.end, new.start, new.end),
        });
    }
    if let Some(p) = pending {
        flush(p, &mut hunks);
    }
    hunks
}

/// Apply one side's hunks to `base[start..end]`.
fn render<'a>(base: &[&'a str], start: usize, end: usize, hunks: &[&Hunk<'a>]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut pos = start;
    for h in hunks {
        out.extend_from_slice(&base[pos..h.start]);
        out.extend_from_slice(h.lines);
        pos = h.end;
    }
    out.extend_from_slice(&base[pos..end]);
    out
}

/// Hunks from both sides are grouped when their base ranges overlap or touch;
/// a group edited by both sides conflicts unless both produce the same lines.
fn merge_with_base(base: &str, current: &str, incoming: &str) -> MergeResult {
    let base_lines: Vec<&str> = base.split_inclusive('\n').collect();
    let cur: Vec<&str> = current.split_inclusive('\n').collect();
    let inc: Vec<&str> = incoming.split_inclusive('\n').collect();
    let base_keys: Vec<&str> = base_lines.iter().map(|l| line_key(l)).collect();

    let mut all = changes(Side::Current, &base_keys, &cur);
    all.extend(changes(Side::Incoming, &base_keys, &inc));
    all.sort_by_key(|h| (h.start, h.end));

    let mut out = String::with_capacity(current.len().max(incoming.len()));
    let mut conflicts = 0;
    let mut pos = 0;
    let mut i = 0;

    while i < all.len() {
        let start = all[i].start;
        let mut end = all[i].end;
        let mut j = i + 1;
        while j < all.len() && all[j].start <= end {
            end = end.max(all[j].end);
            j += 1;
        }

        push_lines(&mut out, &base_lines[pos..start]);

        let group = &all[i..j];
        let ours: Vec<&Hunk> = group.iter().filter(|h| h.side == Side::Current).collect();
        let theirs: Vec<&Hunk> = group.iter().filter(|h| h.side == Side::Incoming).collect();

        if theirs.is_empty() {
            push_lines(&mut out, &render(&base_lines, start, end, &ours));
        } else if ours.is_empty() {
            push_lines(&mut out, &render(&base_lines, start, end, &theirs));
        } else {
            let ours = render(&base_lines, start, end, &ours);
            let theirs = render(&base_lines, start, end, &theirs);
            if same_keys(&ours, &theirs) {
                push_lines(&mut out, &ours);
            } else {
                push_conflict(&mut out, &ours, &theirs);
                conflicts += 1;
            }
        }

        pos = end;
        i = j;
    }
    push_lines(&mut out, &base_lines[pos..]);
    let out = with_line_ending(out, line_ending(current));

    if conflicts == 0 {
        MergeResult::merged(out)
    } else {
        MergeResult::conflict(out)
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn push_lines(out: &mut String, lines: &[&str]) {
    for line in lines {
        out.push_str(line);
    }
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_marker(out: &mut String, marker: &str) {
    ensure_newline(out);
    out.push_str(marker);
    out.push('\n');
}

fn push_conflict(out: &mut String, current: &[&str], incoming: &[&str]) {
    push_marker(out, CONFLICT_CURRENT);
    push_lines(out, current);
    push_marker(out, CONFLICT_SEPARATOR);
    push_lines(out, incoming);
    push_marker(out, CONFLICT_INCOMING);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
