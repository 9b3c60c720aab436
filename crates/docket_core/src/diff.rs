//! crates/docket_core/src/diff.rs
//!
//! Line-oriented diffing between two document contents. The comparison is
//! an LCS-style line diff whose output is a flat list of maximal same-kind
//! runs ("segments"), not context hunks: exactly what the version-compare
//! screen renders.

use similar::{ChangeTag, TextDiff};

/// What happened to the lines of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Unchanged,
    Added,
    Removed,
}

impl SegmentKind {
    /// Wire tag for this kind. These three strings are part of the API
    /// contract and must not change.
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Unchanged => "unchanged",
            SegmentKind::Added => "added",
            SegmentKind::Removed => "removed",
        }
    }
}

/// A maximal run of consecutive lines sharing one [`SegmentKind`].
///
/// `text` keeps the original line terminators, so concatenating segment
/// texts reconstructs the compared inputs byte for byte: every non-removed
/// segment in order is the new content, every non-added segment in order is
/// the old content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    pub text: String,
    pub line_count: usize,
}

/// Aggregate counters displayed next to a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of `Added` segments (runs, not lines).
    pub additions: usize,
    /// Number of `Removed` segments (runs, not lines).
    pub deletions: usize,
    /// See [`legacy_change_count`].
    pub changes: usize,
}

/// Computes the line diff from `old` to `new`.
///
/// Within a replacement the removed run precedes the added run, matching
/// what diff viewers conventionally show.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffSegment> {
    let diff = TextDiff::from_lines(old, new);
    let mut segments: Vec<DiffSegment> = Vec::new();

    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SegmentKind::Unchanged,
            ChangeTag::Delete => SegmentKind::Removed,
            ChangeTag::Insert => SegmentKind::Added,
        };
        match segments.last_mut() {
            // Grow the current run while the tag stays the same.
            Some(last) if last.kind == kind => {
                last.text.push_str(change.value());
                last.line_count += 1;
            }
            _ => segments.push(DiffSegment {
                kind,
                text: change.value().to_string(),
                line_count: 1,
            }),
        }
    }

    segments
}

/// Derives the counters for a segment list produced by [`diff_lines`].
pub fn diff_stats(segments: &[DiffSegment]) -> DiffStats {
    DiffStats {
        additions: segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Added)
            .count(),
        deletions: segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Removed)
            .count(),
        changes: legacy_change_count(segments),
    }
}

/// The "changes" counter as the first web client shipped it: total segment
/// count minus the one unchanged baseline segment, so comparing identical
/// contents reports zero. When a diff holds several separate edit runs this
/// number disagrees with `additions + deletions`; the client renders it
/// anyway, so replace this function only together with the client.
pub fn legacy_change_count(segments: &[DiffSegment]) -> usize {
    segments.len().saturating_sub(1)
}
