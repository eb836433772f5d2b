// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact Store: deterministic path generation, atomic write, content
//! hashing, optional gzip, and unified-diff generation (spec §4.4).

use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const MAX_COMPARE_BYTES: usize = 1024 * 1024;
const MAX_COMPARE_LINES: usize = 10_000;
const MAX_DIFF_OUTPUT_LINES: usize = 5_000;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a successful `persist` (spec §4.4 step 5).
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    pub size_bytes: i64,
    pub sha256: String,
}

/// One changed/unchanged line inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeTag {
    Added,
    Removed,
    Context,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub tag: ChangeTag,
    pub line: String,
}

/// A contiguous block of changed lines, introduced by an `@@` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hunk {
    pub header: String,
    pub changes: Vec<Change>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub total_changes: usize,
    pub has_changes: bool,
}

/// Full comparison result for `compare` (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffReport {
    pub summary: DiffSummary,
    pub hunks: Vec<Hunk>,
    pub raw_diff: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompareOptions {
    pub ignore_whitespace: bool,
    pub ignore_case: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace: true,
            ignore_case: false,
        }
    }
}

/// Filesystem-backed store rooted at `root` (spec §3 path layout).
#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    compress: bool,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, compress: bool) -> Self {
        Self {
            root: root.into(),
            compress,
        }
    }

    /// `<root>/<device_slug>/<yyyymmdd_HHMMSS>_<command_slug>.txt[.gz]` (spec §3).
    pub fn artifact_path(&self, device_slug: &str, started_at: DateTime<Utc>, command: &str) -> PathBuf {
        let ts = started_at.format("%Y%m%d_%H%M%S");
        let command_slug = slugify(command);
        let ext = if self.compress { "txt.gz" } else { "txt" };
        self.root
            .join(device_slug)
            .join(format!("{ts}_{command_slug}.{ext}"))
    }

    /// Writes `content` to a temp sibling file, fsyncs, then atomically
    /// renames into place; gzips and removes the plain file when compression
    /// is enabled. Hashing is always over the canonical uncompressed bytes.
    pub fn persist(
        &self,
        device_slug: &str,
        started_at: DateTime<Utc>,
        command: &str,
        content: &str,
    ) -> Result<PersistedArtifact, ArtifactError> {
        let final_path = self.artifact_path(device_slug, started_at, command);
        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let sha256 = hex_sha256(content.as_bytes());

        let plain_path = final_path.with_extension("").with_extension("txt");
        let tmp_path = plain_path.with_extension("txt.tmp");
        {
            let mut tmp = std::fs::File::create(&tmp_path)?;
            tmp.write_all(content.as_bytes())?;
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, &plain_path)?;

        let size_bytes = if self.compress {
            let gz_path = plain_path.with_extension("txt.gz");
            {
                let gz_file = std::fs::File::create(&gz_path)?;
                let mut encoder = GzEncoder::new(gz_file, Compression::default());
                encoder.write_all(content.as_bytes())?;
                encoder.finish()?;
            }
            std::fs::remove_file(&plain_path)?;
            std::fs::metadata(&gz_path)?.len() as i64
        } else {
            std::fs::metadata(&plain_path)?.len() as i64
        };

        Ok(PersistedArtifact {
            path: final_path,
            size_bytes,
            sha256,
        })
    }

    /// Reads an artifact back as text, trying UTF-8 then GBK then latin-1
    /// (spec §7 encoding policy — latin-1 always succeeds byte-for-byte).
    pub fn read_text(&self, path: &Path) -> Result<String, ArtifactError> {
        let bytes = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            let file = std::fs::File::open(path)?;
            let mut decoder = flate2::read::GzDecoder::new(file);
            let mut out = Vec::new();
            std::io::Read::read_to_end(&mut decoder, &mut out)?;
            out
        } else {
            std::fs::read(path)?
        };
        Ok(decode_with_fallback(&bytes))
    }

    /// Produces a unified diff against the prior artifact's content, writing
    /// a sibling `.diff` file next to `current_path` when the diff is
    /// non-empty (spec §4.4 `diff`).
    pub fn write_diff(
        &self,
        previous_name: &str,
        previous_content: &str,
        current_name: &str,
        current_content: &str,
        current_path: &Path,
    ) -> Result<Option<PathBuf>, ArtifactError> {
        let text = unified_diff(
            previous_content,
            current_content,
            &format!("previous_{previous_name}"),
            &format!("current_{current_name}"),
        );
        if text.is_empty() {
            return Ok(None);
        }
        let diff_path = diff_sibling_path(current_path);
        std::fs::write(&diff_path, &text)?;
        Ok(Some(diff_path))
    }

    /// Full comparison between two on-disk artifacts (spec §4.4 `compare`).
    pub fn compare(&self, path_a: &Path, path_b: &Path, options: CompareOptions) -> DiffReport {
        let content_a = match self.read_text(path_a) {
            Ok(c) => c,
            Err(e) => return too_large_or_error(e.to_string()),
        };
        let content_b = match self.read_text(path_b) {
            Ok(c) => c,
            Err(e) => return too_large_or_error(e.to_string()),
        };
        let label_a = file_label(path_a);
        let label_b = file_label(path_b);
        compare_text(&content_a, &content_b, &label_a, &label_b, options)
    }

    /// Cheap "latest two" comparison: line-count delta only, no real diff
    /// (spec §4.4 quick mode).
    pub fn compare_quick(&self, path_a: &Path, path_b: &Path) -> DiffReport {
        let content_a = self.read_text(path_a).unwrap_or_default();
        let content_b = self.read_text(path_b).unwrap_or_default();
        if content_a.len() > MAX_COMPARE_BYTES || content_b.len() > MAX_COMPARE_BYTES {
            return DiffReport {
                error: Some("too large".to_string()),
                ..Default::default()
            };
        }
        let lines_a = content_a.lines().count();
        let lines_b = content_b.lines().count();
        let delta = lines_b as i64 - lines_a as i64;
        let summary = DiffSummary {
            added: delta.max(0) as usize,
            removed: (-delta).max(0) as usize,
            modified: 0,
            total_changes: delta.unsigned_abs() as usize,
            has_changes: delta != 0,
        };
        DiffReport {
            raw_diff: format!("配置文件行数变化: {lines_a} -> {lines_b}"),
            summary,
            hunks: Vec::new(),
            error: None,
        }
    }
}

fn too_large_or_error(_err: String) -> DiffReport {
    DiffReport {
        error: Some("too large".to_string()),
        ..Default::default()
    }
}

/// Normalizes path/command text into a filesystem-safe slug: spaces and
/// hyphens become underscores (spec §3).
fn slugify(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact")
        .to_string()
}

fn diff_sibling_path(artifact_path: &Path) -> PathBuf {
    let file_name = artifact_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("artifact");
    let stem = file_name
        .strip_suffix(".txt.gz")
        .or_else(|| file_name.strip_suffix(".txt"))
        .unwrap_or(file_name);
    artifact_path.with_file_name(format!("{stem}.diff"))
}

fn decode_with_fallback(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    let (cow, _, had_errors) = encoding_rs::GBK.decode(bytes);
    if !had_errors {
        return cow.into_owned();
    }
    let (cow, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    cow.into_owned()
}

fn normalize_line(line: &str, options: CompareOptions) -> String {
    let mut normalized = line.to_string();
    if options.ignore_whitespace {
        let collapsed: Vec<&str> = normalized.split_whitespace().collect();
        normalized = collapsed.join(" ");
    }
    if options.ignore_case {
        normalized = normalized.to_lowercase();
    }
    normalized
}

/// Compares `a` and `b` honoring `options`, enforcing size/line guards,
/// and parsing the unified diff into hunks with summary counts (spec §4.4).
fn compare_text(a: &str, b: &str, label_a: &str, label_b: &str, options: CompareOptions) -> DiffReport {
    if a.len() > MAX_COMPARE_BYTES || b.len() > MAX_COMPARE_BYTES {
        return DiffReport {
            error: Some("too large".to_string()),
            ..Default::default()
        };
    }

    let lines_a: Vec<&str> = a.lines().take(MAX_COMPARE_LINES).collect();
    let lines_b: Vec<&str> = b.lines().take(MAX_COMPARE_LINES).collect();

    let (cmp_a, cmp_b): (String, String) = if options.ignore_whitespace || options.ignore_case {
        (
            lines_a
                .iter()
                .map(|l| normalize_line(l, options))
                .collect::<Vec<_>>()
                .join("\n"),
            lines_b
                .iter()
                .map(|l| normalize_line(l, options))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    } else {
        (lines_a.join("\n"), lines_b.join("\n"))
    };

    // The normalized text drives which lines are considered equal; the
    // emitted diff itself still carries the original content (spec §4.4).
    let text_diff = similar::TextDiff::from_lines(&cmp_a, &cmp_b);
    let mut raw_diff_lines = Vec::new();
    let mut hunks = Vec::new();
    let mut added = 0usize;
    let mut removed = 0usize;
    let grouped = text_diff.grouped_ops(3);

    if !grouped.is_empty() {
        raw_diff_lines.push(format!("--- {label_a}"));
        raw_diff_lines.push(format!("+++ {label_b}"));
    }

    for group in &grouped {
        let old_start = group.iter().map(|op| op.old_range().start).min().unwrap_or(0);
        let old_end = group.iter().map(|op| op.old_range().end).max().unwrap_or(0);
        let new_start = group.iter().map(|op| op.new_range().start).min().unwrap_or(0);
        let new_end = group.iter().map(|op| op.new_range().end).max().unwrap_or(0);
        let header = format!(
            "@@ -{},{} +{},{} @@",
            old_start + 1,
            old_end.saturating_sub(old_start),
            new_start + 1,
            new_end.saturating_sub(new_start)
        );
        raw_diff_lines.push(header.clone());

        let mut changes = Vec::new();
        for op in group {
            for change in text_diff.iter_changes(op) {
                let (tag, prefix) = match change.tag() {
                    similar::ChangeTag::Delete => (ChangeTag::Removed, "-"),
                    similar::ChangeTag::Insert => (ChangeTag::Added, "+"),
                    similar::ChangeTag::Equal => (ChangeTag::Context, " "),
                };
                match tag {
                    ChangeTag::Added => added += 1,
                    ChangeTag::Removed => removed += 1,
                    ChangeTag::Context => {}
                }
                // Re-source the original (non-normalized) line by position,
                // falling back to the normalized text if out of range.
                let original = match change.tag() {
                    similar::ChangeTag::Delete => change
                        .old_index()
                        .and_then(|i| lines_a.get(i))
                        .copied()
                        .unwrap_or_else(|| change.value().trim_end_matches('\n')),
                    similar::ChangeTag::Insert => change
                        .new_index()
                        .and_then(|i| lines_b.get(i))
                        .copied()
                        .unwrap_or_else(|| change.value().trim_end_matches('\n')),
                    similar::ChangeTag::Equal => change
                        .old_index()
                        .and_then(|i| lines_a.get(i))
                        .copied()
                        .unwrap_or_else(|| change.value().trim_end_matches('\n')),
                };
                raw_diff_lines.push(format!("{prefix}{original}"));
                changes.push(Change {
                    tag,
                    line: original.to_string(),
                });
            }
        }
        hunks.push(Hunk { header, changes });
    }

    raw_diff_lines.truncate(MAX_DIFF_OUTPUT_LINES);
    let modified = added.min(removed);
    let total_changes = hunks.iter().map(|h| h.changes.len()).sum::<usize>().min(raw_diff_lines.len());

    DiffReport {
        summary: DiffSummary {
            added: added - modified,
            removed: removed - modified,
            modified,
            total_changes,
            has_changes: !hunks.is_empty(),
        },
        hunks,
        raw_diff: raw_diff_lines.join("\n"),
        error: None,
    }
}

/// Plain unified diff (no normalization, no guards) used for the `.diff`
/// sibling file written by `write_diff` (spec §4.4 `diff`).
fn unified_diff(previous: &str, current: &str, previous_label: &str, current_label: &str) -> String {
    similar::TextDiff::from_lines(previous, current)
        .unified_diff()
        .context_radius(3)
        .header(previous_label, current_label)
        .to_string()
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
