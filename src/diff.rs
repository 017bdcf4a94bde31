//! Character-level inline diff between a sentence and its correction.
//!
//! Output uses `[-deleted-]` and `[+inserted+]` markers around changed
//! runs; unchanged text passes through as-is. Stripping the markers keeps
//! the original (drop insertions) or the corrected text (drop deletions).

use similar::{capture_diff_slices, Algorithm, DiffOp, DiffTag};

/// Render an inline diff. A missing, empty or identical correction gives
/// an empty string.
pub fn render_diff(original: &str, corrected: Option<&str>) -> String {
    let Some(corrected) = corrected else {
        return String::new();
    };
    if corrected.is_empty() || original == corrected {
        return String::new();
    }

    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = corrected.chars().collect();
    let ops = capture_diff_slices(Algorithm::Lcs, &old, &new);

    let mut out = String::with_capacity(original.len() + corrected.len() + 8);
    for op in &ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let removed: String = old[old_range].iter().collect();
        let added: String = new[new_range].iter().collect();
        match tag {
            DiffTag::Equal => out.push_str(&removed),
            DiffTag::Delete => push_deleted(&mut out, &removed),
            DiffTag::Insert => push_inserted(&mut out, &added),
            DiffTag::Replace => {
                push_deleted(&mut out, &removed);
                push_inserted(&mut out, &added);
            }
        }
    }
    out
}

fn push_deleted(out: &mut String, text: &str) {
    out.push_str("[-");
    out.push_str(text);
    out.push_str("-]");
}

fn push_inserted(out: &mut String, text: &str) {
    out.push_str("[+");
    out.push_str(text);
    out.push_str("+]");
}

/// Edit counts between a sentence and its correction, in chars.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffStats {
    pub insertions: usize,
    pub deletions: usize,
    pub replacements: usize,
    /// Share of unchanged chars over the longer input, in `[0, 1]`.
    pub similarity: f64,
}

pub fn diff_stats(original: &str, corrected: &str) -> DiffStats {
    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = corrected.chars().collect();
    let longest = old.len().max(new.len());
    if longest == 0 {
        return DiffStats {
            similarity: 1.0,
            ..Default::default()
        };
    }

    let mut stats = DiffStats::default();
    let mut unchanged = 0usize;
    for op in capture_diff_slices(Algorithm::Lcs, &old, &new) {
        match op {
            DiffOp::Equal { len, .. } => unchanged += len,
            DiffOp::Delete { old_len, .. } => stats.deletions += old_len,
            DiffOp::Insert { new_len, .. } => stats.insertions += new_len,
            DiffOp::Replace {
                old_len, new_len, ..
            } => stats.replacements += old_len.max(new_len),
        }
    }
    stats.similarity = unchanged as f64 / longest as f64;
    stats
}
