// Copyright 2026 The Multiblame Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `DiffAlgorithm` collaborator (SPEC_FULL.md §1, §6): "consumes two
//! byte sequences, produces an ordered edit list". The core only ever calls
//! this trait; per the spec it is a black-box, so the two implementations
//! here are not required to be bit-for-bit compatible with any particular
//! production histogram/Myers diff, only internally consistent.
//!
//! [`HistogramDiff`] ports the teacher's own word-level histogram diff
//! (`src_teacher/diff.rs`: `Histogram`, `find_lcs`, `unchanged_ranges`) down
//! to line granularity: the LCS-over-unique-elements recursion is identical,
//! only the unit being diffed changes from word ranges to line ranges.
//! [`MyersDiff`] wraps the `similar` crate's Myers implementation, a real
//! dependency already present transitively in the teacher's dev-profile
//! tuning (see DESIGN.md).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Range;

use bstr::BStr;
use bstr::ByteSlice as _;

use crate::config::LineComparator;

/// One diff hunk: lines `[begin_a, end_a)` of the old (parent) side were
/// replaced by lines `[begin_b, end_b)` of the new (child) side. Either
/// range may be empty (a pure insertion or deletion).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edit {
    pub begin_a: u32,
    pub end_a: u32,
    pub begin_b: u32,
    pub end_b: u32,
}

impl Edit {
    pub fn length_b(&self) -> u32 {
        self.end_b - self.begin_b
    }
}

/// The diff collaborator contract.
pub trait DiffAlgorithm: Send + Sync {
    /// `a` is the parent-side content, `b` the child-side content. Returns
    /// edits ordered by `begin_a`/`begin_b` ascending.
    fn diff(&self, cmp: LineComparator, a: &[u8], b: &[u8]) -> Vec<Edit>;
}

/// Byte ranges of each line in `text`, including the trailing `\n` (or the
/// partial final line with none).
pub fn find_line_ranges(text: &[u8]) -> Vec<Range<usize>> {
    text.split_inclusive(|&b| b == b'\n')
        .scan(0, |total, line| {
            let start = *total;
            *total += line.len();
            Some(start..*total)
        })
        .collect()
}

fn line_key<'a>(text: &'a BStr, range: &Range<usize>, cmp: LineComparator) -> &'a BStr {
    let raw = &text[range.clone()];
    match cmp {
        LineComparator::Default => raw,
        LineComparator::WhitespaceIgnoring => raw.trim().into(),
    }
}

struct LineSource<'input, 'aux> {
    text: &'input BStr,
    ranges: &'aux [Range<usize>],
    cmp: LineComparator,
}

impl<'input, 'aux> LineSource<'input, 'aux> {
    fn narrowed(&self, positions: Range<usize>) -> Self {
        Self {
            text: self.text,
            ranges: &self.ranges[positions],
            cmp: self.cmp,
        }
    }

    fn key_at(&self, index: usize) -> &BStr {
        line_key(self.text, &self.ranges[index], self.cmp)
    }
}

struct LineHistogram<'a> {
    word_to_positions: HashMap<&'a BStr, Vec<usize>>,
    count_to_words: BTreeMap<usize, Vec<&'a BStr>>,
}

impl<'a> LineHistogram<'a> {
    fn calculate(source: &LineSource<'a, '_>, max_occurrences: usize) -> Self {
        let mut word_to_positions: HashMap<&BStr, Vec<usize>> = HashMap::new();
        for i in 0..source.ranges.len() {
            let key = source.key_at(i);
            let positions = word_to_positions.entry(key).or_default();
            if positions.len() <= max_occurrences {
                positions.push(i);
            }
        }
        let mut count_to_words: BTreeMap<usize, Vec<&BStr>> = BTreeMap::new();
        for (word, positions) in &word_to_positions {
            count_to_words.entry(positions.len()).or_default().push(word);
        }
        Self {
            word_to_positions,
            count_to_words,
        }
    }
}

/// Longest common subsequence of an array where `input[i]` is the position
/// in the left sequence of the `i`th element of the right sequence. Ported
/// unchanged (algorithmically) from `src_teacher/diff.rs::find_lcs`.
fn find_lcs(input: &[usize]) -> Vec<(usize, usize)> {
    if input.is_empty() {
        return vec![];
    }
    let mut chain = vec![(0usize, 0usize, usize::MAX); input.len()];
    let mut global_longest = 0;
    let mut global_longest_right_pos = 0;
    for (right_pos, &left_pos) in input.iter().enumerate() {
        let mut longest_from_here = 1;
        let mut previous_right_pos = usize::MAX;
        for i in (0..right_pos).rev() {
            let (previous_len, previous_left_pos, _) = chain[i];
            if previous_left_pos < left_pos {
                let len = previous_len + 1;
                if len > longest_from_here {
                    longest_from_here = len;
                    previous_right_pos = i;
                    if len > global_longest {
                        global_longest = len;
                        global_longest_right_pos = right_pos;
                        break;
                    }
                }
            }
        }
        chain[right_pos] = (longest_from_here, left_pos, previous_right_pos);
    }
    let mut result = vec![];
    let mut right_pos = global_longest_right_pos;
    loop {
        let (_, left_pos, previous_right_pos) = chain[right_pos];
        result.push((left_pos, right_pos));
        if previous_right_pos == usize::MAX {
            break;
        }
        right_pos = previous_right_pos;
    }
    result.reverse();
    result
}

/// Finds index pairs `(a_index, b_index)` of lines considered unchanged
/// between the two sides, in ascending order. Ported from
/// `src_teacher/diff.rs::unchanged_ranges`/`unchanged_ranges_lcs`.
fn unchanged_line_pairs(left: &LineSource, right: &LineSource) -> Vec<(usize, usize)> {
    if left.ranges.is_empty() || right.ranges.is_empty() {
        return vec![];
    }

    let result = unchanged_pairs_lcs(left, right);
    if !result.is_empty() {
        return result;
    }

    let common_leading_len = (0..left.ranges.len().min(right.ranges.len()))
        .take_while(|&i| left.key_at(i) == right.key_at(i))
        .count();
    let left_len = left.ranges.len();
    let right_len = right.ranges.len();
    let common_trailing_len = (0..(left_len - common_leading_len).min(right_len - common_leading_len))
        .take_while(|&i| {
            left.key_at(left_len - 1 - i) == right.key_at(right_len - 1 - i)
        })
        .count();

    let mut pairs = Vec::with_capacity(common_leading_len + common_trailing_len);
    for i in 0..common_leading_len {
        pairs.push((i, i));
    }
    for i in 0..common_trailing_len {
        pairs.push((left_len - common_trailing_len + i, right_len - common_trailing_len + i));
    }
    pairs
}

fn unchanged_pairs_lcs(left: &LineSource, right: &LineSource) -> Vec<(usize, usize)> {
    const MAX_OCCURRENCES: usize = 100;
    let left_histogram = LineHistogram::calculate(left, MAX_OCCURRENCES);
    if *left_histogram.count_to_words.keys().next().unwrap() > MAX_OCCURRENCES {
        return vec![];
    }
    let right_histogram = LineHistogram::calculate(right, MAX_OCCURRENCES);

    let Some(uncommon_shared_words) = left_histogram
        .count_to_words
        .iter()
        .map(|(left_count, left_words)| -> Vec<&BStr> {
            left_words
                .iter()
                .copied()
                .filter(|left_word| {
                    let right_count = right_histogram
                        .word_to_positions
                        .get(left_word)
                        .map_or(0, |p| p.len());
                    *left_count == right_count
                })
                .collect()
        })
        .find(|words| !words.is_empty())
    else {
        return vec![];
    };

    let (mut left_positions, mut right_positions): (Vec<_>, Vec<_>) = uncommon_shared_words
        .iter()
        .flat_map(|word| {
            let left_occurrences = &left_histogram.word_to_positions[word];
            let right_occurrences = &right_histogram.word_to_positions[word];
            std::iter::zip(left_occurrences, right_occurrences)
        })
        .enumerate()
        .map(|(serial, (&lp, &rp))| ((lp, serial), (rp, serial)))
        .unzip();
    left_positions.sort_unstable_by_key(|&(pos, _)| pos);
    right_positions.sort_unstable_by_key(|&(pos, _)| pos);

    let left_index_by_serial: Vec<usize> = {
        let mut map = vec![0; left_positions.len()];
        for (i, &(_pos, serial)) in left_positions.iter().enumerate() {
            map[serial] = i;
        }
        map
    };
    let left_index_by_right_index: Vec<usize> = right_positions
        .iter()
        .map(|&(_pos, serial)| left_index_by_serial[serial])
        .collect();

    let lcs = find_lcs(&left_index_by_right_index);

    let mut result = vec![];
    let mut previous_left = 0usize;
    let mut previous_right = 0usize;
    for (left_index, right_index) in lcs {
        let (left_pos, _) = left_positions[left_index];
        let (right_pos, _) = right_positions[right_index];
        if previous_left < left_pos || previous_right < right_pos {
            result.extend(unchanged_line_pairs(
                &left.narrowed(previous_left..left_pos),
                &right.narrowed(previous_right..right_pos),
            ).into_iter().map(|(l, r)| (l + previous_left, r + previous_right)));
        }
        result.push((left_pos, right_pos));
        previous_left = left_pos + 1;
        previous_right = right_pos + 1;
    }
    if previous_left < left.ranges.len() || previous_right < right.ranges.len() {
        result.extend(unchanged_line_pairs(
            &left.narrowed(previous_left..left.ranges.len()),
            &right.narrowed(previous_right..right.ranges.len()),
        ).into_iter().map(|(l, r)| (l + previous_left, r + previous_right)));
    }
    result
}

/// Converts a sorted list of unchanged `(a_index, b_index)` pairs into the
/// complementary edit list.
fn edits_from_unchanged(pairs: &[(usize, usize)], len_a: usize, len_b: usize) -> Vec<Edit> {
    let mut edits = Vec::new();
    let mut prev_a = 0usize;
    let mut prev_b = 0usize;
    for &(a, b) in pairs {
        if a > prev_a || b > prev_b {
            edits.push(Edit {
                begin_a: prev_a as u32,
                end_a: a as u32,
                begin_b: prev_b as u32,
                end_b: b as u32,
            });
        }
        prev_a = a + 1;
        prev_b = b + 1;
    }
    if prev_a < len_a || prev_b < len_b {
        edits.push(Edit {
            begin_a: prev_a as u32,
            end_a: len_a as u32,
            begin_b: prev_b as u32,
            end_b: len_b as u32,
        });
    }
    edits
}

/// Histogram diff backend, ported from the teacher's word-level `Diff` down
/// to line granularity (see module docs).
#[derive(Debug, Default)]
pub struct HistogramDiff;

impl DiffAlgorithm for HistogramDiff {
    fn diff(&self, cmp: LineComparator, a: &[u8], b: &[u8]) -> Vec<Edit> {
        let a_text = BStr::new(a);
        let b_text = BStr::new(b);
        let a_ranges = find_line_ranges(a);
        let b_ranges = find_line_ranges(b);
        let left = LineSource {
            text: a_text,
            ranges: &a_ranges,
            cmp,
        };
        let right = LineSource {
            text: b_text,
            ranges: &b_ranges,
            cmp,
        };
        let mut pairs = unchanged_line_pairs(&left, &right);
        pairs.sort_unstable();
        edits_from_unchanged(&pairs, a_ranges.len(), b_ranges.len())
    }
}

/// Myers diff backend, wrapping the `similar` crate.
#[derive(Debug, Default)]
pub struct MyersDiff;

impl DiffAlgorithm for MyersDiff {
    fn diff(&self, cmp: LineComparator, a: &[u8], b: &[u8]) -> Vec<Edit> {
        let a_ranges = find_line_ranges(a);
        let b_ranges = find_line_ranges(b);
        let a_text = BStr::new(a);
        let b_text = BStr::new(b);
        let a_keys: Vec<&[u8]> = a_ranges.iter().map(|r| &**line_key(a_text, r, cmp)).collect();
        let b_keys: Vec<&[u8]> = b_ranges.iter().map(|r| &**line_key(b_text, r, cmp)).collect();

        let diff = similar::capture_diff_slices(similar::Algorithm::Myers, &a_keys, &b_keys);
        diff.into_iter()
            .filter_map(|op| match op {
                similar::DiffOp::Equal { .. } => None,
                similar::DiffOp::Delete {
                    old_index, old_len, new_index, ..
                } => Some(Edit {
                    begin_a: old_index as u32,
                    end_a: (old_index + old_len) as u32,
                    begin_b: new_index as u32,
                    end_b: new_index as u32,
                }),
                similar::DiffOp::Insert {
                    old_index, new_index, new_len, ..
                } => Some(Edit {
                    begin_a: old_index as u32,
                    end_a: old_index as u32,
                    begin_b: new_index as u32,
                    end_b: (new_index + new_len) as u32,
                }),
                similar::DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => Some(Edit {
                    begin_a: old_index as u32,
                    end_a: (old_index + old_len) as u32,
                    begin_b: new_index as u32,
                    end_b: (new_index + new_len) as u32,
                }),
            })
            .collect()
    }
}

/// Resolves a [`crate::config::DiffAlgorithmKind`] to its implementation.
pub fn resolve(kind: crate::config::DiffAlgorithmKind) -> Box<dyn DiffAlgorithm> {
    match kind {
        crate::config::DiffAlgorithmKind::Histogram => Box::new(HistogramDiff),
        crate::config::DiffAlgorithmKind::Myers => Box::new(MyersDiff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(a: &str, b: &str) -> Vec<Edit> {
        HistogramDiff.diff(LineComparator::Default, a.as_bytes(), b.as_bytes())
    }

    #[test]
    fn identical_content_has_no_edits() {
        assert!(run("a\nb\nc\n", "a\nb\nc\n").is_empty());
    }

    #[test]
    fn single_line_appended_is_one_insert_edit() {
        let edits = run("a\nb\n", "a\nb\nc\n");
        assert_eq!(edits, vec![Edit { begin_a: 2, end_a: 2, begin_b: 2, end_b: 3 }]);
    }

    #[test]
    fn single_line_edit_at_the_last_line() {
        // A 1-line edit at the last line moves exactly 1 line to the child
        // (SPEC_FULL.md §8 boundary behavior).
        let edits = run("a\nb\nc\n", "a\nb\nX\n");
        assert_eq!(edits.len(), 1);
        let e = edits[0];
        assert_eq!((e.begin_a, e.end_a), (2, 3));
        assert_eq!((e.begin_b, e.end_b), (2, 3));
    }

    #[test]
    fn whitespace_ignoring_comparator_treats_reindented_line_as_unchanged() {
        let edits = HistogramDiff.diff(
            LineComparator::WhitespaceIgnoring,
            b"a\n  b\nc\n",
            b"a\nb  \nc\n",
        );
        assert!(edits.is_empty());
    }

    #[test]
    fn myers_backend_agrees_on_a_simple_insert() {
        let edits = MyersDiff.diff(LineComparator::Default, b"a\nb\n", b"a\nb\nc\n");
        assert_eq!(edits, vec![Edit { begin_a: 2, end_a: 2, begin_b: 2, end_b: 3 }]);
    }
}
