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

//! Content fingerprinting for the similarity-based rename/copy detector
//! (SPEC_FULL.md §4.B).
//!
//! The shape (hash each line, bucket occurrence counts, sort and
//! de-duplicate) mirrors the teacher's `diff::Histogram`, which does the
//! same thing one level up (on word ranges, for the diff algorithm itself)
//! in `src_teacher/diff.rs`.

use std::hash::Hash;
use std::hash::Hasher;
use std::collections::hash_map::DefaultHasher;

/// A single line is truncated to this many bytes before hashing.
const MAX_HASHED_LINE_BYTES: usize = 64;

/// Blobs larger than this are not considered for similarity at all.
pub const DEFAULT_MAX_BLOB_SIZE: u64 = 50 * 1024 * 1024;

/// Scanned window used by [`is_binary`].
const BINARY_SNIFF_WINDOW: usize = 8192;

/// Raised when a fingerprint table would grow past its capacity. Per
/// SPEC_FULL.md §4.B, the caller must treat the affected file as *not
/// comparable* rather than treat this as a hard error.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TableFull;

/// A `(hash, count)` table built from a blob's lines, packed as the spec
/// describes (upper 32 bits hash, lower 32 bits count), sorted and
/// de-duplicated by hash.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    // Already sorted and de-duplicated by the upper 32 bits (the hash).
    entries: Vec<u64>,
    size: u64,
}

/// Table capacity is bounded mainly to keep pathological inputs (e.g. a
/// blob that is one line repeated a billion times) from using unbounded
/// memory; this mirrors the fixed-capacity table of the spec.
const MAX_TABLE_ENTRIES: usize = 1 << 20;

impl SimilarityIndex {
    /// Builds an index from raw blob bytes. Returns [`TableFull`] if more
    /// than [`MAX_TABLE_ENTRIES`] distinct hashes would be needed.
    pub fn build(content: &[u8]) -> Result<Self, TableFull> {
        let mut counts: std::collections::HashMap<u32, u32> = std::collections::HashMap::new();
        let mut size = 0u64;
        for line in content.split_inclusive(|&b| b == b'\n') {
            if line.is_empty() {
                continue;
            }
            size += 1;
            let truncated = &line[..line.len().min(MAX_HASHED_LINE_BYTES)];
            let hash = hash_line(truncated);
            let count = counts.entry(hash).or_insert(0);
            *count = count.saturating_add(1);
            if counts.len() > MAX_TABLE_ENTRIES {
                return Err(TableFull);
            }
        }
        let mut entries: Vec<u64> = counts
            .into_iter()
            .map(|(hash, count)| (u64::from(hash) << 32) | u64::from(count))
            .collect();
        entries.sort_unstable();
        Ok(Self { entries, size })
    }

    /// Number of lines the index was built from.
    pub fn size(&self) -> u64 {
        self.size
    }

    fn count_of(&self, hash: u32) -> u32 {
        match self
            .entries
            .binary_search_by(|packed| (packed >> 32).cmp(&u64::from(hash)))
        {
            Ok(i) => (self.entries[i] & 0xFFFF_FFFF) as u32,
            Err(_) => 0,
        }
    }

    /// `min(common, max(sizeOfA, sizeOfB)) * scale / max(sizeOfA, sizeOfB)`
    /// where `common` sums `min(countA(h), countB(h))` over hashes present
    /// in both tables (SPEC_FULL.md §4.B).
    pub fn score(&self, other: &Self, scale: u64) -> u64 {
        let max_size = self.size.max(other.size);
        if max_size == 0 {
            return scale;
        }
        let (smaller, larger) = if self.entries.len() <= other.entries.len() {
            (self, other)
        } else {
            (other, self)
        };
        let common: u64 = smaller
            .entries
            .iter()
            .map(|packed| {
                let hash = (packed >> 32) as u32;
                let count_here = packed & 0xFFFF_FFFF;
                let count_there = u64::from(larger.count_of(hash));
                count_here.min(count_there)
            })
            .sum();
        common.min(max_size) * scale / max_size
    }
}

fn hash_line(bytes: &[u8]) -> u32 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    let full = hasher.finish();
    (full ^ (full >> 32)) as u32
}

/// Heuristic scan of the first block of a blob: a NUL byte before the first
/// line terminator (or within the first [`BINARY_SNIFF_WINDOW`] bytes)
/// classifies the blob as binary (SPEC_FULL.md §4.B `isBinary`).
pub fn is_binary(content: &[u8]) -> bool {
    let window = &content[..content.len().min(BINARY_SNIFF_WINDOW)];
    let first_newline = window.iter().position(|&b| b == b'\n');
    let scan_end = first_newline.unwrap_or(window.len());
    window[..scan_end].contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_of_identical_blobs_is_the_scale() {
        let idx = SimilarityIndex::build(b"a\nb\nc\n").unwrap();
        assert_eq!(idx.score(&idx, 10000), 10000);
    }

    #[test]
    fn score_of_disjoint_blobs_is_zero() {
        let a = SimilarityIndex::build(b"a\nb\nc\n").unwrap();
        let b = SimilarityIndex::build(b"x\ny\nz\n").unwrap();
        assert_eq!(a.score(&b, 10000), 0);
    }

    #[test]
    fn score_is_symmetric() {
        let a = SimilarityIndex::build(b"a\nb\nc\nd\n").unwrap();
        let b = SimilarityIndex::build(b"a\nb\nx\ny\n").unwrap();
        assert_eq!(a.score(&b, 10000), b.score(&a, 10000));
    }

    #[test]
    fn is_binary_detects_nul_before_first_newline() {
        assert!(is_binary(b"abc\0def\nmore\n"));
        assert!(!is_binary(b"abc\ndef\0more\n"));
    }
}
