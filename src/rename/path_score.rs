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

//! Path-name similarity score (SPEC_FULL.md §4.C "Path-name score").
//!
//! The common-prefix/common-suffix primitives below operate directly on raw
//! byte slices rather than `str`, since `RepoPathBuf` components are not
//! guaranteed valid UTF-8.

use crate::repo_path::RepoPathBuf;

/// Common-prefix length of two byte strings.
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Common-suffix length of two byte strings.
fn common_suffix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// `(dirScoreLTR + dirScoreRTL) * 0.25 + fileScore * 0.5`, integer
/// arithmetic throughout, result in `[0, 100]` (SPEC_FULL.md §4.C
/// "Path-name score"). `scale` is a multiplier applied to the final result
/// before dividing back down, to keep intermediate precision without
/// floating point: callers pass the caller-scale they need (e.g. 100 to
/// get `[0, 100] * 100` directly, matching SPEC_FULL.md §4.C step 3's
/// `nameScore * 100`).
pub fn path_name_score(a: &RepoPathBuf, b: &RepoPathBuf) -> u32 {
    let dir_a = a.dir_name().as_bytes();
    let dir_b = b.dir_name().as_bytes();
    let file_a = a.file_name().as_bytes();
    let file_b = b.file_name().as_bytes();

    // `dirScoreLTR + dirScoreRTL`, each in `[0, 100]`; empty-on-both-sides
    // is defined as 100+100 (SPEC_FULL.md §4.C "Empty directories on both
    // sides score 100").
    let dir_sum = if dir_a.is_empty() && dir_b.is_empty() {
        200
    } else {
        let max_dir_len = dir_a.len().max(dir_b.len()).max(1) as u64;
        let ltr = common_prefix_len(dir_a, dir_b) as u64 * 100 / max_dir_len;
        let rtl = common_suffix_len(dir_a, dir_b) as u64 * 100 / max_dir_len;
        ltr + rtl
    };
    (dir_sum * 25 + file_score(file_a, file_b) * 50) as u32 / 100
}

fn file_score(file_a: &[u8], file_b: &[u8]) -> u64 {
    let max_file_len = file_a.len().max(file_b.len()).max(1) as u64;
    common_suffix_len(file_a, file_b) as u64 * 100 / max_file_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paths_score_100() {
        let a = RepoPathBuf::new("");
        assert_eq!(path_name_score(&a, &a), 100);
    }

    #[test]
    fn identical_paths_score_100() {
        let a = RepoPathBuf::new("src/foo/bar.rs");
        assert_eq!(path_name_score(&a, &a), 100);
    }

    #[test]
    fn disjoint_paths_score_zero() {
        let a = RepoPathBuf::new("aaa/bbb.rs");
        let b = RepoPathBuf::new("zzz/yyy.go");
        assert_eq!(path_name_score(&a, &b), 0);
    }

    #[test]
    fn same_dir_different_file_scores_on_suffix_alone() {
        let a = RepoPathBuf::new("src/old_name.rs");
        let b = RepoPathBuf::new("src/new_name.rs");
        let score = path_name_score(&a, &b);
        // Same directory contributes the full 50, file suffix "name.rs" is shared.
        assert!(score > 50);
    }
}
