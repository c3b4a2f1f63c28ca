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

//! Run configuration (SPEC_FULL.md §6).

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::progress::CancellationToken;
use crate::repo_path::RepoPathBuf;
use crate::store::ObjectId;

/// How two lines are compared by the diff backend.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineComparator {
    #[default]
    Default,
    WhitespaceIgnoring,
}

/// Which diff algorithm the [`crate::diff_backend::DiffAlgorithm`]
/// collaborator should use.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DiffAlgorithmKind {
    #[default]
    Histogram,
    Myers,
}

/// A caller-supplied progress callback, invoked once per frontier pop with
/// the 1-based iteration number and the commit's hash (or `"0"*N` for the
/// working-tree pseudo-commit).
pub type ProgressCallback = Arc<dyn Fn(u64, &str) + Send + Sync>;

/// All recognized run options (SPEC_FULL.md §6), with the teacher's
/// defaults-via-`Default`-impl style rather than a generated builder.
#[derive(Clone)]
pub struct BlameOptions {
    /// Object id to start from; `None` means "use the repository head, or
    /// the working-tree pseudo-commit if `treat_as_working_tree` applies".
    pub start_commit: Option<ObjectId>,
    /// Restrict blame to these repository-relative paths; `None` means all
    /// files of the start revision.
    pub file_paths: Option<HashSet<RepoPathBuf>>,
    /// `[0, 100]`, default 60.
    pub rename_score: u8,
    /// Default -1 ("do not break MODIFY entries").
    pub break_score: i32,
    /// `0` = unlimited, negative = exact-rename matching only.
    pub rename_limit: i64,
    /// In bytes, default 50 MiB.
    pub big_file_threshold: u64,
    /// Default `false`.
    pub skip_binary_files_for_content_renames: bool,
    pub line_comparator: LineComparator,
    pub diff_algorithm: DiffAlgorithmKind,
    /// When `true`, per-file blame jobs within one expansion run on a
    /// `rayon` pool sized by `num_cpus::get()`; when `false`, they run
    /// sequentially in-place (SPEC_FULL.md §5).
    pub multithreading: bool,
    pub progress: Option<ProgressCallback>,
    pub cancellation: CancellationToken,
    /// Substitutes working-tree content for listed paths, for callers that
    /// hold the buffer in memory rather than on disk.
    pub file_content_overrides: HashMap<RepoPathBuf, Vec<u8>>,
    /// Below the fast-path threshold (SPEC_FULL.md §4.E), the file-tree
    /// comparator walks both trees in lock-step instead of running the full
    /// rename detector. Not part of the language-neutral boundary contract
    /// in §6, but a tunable the comparator needs; default 100.
    pub fast_path_threshold: usize,
}

impl Default for BlameOptions {
    fn default() -> Self {
        Self {
            start_commit: None,
            file_paths: None,
            rename_score: 60,
            break_score: -1,
            rename_limit: 0,
            big_file_threshold: crate::similarity::DEFAULT_MAX_BLOB_SIZE,
            skip_binary_files_for_content_renames: false,
            line_comparator: LineComparator::default(),
            diff_algorithm: DiffAlgorithmKind::default(),
            multithreading: true,
            progress: None,
            cancellation: CancellationToken::new(),
            file_content_overrides: HashMap::new(),
            fast_path_threshold: 100,
        }
    }
}

impl BlameOptions {
    /// Clamps `rename_score` into `[0, 100]` and validates `rename_limit`'s
    /// meaning is respected (any value is legal; `0` and negative values
    /// just mean something different, per SPEC_FULL.md §6).
    pub fn normalized(mut self) -> Self {
        self.rename_score = self.rename_score.min(100);
        self
    }

    /// Whether content-rename detection should run at all for a given
    /// `(num_adds, num_deletes)` pair (SPEC_FULL.md §4.D "Rename limit
    /// behavior").
    pub fn content_renames_enabled_for(&self, num_adds: usize, num_deletes: usize) -> bool {
        if self.rename_limit < 0 {
            return false;
        }
        if self.rename_limit == 0 {
            return true;
        }
        let limit = self.rename_limit as u64;
        (num_adds as u64) * (num_deletes as u64) <= limit
    }
}
