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

//! Simultaneous multi-file line provenance ("blame") over a content-addressed
//! commit graph (SPEC_FULL.md §1, §2).
//!
//! The crate never reads a repository's on-disk format; it is driven against
//! the [`store::ObjectStore`] and [`diff_backend::DiffAlgorithm`]
//! collaborator contracts a caller supplies, and walks the commit graph once,
//! attributing every requested file's lines to the commit that introduced
//! them (following renames and copies) in a single pass rather than one
//! walk per file.

pub mod blame_file;
pub mod candidate;
pub mod config;
pub mod diff_backend;
pub mod diff_entry;
pub mod error;
pub mod progress;
pub mod region;
pub mod rename;
pub mod repo_path;
pub mod result;
mod scheduler;
pub mod similarity;
pub mod store;
pub mod tree_diff;

#[cfg(any(test, feature = "testing"))]
pub mod testutils;

pub use candidate::CommitNode;
pub use config::BlameOptions;
pub use config::DiffAlgorithmKind;
pub use config::LineComparator;
pub use error::BlameError;
pub use progress::CancellationToken;
pub use result::BlameResult;
pub use result::BlameSummary;
pub use result::FileBlame;
pub use result::LineBlame;
pub use store::CommitMeta;
pub use store::EntryKind;
pub use store::ObjectId;
pub use store::ObjectStore;
pub use store::TreeEntry;

use result::ResultStore;

/// Blames every file of `options.start_commit` (or the repository head, if
/// absent) against its full ancestry, restricted to `options.file_paths`
/// when given (SPEC_FULL.md §6 external interface).
///
/// Returns the per-line attribution plus a [`BlameSummary`] of non-fatal
/// degradations encountered along the way (§7 error taxonomy items 4-5);
/// those never fail the run.
pub fn blame<S: ObjectStore>(options: BlameOptions, store: S) -> Result<(BlameResult, BlameSummary), BlameError> {
    let options = options.normalized();
    let start = resolve_start(&store, &options)?;

    let results = ResultStore::new();
    let start_node = scheduler::initialize(&store, CommitNode::Commit(store.commit(&start).map_err(wrap)?), &start, &options, &results)?;
    let diff_algo = diff_backend::resolve(options.diff_algorithm);
    let summary = scheduler::run(&store, start_node, diff_algo.as_ref(), &options, &results)?;

    Ok((results.into_result(), summary))
}

/// Blames every file of the uncommitted working tree anchored at `parent`,
/// with `options.file_content_overrides` substituted in for whichever
/// paths the caller holds a live buffer for (SPEC_FULL.md §3 "working
/// directory at `originalPath`", §6 `fileContentOverrides`).
///
/// Lines that are still unattributed once the walk reaches `parent` are
/// reported with every field `None` (uncommitted, or edited since the
/// working copy diverged from `parent`).
pub fn blame_working_tree<S: ObjectStore>(
    parent: ObjectId,
    options: BlameOptions,
    store: S,
) -> Result<(BlameResult, BlameSummary), BlameError> {
    let options = options.normalized();
    let results = ResultStore::new();
    let start_node = scheduler::initialize_working_tree(&store, parent, &options, &results)?;
    let diff_algo = diff_backend::resolve(options.diff_algorithm);
    let summary = scheduler::run(&store, start_node, diff_algo.as_ref(), &options, &results)?;

    Ok((results.into_result(), summary))
}

fn resolve_start<S: ObjectStore>(store: &S, options: &BlameOptions) -> Result<ObjectId, BlameError> {
    match &options.start_commit {
        Some(id) => Ok(id.clone()),
        None => store.head().map_err(wrap)?.ok_or(BlameError::NoHead),
    }
}

fn wrap(e: store::StoreError) -> BlameError {
    BlameError::Backend(e)
}
