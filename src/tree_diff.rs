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

//! Component E: the file-tree comparator (SPEC_FULL.md §4.E).
//!
//! Grounded on `src_teacher/copies.rs`'s `TreeDiffStream` consumption
//! pattern — iterate a diff between two trees, classify each path as an
//! add/delete/modify, hand unresolved paths to the rename detector —
//! adapted here from an async stream over `MergedTree` to a synchronous
//! walk over the [`ObjectStore`] collaborator.

use indexmap::IndexSet;

use crate::config::BlameOptions;
use crate::diff_entry::ChangeType;
use crate::diff_entry::DiffEntry;
use crate::diff_entry::DiffFile;
use crate::progress::CancellationToken;
use crate::rename;
use crate::repo_path::RepoPathBuf;
use crate::store::ObjectId;
use crate::store::ObjectStore;
use crate::store::TreeEntry;

/// Result of comparing a parent and child tree, restricted to
/// `target_paths` when given.
#[derive(Debug, Default)]
pub struct TreeDiffOutcome {
    pub files: Vec<DiffFile>,
    pub similarity_table_overflowed: bool,
    pub rename_limit_exceeded: bool,
}

/// Compares `parent`'s tree against `child`'s tree, restricted to
/// `target_paths` (repository-relative paths still being traced) when
/// `Some`.
///
/// Chooses the fast lock-step walk when `target_paths` is `Some` and below
/// [`BlameOptions::fast_path_threshold`]; otherwise falls back to the full
/// diff + rename detector (SPEC_FULL.md §4.E).
pub fn diff_trees<S: ObjectStore>(
    store: &S,
    parent: &ObjectId,
    child: &ObjectId,
    target_paths: Option<&IndexSet<RepoPathBuf>>,
    options: &BlameOptions,
    cancellation: &CancellationToken,
) -> Result<TreeDiffOutcome, crate::error::BlameError> {
    if let Some(targets) = target_paths {
        if targets.len() < options.fast_path_threshold {
            if let Some(files) = try_fast_path(store, parent, child, targets)? {
                return Ok(TreeDiffOutcome { files, ..Default::default() });
            }
        }
    }
    slow_path(store, parent, child, target_paths, options, cancellation)
}

/// The fast path (SPEC_FULL.md §4.E): for each target path present in
/// either tree, if the content id differs, record a `DiffFile` carrying
/// the parent-side id at the *same* path (no rename). Aborts (returns
/// `None`, falling back to the slow path) the moment a target path looks
/// added-or-not-a-file on the child side, since then a rename might be
/// needed to explain it.
fn try_fast_path<S: ObjectStore>(
    store: &S,
    parent: &ObjectId,
    child: &ObjectId,
    targets: &IndexSet<RepoPathBuf>,
) -> Result<Option<Vec<DiffFile>>, crate::error::BlameError> {
    let parent_entries = index_by_path(store.tree(parent).map_err(wrap)?);
    let child_entries = index_by_path(store.tree(child).map_err(wrap)?);

    let mut files = Vec::new();
    for path in targets {
        let child_entry = child_entries.get(path);
        let parent_entry = parent_entries.get(path);
        match (parent_entry, child_entry) {
            (_, None) => {
                // Not present in the child at all: neither a modification
                // nor something the comparator needs to report here.
            }
            (None, Some(_)) => {
                // Added at this exact path in the child with no parent
                // counterpart at the same path: might be a rename landing
                // here from elsewhere, which the fast path cannot see.
                return Ok(None);
            }
            (Some(p), Some(c)) => {
                if p.id != c.id {
                    files.push(DiffFile {
                        new_path: path.clone(),
                        old_path: Some(path.clone()),
                        old_object_id: p.id.clone(),
                    });
                }
            }
        }
    }
    Ok(Some(files))
}

fn index_by_path(entries: Vec<TreeEntry>) -> std::collections::HashMap<RepoPathBuf, TreeEntry> {
    entries.into_iter().map(|e| (e.path.clone(), e)).collect()
}

/// The slow path (SPEC_FULL.md §4.E): collect the full `DiffEntry` list
/// between the two trees, run it through the rename detector, then keep
/// only non-DELETE results whose `newPath` is a target path.
fn slow_path<S: ObjectStore>(
    store: &S,
    parent: &ObjectId,
    child: &ObjectId,
    target_paths: Option<&IndexSet<RepoPathBuf>>,
    options: &BlameOptions,
    cancellation: &CancellationToken,
) -> Result<TreeDiffOutcome, crate::error::BlameError> {
    let parent_entries = index_by_path(store.tree(parent).map_err(wrap)?);
    let child_entries = index_by_path(store.tree(child).map_err(wrap)?);

    let mut entries = Vec::new();
    for (path, child_entry) in &child_entries {
        match parent_entries.get(path) {
            None => entries.push(DiffEntry::add(path.clone(), child_entry.id.clone(), child_entry.kind)),
            Some(parent_entry) => {
                if parent_entry.id != child_entry.id || parent_entry.kind != child_entry.kind {
                    entries.push(DiffEntry::modify(
                        path.clone(),
                        parent_entry.id.clone(),
                        child_entry.id.clone(),
                        parent_entry.kind,
                        child_entry.kind,
                    ));
                }
            }
        }
    }
    for (path, parent_entry) in &parent_entries {
        if !child_entries.contains_key(path) {
            entries.push(DiffEntry::delete(path.clone(), parent_entry.id.clone(), parent_entry.kind));
        }
    }

    let (resolved, detector_outcome) = rename::detect_renames(store, entries, options, cancellation)?;

    let files = resolved
        .into_iter()
        .filter(|e| e.change_type != ChangeType::Delete)
        .filter_map(|e| {
            let new_path = e.new_path?;
            if let Some(targets) = target_paths {
                if !targets.contains(&new_path) {
                    return None;
                }
            }
            Some(DiffFile {
                new_path,
                old_path: e.old_path,
                old_object_id: e.old_id,
            })
        })
        .collect();

    Ok(TreeDiffOutcome {
        files,
        similarity_table_overflowed: detector_outcome.similarity_table_overflowed,
        rename_limit_exceeded: detector_outcome.rename_limit_exceeded,
    })
}

fn wrap(e: crate::store::StoreError) -> crate::error::BlameError {
    crate::error::BlameError::Backend(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemoryStore;

    fn commit_id(n: u8) -> ObjectId {
        ObjectId::new(vec![n])
    }

    #[test]
    fn fast_path_reports_same_path_modification() {
        let mut store = InMemoryStore::new();
        let old_blob = ObjectId::new(b"v1".to_vec());
        let new_blob = ObjectId::new(b"v2".to_vec());
        store.put_blob(old_blob.clone(), b"v1".to_vec());
        store.put_blob(new_blob.clone(), b"v2".to_vec());

        let path = RepoPathBuf::new("a.rs");
        store.put_commit(commit_id(1), 100, vec![], "a@x.com", vec![(path.clone(), old_blob.clone())]);
        store.put_commit(commit_id(2), 200, vec![commit_id(1)], "a@x.com", vec![(path.clone(), new_blob)]);

        let mut targets = IndexSet::new();
        targets.insert(path.clone());

        let outcome = diff_trees(
            &store,
            &commit_id(1),
            &commit_id(2),
            Some(&targets),
            &BlameOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].new_path, path);
        assert_eq!(outcome.files[0].old_object_id, old_blob);
    }

    #[test]
    fn slow_path_detects_rename() {
        let mut store = InMemoryStore::new();
        let content = b"l1\nl2\nl3\nl4\nl5\n".to_vec();
        let blob = ObjectId::new(content.clone());
        store.put_blob(blob.clone(), content);

        let old_path = RepoPathBuf::new("old.rs");
        let new_path = RepoPathBuf::new("new.rs");
        store.put_commit(commit_id(1), 100, vec![], "a@x.com", vec![(old_path.clone(), blob.clone())]);
        store.put_commit(commit_id(2), 200, vec![commit_id(1)], "a@x.com", vec![(new_path.clone(), blob.clone())]);

        let outcome = diff_trees(
            &store,
            &commit_id(1),
            &commit_id(2),
            None,
            &BlameOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].new_path, new_path);
        assert_eq!(outcome.files[0].old_path, Some(old_path));
    }

    #[test]
    fn add_with_no_parent_counterpart_is_reported_with_no_old_path() {
        let mut store = InMemoryStore::new();
        let blob = ObjectId::new(b"v1".to_vec());
        store.put_blob(blob.clone(), b"v1".to_vec());
        let path = RepoPathBuf::new("a.rs");
        store.put_commit(commit_id(1), 100, vec![], "a@x.com", vec![]);
        store.put_commit(commit_id(2), 200, vec![commit_id(1)], "a@x.com", vec![(path.clone(), blob)]);

        let outcome = diff_trees(
            &store,
            &commit_id(1),
            &commit_id(2),
            None,
            &BlameOptions::default(),
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.files[0].old_path, None);
    }
}
