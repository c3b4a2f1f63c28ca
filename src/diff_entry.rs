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

//! The shapes shared between the file-tree comparator (§4.E) and the rename
//! detector (§4.D): [`DiffEntry`] is what the rename detector consumes and
//! produces; [`DiffFile`] is what the comparator ultimately hands to the
//! per-file blamer.

use crate::repo_path::RepoPathBuf;
use crate::store::EntryKind;
use crate::store::ObjectId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeType {
    Add,
    Delete,
    Modify,
    Copy,
    Rename,
}

impl ChangeType {
    /// Sort weight used by the rename detector's output ordering
    /// (SPEC_FULL.md §4.D "Output ordering"): DELETE, then ADD, then
    /// everything else.
    fn sort_weight(self) -> u8 {
        match self {
            Self::Delete => 0,
            Self::Add => 1,
            Self::Modify | Self::Copy | Self::Rename => 2,
        }
    }
}

/// One entry of a parent/child tree comparison, before or after rename
/// resolution.
#[derive(Clone, Debug)]
pub struct DiffEntry {
    pub change_type: ChangeType,
    pub old_path: Option<RepoPathBuf>,
    pub new_path: Option<RepoPathBuf>,
    pub old_id: ObjectId,
    pub new_id: ObjectId,
    pub old_kind: Option<EntryKind>,
    pub new_kind: Option<EntryKind>,
    /// `100` for an exact (blob-id) rename/copy, `renameScore..100` for a
    /// content-similarity one, unset (`0`) for ADD/DELETE/MODIFY.
    pub score: u8,
}

impl DiffEntry {
    pub fn add(new_path: RepoPathBuf, new_id: ObjectId, new_kind: EntryKind) -> Self {
        Self {
            change_type: ChangeType::Add,
            old_path: None,
            new_path: Some(new_path),
            old_id: ObjectId::null(),
            new_id,
            old_kind: None,
            new_kind: Some(new_kind),
            score: 0,
        }
    }

    pub fn delete(old_path: RepoPathBuf, old_id: ObjectId, old_kind: EntryKind) -> Self {
        Self {
            change_type: ChangeType::Delete,
            old_path: Some(old_path),
            new_path: None,
            old_id,
            new_id: ObjectId::null(),
            old_kind: Some(old_kind),
            new_kind: None,
            score: 0,
        }
    }

    pub fn modify(
        path: RepoPathBuf,
        old_id: ObjectId,
        new_id: ObjectId,
        old_kind: EntryKind,
        new_kind: EntryKind,
    ) -> Self {
        Self {
            change_type: ChangeType::Modify,
            old_path: Some(path.clone()),
            new_path: Some(path),
            old_id,
            new_id,
            old_kind: Some(old_kind),
            new_kind: Some(new_kind),
            score: 0,
        }
    }

    /// `nameOf` from SPEC_FULL.md §4.D "Output ordering": `newPath` for
    /// everything but DELETE, which uses `oldPath`.
    fn name_of(&self) -> &str {
        match self.change_type {
            ChangeType::Delete => self.old_path.as_ref().map_or("", RepoPathBuf::as_str),
            _ => self.new_path.as_ref().map_or("", RepoPathBuf::as_str),
        }
    }

    fn sort_key(&self) -> (&str, u8) {
        (self.name_of(), self.change_type.sort_weight())
    }
}

/// Sorts `entries` in place per SPEC_FULL.md §4.D's "Output ordering".
pub fn sort_output(entries: &mut [DiffEntry]) {
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// What the file-tree comparator (§4.E) ultimately reports for one file of
/// the child tree: its path there, and its path (if any) in the parent
/// tree, whose blob is what the per-file blamer diffs against.
#[derive(Clone, Debug)]
pub struct DiffFile {
    pub new_path: RepoPathBuf,
    /// `None` denotes an ADD: no corresponding parent file.
    pub old_path: Option<RepoPathBuf>,
    pub old_object_id: ObjectId,
}
