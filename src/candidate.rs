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

//! The frontier node and per-file candidate types (SPEC_FULL.md §3).
//!
//! The polymorphic commit variant is a tagged `enum` rather than a trait
//! object or an inheritance hierarchy (SPEC_FULL.md §9), matching how the
//! teacher expresses similarly small closed sets of node kinds (e.g.
//! `src_teacher/op_store.rs`'s enums) instead of reaching for dynamic
//! dispatch where a fixed set of variants will do.

use chrono::DateTime;
use chrono::Utc;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::region::RegionList;
use crate::repo_path::RepoPathBuf;
use crate::store::CommitMeta;
use crate::store::ObjectId;

/// A commit, or the uncommitted working tree anchored at one parent commit.
#[derive(Clone, Debug)]
pub enum CommitNode {
    Commit(CommitMeta),
    /// `parent` is the commit the working tree is anchored at. Its
    /// commit-time is treated as `+infinity` so it is always processed
    /// first (SPEC_FULL.md §3); hash, author and date are reported as
    /// "unknown" for any line still attributed to it.
    WorkingTree { parent: ObjectId },
}

impl CommitNode {
    /// Sort key for the frontier's reverse-commit-time comparator: the
    /// working tree is always `+infinity`, i.e. always popped first.
    pub fn effective_time(&self) -> i64 {
        match self {
            Self::Commit(meta) => meta.commit_time,
            Self::WorkingTree { .. } => i64::MAX,
        }
    }

    /// `None` for the working tree ("unknown" commit hash per the spec);
    /// `Some` for a real commit.
    pub fn commit_id(&self) -> Option<&ObjectId> {
        match self {
            Self::Commit(meta) => Some(&meta.id),
            Self::WorkingTree { .. } => None,
        }
    }

    pub fn parents(&self) -> Vec<ObjectId> {
        match self {
            Self::Commit(meta) => meta.parents.clone(),
            Self::WorkingTree { parent } => vec![parent.clone()],
        }
    }

    pub fn author_email(&self) -> Option<&str> {
        match self {
            Self::Commit(meta) => Some(&meta.author_email),
            Self::WorkingTree { .. } => None,
        }
    }

    pub fn committer_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Commit(meta) => Some(meta.committer_date),
            Self::WorkingTree { .. } => None,
        }
    }

    /// Stable identity used by the frontier to detect "already reached
    /// this commit" for the merge-on-reentry rule (SPEC_FULL.md §4.G
    /// `push`). The working tree is its own singleton identity: there is
    /// always exactly one working-tree pseudo-commit in a given run.
    pub fn identity(&self) -> NodeIdentity {
        match self.commit_id() {
            Some(id) => NodeIdentity::Commit(id.clone()),
            None => NodeIdentity::WorkingTree,
        }
    }
}

/// See [`CommitNode::identity`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeIdentity {
    WorkingTree,
    Commit(ObjectId),
}

impl NodeIdentity {
    /// Deterministic frontier tie-break bytes (SPEC_FULL.md §4.G: "ties are
    /// broken by comparing the commit's object-id, with the working-dir
    /// variant sorting first"). There is at most one working-tree node per
    /// run and its commit-time is already `+infinity`, so its tie-break
    /// value never actually competes against another node's.
    pub fn tie_break_bytes(&self) -> &[u8] {
        match self {
            Self::WorkingTree => &[],
            Self::Commit(id) => id.as_bytes(),
        }
    }
}

/// One file being traced through history.
#[derive(Clone, Debug)]
pub struct FileCandidate {
    /// Path at the starting revision; never mutated after creation.
    pub original_path: RepoPathBuf,
    /// Path inside the current node.
    pub path: RepoPathBuf,
    /// Content id; [`ObjectId::is_null`] means "working directory at
    /// `original_path`".
    pub blob: ObjectId,
    pub regions: RegionList,
}

impl FileCandidate {
    pub fn new(original_path: RepoPathBuf, path: RepoPathBuf, blob: ObjectId, regions: RegionList) -> Self {
        Self {
            original_path,
            path,
            blob,
            regions,
        }
    }

    /// The key two candidates must share to be merge-eligible (SPEC_FULL.md
    /// §4.G `push`: "same `(path, originalPath)` key").
    pub fn key(&self) -> (&RepoPathBuf, &RepoPathBuf) {
        (&self.path, &self.original_path)
    }
}

/// A frontier node: a commit (or the working tree) plus the set of
/// [`FileCandidate`]s whose unattributed regions last passed through it.
///
/// Candidates are kept in a flat `Vec` for fast whole-node iteration, with
/// an index from `path` to positions in that `Vec` for the lookups the
/// tree comparator and per-file blamer need (SPEC_FULL.md §3 "a parallel
/// flat list of all candidates, kept consistent for fast iteration").
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub commit: CommitNode,
    candidates: Vec<FileCandidate>,
    by_path: IndexMap<RepoPathBuf, SmallVec<[usize; 2]>>,
}

impl GraphNode {
    pub fn new(commit: CommitNode) -> Self {
        Self {
            commit,
            candidates: Vec::new(),
            by_path: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[FileCandidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<FileCandidate> {
        self.candidates
    }

    pub fn candidates_at_path(&self, path: &RepoPathBuf) -> impl Iterator<Item = &FileCandidate> {
        self.by_path
            .get(path)
            .into_iter()
            .flatten()
            .map(move |&i| &self.candidates[i])
    }

    /// Adds a brand-new candidate, or merges its region list into an
    /// existing one that shares the same `(path, original_path)` key
    /// (SPEC_FULL.md §4.G `push`).
    pub fn add_or_merge(&mut self, mut incoming: FileCandidate) {
        if let Some(indices) = self.by_path.get(&incoming.path) {
            for &i in indices {
                if self.candidates[i].original_path == incoming.original_path {
                    self.candidates[i].regions.merge(&mut incoming.regions);
                    return;
                }
            }
        }
        let index = self.candidates.len();
        self.by_path
            .entry(incoming.path.clone())
            .or_default()
            .push(index);
        self.candidates.push(incoming);
    }

    /// Merges every candidate of `other` into `self`, per the same rule as
    /// [`Self::add_or_merge`]. Used when the frontier discovers that a
    /// pushed node is equivalent to one already queued.
    pub fn merge_from(&mut self, other: Self) {
        for candidate in other.candidates {
            self.add_or_merge(candidate);
        }
    }
}
