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

//! The object-store collaborator contract.
//!
//! The core never reads a repository's on-disk format directly; it is built
//! against this trait, which a caller implements once per backend (e.g. a
//! thin wrapper around a git ODB). [`crate::testutils`] ships an in-memory
//! implementation used by this crate's own test suite.

use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::repo_path::RepoPathBuf;

/// Opaque, immutable, fixed-width identifier for a blob or a commit.
///
/// The backend decides the width and meaning of the bytes (a 20-byte SHA-1,
/// a 32-byte SHA-256, ...); this crate only ever compares, hashes and
/// displays them.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObjectId(Arc<[u8]>);

impl ObjectId {
    /// Wraps a backend-provided id.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// The all-zero sentinel used to denote "working directory at
    /// `originalPath`" for a [`crate::candidate::FileCandidate`] blob, or
    /// "no object yet" for a working-tree pseudo-commit's parent-less case.
    pub fn null() -> Self {
        Self(Arc::from([]))
    }

    /// True for [`Self::null`].
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("ObjectId(null)")
        } else {
            f.debug_tuple("ObjectId").field(&self.hex()).finish()
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("0")
        } else {
            f.write_str(&self.hex())
        }
    }
}

/// The subset of a tree entry's file mode the core cares about: whether two
/// entries are mode-compatible for rename purposes (SPEC_FULL.md §4.D "mode
/// compatibility").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    RegularFile,
    Symlink,
    Gitlink,
}

impl EntryKind {
    /// Two entries may only be paired as a rename/copy if they share a kind.
    pub fn compatible_with(self, other: Self) -> bool {
        self == other
    }
}

/// One entry of a tree enumeration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEntry {
    pub path: RepoPathBuf,
    pub kind: EntryKind,
    pub id: ObjectId,
}

/// Commit metadata as reported by the object store. Distinct from
/// [`crate::candidate::CommitNode`], which additionally represents the
/// working-tree pseudo-commit.
#[derive(Clone, Debug)]
pub struct CommitMeta {
    pub id: ObjectId,
    /// Seconds since the Unix epoch, signed so pre-1970 commit times remain
    /// representable, matching SPEC_FULL.md §3's "signed 32-bit seconds"
    /// (widened to `i64` here; `chrono` needs at least that).
    pub commit_time: i64,
    pub parents: Vec<ObjectId>,
    pub author_email: String,
    pub committer_date: DateTime<Utc>,
}

/// Error type an [`ObjectStore`] implementation reports through.
pub type StoreError = Arc<dyn std::error::Error + Send + Sync>;

/// The collaborator contract the core consumes (SPEC_FULL.md §6).
///
/// Implementations must be cheap to [`Clone`]: every blame worker thread
/// obtains its own handle for the lifetime of a single per-file job (the
/// object-store reader itself need not be thread-safe, only the handle type
/// cloneable — SPEC_FULL.md §5 "Shared resources").
pub trait ObjectStore: Clone + Send + Sync {
    /// Size in bytes of a blob, without loading its content. Missing objects
    /// are treated as size `0` for the rename detector's size prefilter
    /// (SPEC_FULL.md §7 `Missing-object`); an actual subsequent [`Self::open`]
    /// of a missing object is fatal.
    fn size(&self, id: &ObjectId) -> Result<u64, StoreError>;

    /// Loads the full byte content of a blob.
    fn open(&self, id: &ObjectId) -> Result<Vec<u8>, StoreError>;

    /// Loads commit metadata.
    fn commit(&self, id: &ObjectId) -> Result<CommitMeta, StoreError>;

    /// Enumerates the regular-file entries of a commit's tree, already
    /// filtered to exclude symlinks and submodules as blame targets
    /// (SPEC_FULL.md §1 Non-goals).
    fn tree(&self, commit: &ObjectId) -> Result<Vec<TreeEntry>, StoreError>;

    /// Resolves the repository head, used when [`crate::config::BlameOptions::start_commit`]
    /// is absent and no working-tree override applies.
    fn head(&self) -> Result<Option<ObjectId>, StoreError>;
}
