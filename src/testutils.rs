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

//! An in-memory [`ObjectStore`] used by this crate's own test suite.
//!
//! Grounded on `src_teacher/testutils.rs`'s fixture-helper role: a
//! lightweight, in-process stand-in for a real backend, gated behind the
//! `testing` feature so it never ships in a default build — the same
//! gating convention the teacher's workspace uses for its own
//! `testutils`/`test-fakes` crates.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::TimeZone as _;
use chrono::Utc;

use crate::repo_path::RepoPathBuf;
use crate::store::CommitMeta;
use crate::store::EntryKind;
use crate::store::ObjectId;
use crate::store::ObjectStore;
use crate::store::StoreError;
use crate::store::TreeEntry;

#[derive(Debug, Default)]
struct Inner {
    blobs: HashMap<ObjectId, Vec<u8>>,
    commits: HashMap<ObjectId, CommitMeta>,
    trees: HashMap<ObjectId, Vec<TreeEntry>>,
    head: Option<ObjectId>,
}

/// A fully in-memory object store: commits, trees and blobs are all
/// inserted directly by the test rather than parsed from an on-disk
/// format. Cheaply [`Clone`]-able (an `Arc` around a [`Mutex`]) so it
/// satisfies [`ObjectStore`]'s "cheap to clone per worker" contract.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_blob(&mut self, id: ObjectId, content: Vec<u8>) {
        self.inner.lock().unwrap().blobs.insert(id, content);
    }

    /// Registers a commit's metadata and the tree of files it contains
    /// (already filtered to regular files, as a real backend would do at
    /// the `tree()` boundary).
    pub fn put_commit(
        &mut self,
        id: ObjectId,
        commit_time: i64,
        parents: Vec<ObjectId>,
        author_email: &str,
        files: Vec<(RepoPathBuf, ObjectId)>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.commits.insert(
            id.clone(),
            CommitMeta {
                id: id.clone(),
                commit_time,
                parents,
                author_email: author_email.to_string(),
                committer_date: seconds_to_utc(commit_time),
            },
        );
        inner.trees.insert(
            id,
            files
                .into_iter()
                .map(|(path, blob)| TreeEntry {
                    path,
                    kind: EntryKind::RegularFile,
                    id: blob,
                })
                .collect(),
        );
    }

    pub fn set_head(&mut self, id: ObjectId) {
        self.inner.lock().unwrap().head = Some(id);
    }
}

fn seconds_to_utc(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
}

fn missing(what: &str) -> StoreError {
    Arc::from(std::io::Error::new(std::io::ErrorKind::NotFound, what.to_string()))
        as Arc<dyn std::error::Error + Send + Sync>
}

impl ObjectStore for InMemoryStore {
    fn size(&self, id: &ObjectId) -> Result<u64, StoreError> {
        if id.is_null() {
            return Ok(0);
        }
        let inner = self.inner.lock().unwrap();
        inner
            .blobs
            .get(id)
            .map(|b| b.len() as u64)
            .ok_or_else(|| missing(&format!("blob {id} not found")))
    }

    fn open(&self, id: &ObjectId) -> Result<Vec<u8>, StoreError> {
        if id.is_null() {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().unwrap();
        inner.blobs.get(id).cloned().ok_or_else(|| missing(&format!("blob {id} not found")))
    }

    fn commit(&self, id: &ObjectId) -> Result<CommitMeta, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.commits.get(id).cloned().ok_or_else(|| missing(&format!("commit {id} not found")))
    }

    fn tree(&self, commit: &ObjectId) -> Result<Vec<TreeEntry>, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner.trees.get(commit).cloned().ok_or_else(|| missing(&format!("tree for {commit} not found")))
    }

    fn head(&self) -> Result<Option<ObjectId>, StoreError> {
        Ok(self.inner.lock().unwrap().head.clone())
    }
}
