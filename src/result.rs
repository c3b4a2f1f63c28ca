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

//! The output of a blame run (SPEC_FULL.md §3 `BlameResult`, §7 non-fatal
//! degradation summary) and the write-once store the scheduler attributes
//! lines into as it walks.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;

use crate::repo_path::RepoPathBuf;
use crate::store::ObjectId;

/// One attributed (or not-yet-attributed) line.
#[derive(Clone, Debug)]
pub struct LineBlame {
    pub commit: Option<ObjectId>,
    pub commit_date: Option<DateTime<Utc>>,
    pub author_email: Option<String>,
}

impl LineBlame {
    fn unattributed() -> Self {
        Self {
            commit: None,
            commit_date: None,
            author_email: None,
        }
    }
}

/// Three parallel arrays of equal length for one target file, per
/// SPEC_FULL.md §3: `commitHashes[]`, `commitDates[]`, `authorEmails[]`,
/// modeled here as a single `Vec<LineBlame>` instead of three separate
/// `Vec`s purely to keep index bookkeeping in one place; the accessors
/// below still hand out the three views independently.
#[derive(Clone, Debug)]
pub struct FileBlame {
    lines: Vec<LineBlame>,
}

impl FileBlame {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn commit_hashes(&self) -> impl Iterator<Item = Option<&ObjectId>> {
        self.lines.iter().map(|l| l.commit.as_ref())
    }

    pub fn commit_dates(&self) -> impl Iterator<Item = Option<DateTime<Utc>>> + '_ {
        self.lines.iter().map(|l| l.commit_date)
    }

    pub fn author_emails(&self) -> impl Iterator<Item = Option<&str>> {
        self.lines.iter().map(|l| l.author_email.as_deref())
    }

    /// Convenience read-side iterator zipping the three parallel arrays per
    /// line (SPEC_FULL.md §1 supplemented feature).
    pub fn lines(&self) -> impl Iterator<Item = &LineBlame> {
        self.lines.iter()
    }
}

/// The final output of a blame run: one [`FileBlame`] per `originalPath`.
#[derive(Clone, Debug, Default)]
pub struct BlameResult {
    files: HashMap<RepoPathBuf, FileBlame>,
}

impl BlameResult {
    pub fn get(&self, original_path: &RepoPathBuf) -> Option<&FileBlame> {
        self.files.get(original_path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &RepoPathBuf> {
        self.files.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RepoPathBuf, &FileBlame)> {
        self.files.iter()
    }
}

/// Non-fatal degradations accumulated over a run (SPEC_FULL.md §7 items 4
/// and 5). A run that hits either of these still completes and returns a
/// full [`BlameResult`]; these flags just tell the caller the rename
/// detection was not exhaustive.
#[derive(Clone, Debug, Default)]
pub struct BlameSummary {
    /// A similarity table overflowed for at least one pair during the run.
    pub similarity_table_overflowed: bool,
    /// `renameLimit` was exceeded at least once, so content-rename
    /// detection was skipped for the affected expansion(s).
    pub rename_limit_exceeded: bool,
    /// Number of frontier nodes popped; exposed mainly so the §8 scenario
    /// 6 ("queue order") property can be asserted directly in tests.
    pub nodes_visited: u64,
}

/// Write-once accumulator the scheduler attributes lines into as it walks.
/// Each `(path, index)` is written at most once (SPEC_FULL.md §3 invariant
/// 2); writing it twice is a scheduler bug, so [`Self::attribute`] asserts
/// rather than silently overwriting.
pub struct ResultStore {
    files: Mutex<HashMap<RepoPathBuf, Vec<LineBlame>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a target file with `line_count` unattributed lines.
    pub fn register(&self, original_path: RepoPathBuf, line_count: usize) {
        let mut files = self.files.lock().unwrap();
        files
            .entry(original_path)
            .or_insert_with(|| (0..line_count).map(|_| LineBlame::unattributed()).collect());
    }

    /// Attributes line `index` of `original_path` to `commit`. Panics if
    /// that index was already attributed, which would indicate the region
    /// algebra let two regions claim the same result line.
    pub fn attribute(
        &self,
        original_path: &RepoPathBuf,
        index: usize,
        commit: Option<ObjectId>,
        commit_date: Option<DateTime<Utc>>,
        author_email: Option<String>,
    ) {
        let mut files = self.files.lock().unwrap();
        let lines = files
            .get_mut(original_path)
            .unwrap_or_else(|| panic!("attributing unregistered path {original_path}"));
        let slot = &mut lines[index];
        assert!(
            slot.commit.is_none(),
            "line {index} of {original_path} attributed twice"
        );
        slot.commit = commit;
        slot.commit_date = commit_date;
        slot.author_email = author_email;
    }

    /// Consumes the store into the final [`BlameResult`].
    pub fn into_result(self) -> BlameResult {
        let files = self.files.into_inner().unwrap();
        BlameResult {
            files: files
                .into_iter()
                .map(|(path, lines)| (path, FileBlame { lines }))
                .collect(),
        }
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
