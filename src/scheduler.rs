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

//! Component G: the commit-graph blame scheduler (SPEC_FULL.md §4.G).
//!
//! Grounded on `src_teacher/default_index/revset_graph_iterator.rs`'s
//! pop-highest-then-look-at-parents shape (there: commit positions and edge
//! filtering; here: a commit-time-ordered frontier and region hand-off), and
//! on `src_teacher/fix.rs`'s `rayon`-parallel per-item worker pool for the
//! per-file blame dispatch within one expansion step.

use std::collections::BinaryHeap;
use std::collections::HashMap;

use indexmap::IndexSet;
use rayon::prelude::*;

use crate::blame_file;
use crate::blame_file::BlameOutcome;
use crate::candidate::CommitNode;
use crate::candidate::FileCandidate;
use crate::candidate::GraphNode;
use crate::candidate::NodeIdentity;
use crate::config::BlameOptions;
use crate::diff_backend::DiffAlgorithm;
use crate::diff_entry::DiffFile;
use crate::error::BlameError;
use crate::region::Region;
use crate::region::RegionList;
use crate::repo_path::RepoPathBuf;
use crate::result::ResultStore;
use crate::store::ObjectId;
use crate::store::ObjectStore;
use crate::tree_diff;

/// A single frontier entry's heap key: reverse-commit-time order, with a
/// deterministic tie-break (SPEC_FULL.md §4.G, §5 "ordering guarantees").
/// [`BinaryHeap`] is a max-heap, so the greatest `effective_time` — the
/// most-recent commit, or the working tree's `i64::MAX` — is popped first.
#[derive(Clone, Eq, PartialEq)]
struct HeapKey {
    effective_time: i64,
    tie_break: Vec<u8>,
    identity: NodeIdentity,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.effective_time
            .cmp(&other.effective_time)
            .then_with(|| self.tie_break.cmp(&other.tie_break))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The priority-ordered frontier, with merge-on-reentry (SPEC_FULL.md §4.G
/// `push`). Node payloads live in `nodes`, keyed by commit identity, so a
/// node that is pushed twice before being popped is merged in place rather
/// than creating a second heap entry.
struct Frontier {
    heap: BinaryHeap<HeapKey>,
    nodes: HashMap<NodeIdentity, GraphNode>,
}

impl Frontier {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            nodes: HashMap::new(),
        }
    }

    fn push(&mut self, node: GraphNode) {
        if node.is_empty() {
            return;
        }
        let identity = node.commit.identity();
        if let Some(existing) = self.nodes.get_mut(&identity) {
            existing.merge_from(node);
            return;
        }
        let key = HeapKey {
            effective_time: node.commit.effective_time(),
            tie_break: identity.tie_break_bytes().to_vec(),
            identity: identity.clone(),
        };
        self.nodes.insert(identity, node);
        self.heap.push(key);
    }

    fn pop(&mut self) -> Option<GraphNode> {
        let key = self.heap.pop()?;
        self.nodes.remove(&key.identity)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// How a single child candidate's path relates to one parent's tree,
/// established from that parent's [`DiffFile`] set (SPEC_FULL.md §4.G
/// first/second/third pass, plus the "added, no parent counterpart" case
/// that claims nothing).
enum Classification {
    /// Not in the parent's DiffFile set: unmodified at this path.
    Unmodified,
    /// A DiffFile exists but its blob id equals the candidate's own:
    /// unchanged content despite a rename/copy.
    ExactMatch { old_path: RepoPathBuf, old_blob: ObjectId },
    /// A DiffFile exists with a genuinely different blob: needs per-file
    /// blame.
    Modified { old_path: RepoPathBuf, old_blob: ObjectId },
    /// A DiffFile exists with no `old_path`: added relative to this parent.
    Added,
}

fn classify(candidate: &FileCandidate, diff_files: &HashMap<&RepoPathBuf, &DiffFile>) -> Classification {
    match diff_files.get(&candidate.path) {
        None => Classification::Unmodified,
        Some(diff_file) => match &diff_file.old_path {
            None => Classification::Added,
            Some(old_path) => {
                if diff_file.old_object_id == candidate.blob {
                    Classification::ExactMatch {
                        old_path: old_path.clone(),
                        old_blob: diff_file.old_object_id.clone(),
                    }
                } else {
                    Classification::Modified {
                        old_path: old_path.clone(),
                        old_blob: diff_file.old_object_id.clone(),
                    }
                }
            }
        },
    }
}

/// Per-parent context gathered once per expansion step, before any
/// candidate is resolved against it.
struct ParentContext {
    commit_node: CommitNode,
    diff_files: Vec<DiffFile>,
}

/// What one candidate's resolution against every parent produced.
struct CandidateOutcome {
    /// `(parent_index, candidate)` pairs to hand off.
    to_parents: Vec<(usize, FileCandidate)>,
    /// What survives every parent's pass, attributed to the child's own
    /// commit (SPEC_FULL.md §4.G "because they were added by `c`").
    remaining: Option<RegionList>,
}

/// Non-fatal degradations accumulated while expanding one node, folded into
/// the run-wide [`crate::result::BlameSummary`] by the caller.
#[derive(Default)]
pub struct ExpansionOutcome {
    pub similarity_table_overflowed: bool,
    pub rename_limit_exceeded: bool,
}

/// Builds the initial frontier node for `start`, enumerating its tree
/// (restricted to `options.file_paths` when given), registering each file
/// with the result store, and seeding one whole-file region per candidate
/// (SPEC_FULL.md §4.G `initialize`).
pub fn initialize<S: ObjectStore>(
    store: &S,
    commit_node: CommitNode,
    tree_commit: &ObjectId,
    options: &BlameOptions,
    results: &ResultStore,
) -> Result<GraphNode, BlameError> {
    let entries = store.tree(tree_commit).map_err(wrap)?;
    let mut node = GraphNode::new(commit_node);
    for entry in entries {
        if let Some(paths) = &options.file_paths {
            if !paths.contains(&entry.path) {
                continue;
            }
        }
        let content = load_content(store, &entry.id, &entry.path, options)?;
        let line_count = crate::diff_backend::find_line_ranges(&content).len();
        results.register(entry.path.clone(), line_count);
        if line_count == 0 {
            continue;
        }
        let regions = RegionList::single(Region::new(0, 0, line_count as u32));
        node.add_or_merge(FileCandidate::new(entry.path.clone(), entry.path, entry.id, regions));
    }
    Ok(node)
}

/// Builds the initial frontier node for the working-tree pseudo-commit
/// anchored at `parent`: every regular-file entry of `parent`'s tree, with
/// `options.file_content_overrides` substituted in as the
/// [`ObjectId::null`] sentinel blob (SPEC_FULL.md §3's "working directory
/// at `originalPath`"), plus any override-only path with no counterpart in
/// `parent`'s tree at all (an uncommitted new file).
pub fn initialize_working_tree<S: ObjectStore>(
    store: &S,
    parent: ObjectId,
    options: &BlameOptions,
    results: &ResultStore,
) -> Result<GraphNode, BlameError> {
    let entries = store.tree(&parent).map_err(wrap)?;
    let mut seen: std::collections::HashSet<RepoPathBuf> = std::collections::HashSet::new();
    let mut node = GraphNode::new(CommitNode::WorkingTree { parent });

    let mut register_path = |path: RepoPathBuf, blob: ObjectId, node: &mut GraphNode| -> Result<(), BlameError> {
        if let Some(paths) = &options.file_paths {
            if !paths.contains(&path) {
                return Ok(());
            }
        }
        let content = load_content(store, &blob, &path, options)?;
        let line_count = crate::diff_backend::find_line_ranges(&content).len();
        results.register(path.clone(), line_count);
        if line_count > 0 {
            let regions = RegionList::single(Region::new(0, 0, line_count as u32));
            node.add_or_merge(FileCandidate::new(path.clone(), path, blob, regions));
        }
        Ok(())
    };

    for entry in entries {
        seen.insert(entry.path.clone());
        let blob = if options.file_content_overrides.contains_key(&entry.path) {
            ObjectId::null()
        } else {
            entry.id
        };
        register_path(entry.path, blob, &mut node)?;
    }
    for path in options.file_content_overrides.keys() {
        if seen.contains(path) {
            continue;
        }
        register_path(path.clone(), ObjectId::null(), &mut node)?;
    }
    Ok(node)
}

/// Expands one already-popped frontier node: diffs it against each parent,
/// resolves every candidate's fate, pushes any resulting parent nodes, and
/// finalizes whatever no parent claimed (SPEC_FULL.md §4.G `step`).
fn expand<S: ObjectStore>(
    store: &S,
    node: GraphNode,
    frontier: &mut Frontier,
    diff_algo: &dyn DiffAlgorithm,
    options: &BlameOptions,
    results: &ResultStore,
) -> Result<ExpansionOutcome, BlameError> {
    if options.cancellation.is_cancelled() {
        return Err(BlameError::Cancelled);
    }

    let parent_ids = node.commit.parents();
    if parent_ids.is_empty() {
        let commit = node.commit.clone();
        for candidate in node.into_candidates() {
            finalize(&candidate.original_path, &candidate.regions, &commit, results);
        }
        return Ok(ExpansionOutcome::default());
    }

    let candidates = node.candidates().to_vec();
    let target_paths: IndexSet<RepoPathBuf> = candidates.iter().map(|c| c.path.clone()).collect();

    let mut parent_contexts = Vec::with_capacity(parent_ids.len());
    let mut outcome = ExpansionOutcome::default();
    for parent_id in &parent_ids {
        let diff_outcome = tree_diff::diff_trees(
            store,
            parent_id,
            &child_tree_id(&node.commit),
            Some(&target_paths),
            options,
            &options.cancellation,
        )?;
        outcome.similarity_table_overflowed |= diff_outcome.similarity_table_overflowed;
        outcome.rename_limit_exceeded |= diff_outcome.rename_limit_exceeded;
        tracing::trace!(
            parent = %parent_id.hex(),
            files = diff_outcome.files.len(),
            "expanded one parent of frontier node"
        );
        let commit_node = CommitNode::Commit(store.commit(parent_id).map_err(wrap)?);
        parent_contexts.push(ParentContext {
            commit_node,
            diff_files: diff_outcome.files,
        });
    }

    if options.cancellation.is_cancelled() {
        return Err(BlameError::Cancelled);
    }

    let diff_file_maps: Vec<HashMap<&RepoPathBuf, &DiffFile>> = parent_contexts
        .iter()
        .map(|p| p.diff_files.iter().map(|f| (&f.new_path, f)).collect())
        .collect();

    let resolve = |candidate: &FileCandidate| -> Result<CandidateOutcome, BlameError> {
        resolve_candidate(store, candidate, &diff_file_maps, diff_algo, options)
    };

    let resolved: Vec<CandidateOutcome> = if options.multithreading {
        candidates.par_iter().map(resolve).collect::<Result<_, _>>()?
    } else {
        candidates.iter().map(resolve).collect::<Result<_, _>>()?
    };

    let commit = node.commit;
    let mut parent_nodes: Vec<GraphNode> = parent_contexts
        .into_iter()
        .map(|ctx| GraphNode::new(ctx.commit_node))
        .collect();

    for (candidate, candidate_outcome) in candidates.into_iter().zip(resolved) {
        for (parent_index, parent_candidate) in candidate_outcome.to_parents {
            parent_nodes[parent_index].add_or_merge(parent_candidate);
        }
        if let Some(remaining) = candidate_outcome.remaining {
            finalize(&candidate.original_path, &remaining, &commit, results);
        }
    }

    for parent_node in parent_nodes {
        frontier.push(parent_node);
    }

    Ok(outcome)
}

/// `node.commit`'s own tree id: the commit's own id for a real commit (per
/// [`ObjectStore::tree`]'s contract of taking a commit id), or the working
/// tree's anchor parent — the working-tree variant never reaches this path
/// since it is diffed via [`resolve_candidate`] against pre-built
/// candidates rather than a stored tree; see [`blame_working_tree`].
fn child_tree_id(commit: &CommitNode) -> ObjectId {
    match commit {
        CommitNode::Commit(meta) => meta.id.clone(),
        CommitNode::WorkingTree { parent } => parent.clone(),
    }
}

/// Resolves one candidate's fate against every parent (SPEC_FULL.md §4.G
/// "multiple parents case"): two separate passes over every parent's
/// classification, run in order — first unmodified, then exact-content
/// match (SPEC_FULL.md §4.G `step`) — so an `Unmodified` parent always wins
/// over an `ExactMatch` parent regardless of which one appears at the lower
/// parent index. Whichever pass finds a hit, the *whole* current region set
/// moves to that parent and every other parent is skipped entirely for this
/// candidate (§8 scenario 5, "parent with exact content short-circuits").
/// Otherwise, each `Modified` parent runs a real per-file blame in turn,
/// each consuming only what the previous parent's pass left unexplained
/// (§8 scenario 4, "regions merged at common parent"); whatever survives
/// every parent is attributed to the child's own commit.
fn resolve_candidate<S: ObjectStore>(
    store: &S,
    candidate: &FileCandidate,
    diff_file_maps: &[HashMap<&RepoPathBuf, &DiffFile>],
    diff_algo: &dyn DiffAlgorithm,
    options: &BlameOptions,
) -> Result<CandidateOutcome, BlameError> {
    let classifications: Vec<Classification> = diff_file_maps.iter().map(|map| classify(candidate, map)).collect();

    let short_circuit_index = classifications
        .iter()
        .position(|c| matches!(c, Classification::Unmodified))
        .or_else(|| classifications.iter().position(|c| matches!(c, Classification::ExactMatch { .. })));

    if let Some(index) = short_circuit_index {
        let (path, blob) = match &classifications[index] {
            Classification::Unmodified => (candidate.path.clone(), candidate.blob.clone()),
            Classification::ExactMatch { old_path, old_blob } => (old_path.clone(), old_blob.clone()),
            _ => unreachable!(),
        };
        let handed_off = FileCandidate::new(candidate.original_path.clone(), path, blob, candidate.regions.clone());
        return Ok(CandidateOutcome {
            to_parents: vec![(index, handed_off)],
            remaining: None,
        });
    }

    let mut to_parents = Vec::new();
    let mut remaining = candidate.regions.clone();
    for (index, classification) in classifications.into_iter().enumerate() {
        if remaining.is_empty() {
            break;
        }
        let Classification::Modified { old_path, old_blob } = classification else {
            continue;
        };
        if options.cancellation.is_cancelled() {
            return Err(BlameError::Cancelled);
        }
        let worker_store = store.clone();
        let BlameOutcome { child_remaining, parent_regions } = blame_file::blame_one_file(
            diff_algo,
            options.line_comparator,
            &old_blob,
            &candidate.blob,
            || load_content(&worker_store, &old_blob, &old_path, options),
            || load_content(&worker_store, &candidate.blob, &candidate.path, options),
            std::mem::take(&mut remaining),
        )?;
        remaining = child_remaining;
        if !parent_regions.is_empty() {
            to_parents.push((
                index,
                FileCandidate::new(candidate.original_path.clone(), old_path, old_blob, parent_regions),
            ));
        }
    }

    Ok(CandidateOutcome {
        remaining: if remaining.is_empty() { None } else { Some(remaining) },
        to_parents,
    })
}

/// Attributes every line of `regions` to `commit` in `results`.
fn finalize(original_path: &RepoPathBuf, regions: &RegionList, commit: &CommitNode, results: &ResultStore) {
    let commit_id = commit.commit_id().cloned();
    let commit_date = commit.committer_date();
    let author_email = commit.author_email().map(str::to_string);
    for region in regions.iter() {
        for offset in 0..region.length {
            let index = (region.result_start + offset) as usize;
            results.attribute(original_path, index, commit_id.clone(), commit_date, author_email.clone());
        }
    }
}

/// Loads a blob's bytes, substituting `options.file_content_overrides` for
/// the working-tree sentinel blob ([`ObjectId::is_null`]). A subsequent
/// failed [`ObjectStore::open`] is reported as
/// [`BlameError::MissingObject`] (SPEC_FULL.md §7 error taxonomy item 3).
fn load_content<S: ObjectStore>(
    store: &S,
    blob: &ObjectId,
    path: &RepoPathBuf,
    options: &BlameOptions,
) -> Result<Vec<u8>, BlameError> {
    if blob.is_null() {
        return Ok(options.file_content_overrides.get(path).cloned().unwrap_or_default());
    }
    store.open(blob).map_err(|_| BlameError::MissingObject(blob.clone()))
}

fn wrap(e: crate::store::StoreError) -> BlameError {
    BlameError::Backend(e)
}

/// Drives the scheduler to completion: repeatedly pops and expands the most
/// recent frontier node until it is empty, invoking `progress` once per pop
/// (SPEC_FULL.md §4.G `step`, §5 "ordering guarantees").
pub fn run<S: ObjectStore>(
    store: &S,
    start: GraphNode,
    diff_algo: &dyn DiffAlgorithm,
    options: &BlameOptions,
    results: &ResultStore,
) -> Result<crate::result::BlameSummary, BlameError> {
    let mut frontier = Frontier::new();
    let mut summary = crate::result::BlameSummary::default();
    frontier.push(start);

    while let Some(node) = frontier.pop() {
        if options.cancellation.is_cancelled() {
            return Err(BlameError::Cancelled);
        }
        let hash = node.commit.commit_id().map(ObjectId::hex).unwrap_or_else(|| "0".repeat(40));
        tracing::debug!(commit = %hash, remaining = frontier.len(), "scheduler popped frontier node");
        if let Some(progress) = &options.progress {
            progress(summary.nodes_visited + 1, &hash);
        }
        let expansion = expand(store, node, &mut frontier, diff_algo, options, results)?;
        summary.similarity_table_overflowed |= expansion.similarity_table_overflowed;
        summary.rename_limit_exceeded |= expansion.rename_limit_exceeded;
        summary.nodes_visited += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemoryStore;

    fn id(bytes: &[u8]) -> ObjectId {
        ObjectId::new(bytes.to_vec())
    }

    fn path(p: &str) -> RepoPathBuf {
        RepoPathBuf::new(p)
    }

    fn candidate(regions: &[(u32, u32, u32)]) -> FileCandidate {
        let mut list = RegionList::new();
        for &(result_start, source_start, length) in regions {
            list.append(Region::new(result_start, source_start, length));
        }
        FileCandidate::new(path("f.txt"), path("f.txt"), id(b"child"), list)
    }

    #[test]
    fn frontier_merges_nodes_pushed_for_the_same_commit() {
        let mut frontier = Frontier::new();

        let mut first = GraphNode::new(CommitNode::Commit(crate::store::CommitMeta {
            id: id(b"p"),
            commit_time: 10,
            parents: vec![],
            author_email: "a@x.com".into(),
            committer_date: chrono::Utc::now(),
        }));
        first.add_or_merge(candidate(&[(0, 0, 2)]));
        frontier.push(first);

        let mut second = GraphNode::new(CommitNode::Commit(crate::store::CommitMeta {
            id: id(b"p"),
            commit_time: 10,
            parents: vec![],
            author_email: "a@x.com".into(),
            committer_date: chrono::Utc::now(),
        }));
        second.add_or_merge(candidate(&[(2, 2, 1)]));
        frontier.push(second);

        // Pushing two nodes for the same commit identity merges them into a
        // single heap entry rather than visiting the commit twice.
        let popped = frontier.pop().expect("one merged node");
        assert!(frontier.pop().is_none());
        assert_eq!(popped.candidates().len(), 1);
        assert_eq!(popped.candidates()[0].regions.total_length(), 3);
    }

    #[test]
    fn classify_distinguishes_unmodified_exact_match_modified_and_added() {
        let c = candidate(&[(0, 0, 1)]);

        let empty = HashMap::new();
        assert!(matches!(classify(&c, &empty), Classification::Unmodified));

        let added = DiffFile {
            new_path: path("f.txt"),
            old_path: None,
            old_object_id: ObjectId::null(),
        };
        let mut map = HashMap::new();
        map.insert(&added.new_path, &added);
        assert!(matches!(classify(&c, &map), Classification::Added));

        let exact = DiffFile {
            new_path: path("f.txt"),
            old_path: Some(path("old.txt")),
            old_object_id: id(b"child"),
        };
        let mut map = HashMap::new();
        map.insert(&exact.new_path, &exact);
        assert!(matches!(classify(&c, &map), Classification::ExactMatch { .. }));

        let modified = DiffFile {
            new_path: path("f.txt"),
            old_path: Some(path("old.txt")),
            old_object_id: id(b"parent"),
        };
        let mut map = HashMap::new();
        map.insert(&modified.new_path, &modified);
        assert!(matches!(classify(&c, &map), Classification::Modified { .. }));
    }

    /// SPEC_FULL.md §8 scenario 5: a merge with one parent whose content
    /// exactly matches the child must hand the whole file to that parent,
    /// never splitting it against another parent that merely differs.
    #[test]
    fn exact_match_parent_short_circuits_over_a_modified_parent() {
        let mut store = InMemoryStore::new();
        let c2_blob = id(b"l1,l3");
        let c3_blob = id(b"l1,l2");
        let merge_blob = id(b"l1,l2");
        store.put_blob(c2_blob.clone(), b"l1\nl3\n".to_vec());
        store.put_blob(c3_blob.clone(), b"l1\nl2\n".to_vec());
        store.put_blob(merge_blob.clone(), b"l1\nl2\n".to_vec());

        let f = path("f.txt");
        store.put_commit(id(b"c2"), 10, vec![], "a@x.com", vec![(f.clone(), c2_blob.clone())]);
        store.put_commit(id(b"c3"), 20, vec![], "a@x.com", vec![(f.clone(), c3_blob.clone())]);
        store.put_commit(
            id(b"cm"),
            30,
            vec![id(b"c2"), id(b"c3")],
            "a@x.com",
            vec![(f.clone(), merge_blob)],
        );

        let results = ResultStore::new();
        let commit_node = CommitNode::Commit(store.commit(&id(b"cm")).unwrap());
        let start = initialize(&store, commit_node, &id(b"cm"), &BlameOptions::default(), &results).unwrap();
        let diff_algo = crate::diff_backend::HistogramDiff;
        run(&store, start, &diff_algo, &BlameOptions::default(), &results).unwrap();

        let result = results.into_result();
        let blame = result.get(&f).unwrap();
        let hashes: Vec<_> = blame.commit_hashes().map(|h| h.cloned()).collect();
        assert_eq!(hashes, vec![Some(id(b"c3")), Some(id(b"c3"))]);
    }

    /// SPEC_FULL.md §8 scenario 4: a merge whose two parents each explain a
    /// disjoint part of the child keeps both attributions (progressive
    /// per-parent consumption, no short-circuit available here).
    #[test]
    fn disjoint_parent_edits_are_both_attributed_at_the_common_parent() {
        let mut store = InMemoryStore::new();
        let base_blob = id(b"base");
        let left_blob = id(b"left");
        let right_blob = id(b"right");
        let merge_blob = id(b"merge");
        store.put_blob(base_blob.clone(), b"l1\nl2\nl3\n".to_vec());
        store.put_blob(left_blob.clone(), b"L1\nl2\nl3\n".to_vec());
        store.put_blob(right_blob.clone(), b"L1\nl2\nL3\n".to_vec());
        store.put_blob(merge_blob.clone(), b"L1\nl2\nL3\n".to_vec());

        let f = path("f.txt");
        store.put_commit(id(b"base"), 0, vec![], "a@x.com", vec![(f.clone(), base_blob)]);
        store.put_commit(id(b"left"), 10, vec![id(b"base")], "a@x.com", vec![(f.clone(), left_blob)]);
        store.put_commit(id(b"right"), 20, vec![id(b"left")], "a@x.com", vec![(f.clone(), right_blob)]);
        store.put_commit(
            id(b"cm"),
            30,
            vec![id(b"left"), id(b"right")],
            "a@x.com",
            vec![(f.clone(), merge_blob)],
        );

        let results = ResultStore::new();
        let commit_node = CommitNode::Commit(store.commit(&id(b"cm")).unwrap());
        let start = initialize(&store, commit_node, &id(b"cm"), &BlameOptions::default(), &results).unwrap();
        let diff_algo = crate::diff_backend::HistogramDiff;
        run(&store, start, &diff_algo, &BlameOptions::default(), &results).unwrap();

        let result = results.into_result();
        let blame = result.get(&f).unwrap();
        let hashes: Vec<_> = blame.commit_hashes().map(|h| h.cloned()).collect();
        assert_eq!(hashes, vec![Some(id(b"left")), Some(id(b"base")), Some(id(b"right"))]);
    }
}
