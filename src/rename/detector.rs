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

//! Component D: the rename detector that orchestrates exact-id matching
//! followed by content-similarity matching, and resolves MODIFY "breaks"
//! (SPEC_FULL.md §4.D).
//!
//! Grounded on `src_teacher/copies.rs`'s `CopyRecords`/`CopyOperation` for
//! the public Copy-vs-Rename vocabulary, generalized here from jj's
//! single-pass copy-tracking (copies are reported by the backend, not
//! detected) to the full three-phase detector the spec requires.

use std::collections::HashMap;
use std::collections::HashSet;

use itertools::Itertools as _;

use crate::config::BlameOptions;
use crate::diff_entry::sort_output;
use crate::diff_entry::ChangeType;
use crate::diff_entry::DiffEntry;
use crate::progress::CancellationToken;
use crate::rename::path_score::path_name_score;
use crate::rename::similarity_detector;
use crate::repo_path::RepoPathBuf;
use crate::store::ObjectStore;

/// Non-fatal degradations surfaced by one detector run (SPEC_FULL.md §7
/// items 4 and 5).
#[derive(Debug, Default, Clone, Copy)]
pub struct DetectorOutcome {
    pub similarity_table_overflowed: bool,
    pub rename_limit_exceeded: bool,
}

/// Runs the full three(-plus-rejoin)-phase rename detector over `entries`,
/// returning the final, sorted `Vec<DiffEntry>` (SPEC_FULL.md §4.D "Output
/// ordering") and the non-fatal degradation flags observed along the way.
pub fn detect_renames<S: ObjectStore>(
    store: &S,
    mut entries: Vec<DiffEntry>,
    options: &BlameOptions,
    cancellation: &CancellationToken,
) -> Result<(Vec<DiffEntry>, DetectorOutcome), crate::error::BlameError> {
    let mut outcome = DetectorOutcome::default();

    // Phase 1: break weak MODIFYs into synthetic DELETE+ADD pairs so both
    // sides become rename candidates (SPEC_FULL.md §4.D phase 1).
    let mut broken_pairs: Vec<(RepoPathBuf, RepoPathBuf)> = Vec::new();
    if options.break_score > 0 {
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.change_type != ChangeType::Modify {
                kept.push(entry);
                continue;
            }
            let score = single_pair_score(store, &entry)?;
            if i32::from(score) < options.break_score {
                let old_path = entry.old_path.clone().expect("modify entry has an old path");
                let new_path = entry.new_path.clone().expect("modify entry has a new path");
                broken_pairs.push((old_path.clone(), new_path.clone()));
                kept.push(DiffEntry::delete(old_path, entry.old_id.clone(), entry.old_kind.unwrap()));
                kept.push(DiffEntry::add(new_path, entry.new_id.clone(), entry.new_kind.unwrap()));
            } else {
                kept.push(entry);
            }
        }
        entries = kept;
    }

    let mut deletes: Vec<DiffEntry> = Vec::new();
    let mut adds: Vec<DiffEntry> = Vec::new();
    let mut rest: Vec<DiffEntry> = Vec::new();
    for entry in entries {
        match entry.change_type {
            ChangeType::Delete => deletes.push(entry),
            ChangeType::Add => adds.push(entry),
            _ => rest.push(entry),
        }
    }

    let mut matched_source_paths: HashSet<RepoPathBuf> = HashSet::new();

    // Phase 2: exact renames by blob-id equality (score 100).
    let (exact_output, remaining_deletes, remaining_adds) =
        exact_rename_phase(deletes, adds, &mut matched_source_paths);
    rest.extend(exact_output);

    // Deterministic secondary sort by `oldPath`/`newPath` before content
    // rename detection, per SPEC_FULL.md §9 open question: the original's
    // hash-map-ordering instability is resolved here by imposing a total
    // order rather than leaving it to iteration order.
    let mut remaining_deletes = remaining_deletes;
    let mut remaining_adds = remaining_adds;
    remaining_deletes.sort_by(|a, b| a.old_path.cmp(&b.old_path));
    remaining_adds.sort_by(|a, b| a.new_path.cmp(&b.new_path));

    // Phase 3: content renames, if both sides remain and we are under the
    // configured rename limit.
    if !remaining_deletes.is_empty() && !remaining_adds.is_empty() {
        if options.content_renames_enabled_for(remaining_adds.len(), remaining_deletes.len()) {
            let sim_outcome = similarity_detector::find_similar_pairs(
                store,
                &remaining_deletes,
                &remaining_adds,
                options,
                &mut matched_source_paths,
                cancellation,
            )?;
            outcome.similarity_table_overflowed |= sim_outcome.table_overflowed;

            let mut claimed_deletes = vec![false; remaining_deletes.len()];
            let mut claimed_adds = vec![false; remaining_adds.len()];
            for (src_idx, dst_idx, score, change_type) in sim_outcome.pairs {
                claimed_deletes[src_idx] = true;
                claimed_adds[dst_idx] = true;
                rest.push(similarity_detector::to_diff_entry(
                    &remaining_deletes[src_idx],
                    &remaining_adds[dst_idx],
                    score,
                    change_type,
                ));
            }
            rest.extend(
                remaining_deletes
                    .into_iter()
                    .zip(claimed_deletes)
                    .filter(|(_, claimed)| !claimed)
                    .map(|(e, _)| e),
            );
            rest.extend(
                remaining_adds
                    .into_iter()
                    .zip(claimed_adds)
                    .filter(|(_, claimed)| !claimed)
                    .map(|(e, _)| e),
            );
        } else {
            outcome.rename_limit_exceeded = options.rename_limit > 0;
            rest.extend(remaining_deletes);
            rest.extend(remaining_adds);
        }
    } else {
        rest.extend(remaining_deletes);
        rest.extend(remaining_adds);
    }

    // Phase 4: rejoin broken modifications that did not pair up as renames
    // to a different file (SPEC_FULL.md §4.D phase 4, §9 open question: a
    // last-write-wins map keyed by `newPath`).
    if !broken_pairs.is_empty() {
        rejoin_broken_modifications(&mut rest, &broken_pairs);
    }

    sort_output(&mut rest);
    Ok((rest, outcome))
}

/// Single-pair similarity score used by the break-weak-MODIFY phase
/// (SPEC_FULL.md §4.D phase 1): identical in shape to one pairing of
/// component C, just without the matrix machinery.
fn single_pair_score<S: ObjectStore>(store: &S, entry: &DiffEntry) -> Result<u8, crate::error::BlameError> {
    let old = store.open(&entry.old_id).map_err(|e| crate::error::BlameError::Backend(e))?;
    let new = store.open(&entry.new_id).map_err(|e| crate::error::BlameError::Backend(e))?;
    let old_index = crate::similarity::SimilarityIndex::build(&old);
    let new_index = crate::similarity::SimilarityIndex::build(&new);
    let (Ok(old_index), Ok(new_index)) = (old_index, new_index) else {
        // Table overflow on a break check: treat as "definitely similar" so
        // the MODIFY is not broken on uncomparable content.
        return Ok(100);
    };
    Ok(old_index.score(&new_index, 100) as u8)
}

/// Phase 2 (SPEC_FULL.md §4.D): builds blob-id-keyed maps for deletes and
/// adds, resolves 1:1, 1-add-to-many-deletes, many-adds-to-one-delete and
/// many-to-many cases, and returns `(resolved_entries, leftover_deletes,
/// leftover_adds)`.
fn exact_rename_phase(
    deletes: Vec<DiffEntry>,
    adds: Vec<DiffEntry>,
    matched_source_paths: &mut HashSet<RepoPathBuf>,
) -> (Vec<DiffEntry>, Vec<DiffEntry>, Vec<DiffEntry>) {
    let mut deletes_by_id: HashMap<Vec<u8>, Vec<DiffEntry>> = HashMap::new();
    for d in deletes {
        deletes_by_id.entry(d.old_id.as_bytes().to_vec()).or_default().push(d);
    }
    let mut adds_by_id: HashMap<Vec<u8>, Vec<DiffEntry>> = HashMap::new();
    for a in adds {
        adds_by_id.entry(a.new_id.as_bytes().to_vec()).or_default().push(a);
    }

    let mut resolved = Vec::new();
    let mut leftover_deletes = Vec::new();
    let mut leftover_adds = Vec::new();

    let ids: Vec<Vec<u8>> = deletes_by_id
        .keys()
        .cloned()
        .chain(adds_by_id.keys().cloned())
        .unique()
        .collect();

    for id in ids {
        let ds = deletes_by_id.remove(&id).unwrap_or_default();
        let as_ = adds_by_id.remove(&id).unwrap_or_default();
        if ds.is_empty() {
            leftover_adds.extend(as_);
            continue;
        }
        if as_.is_empty() {
            leftover_deletes.extend(ds);
            continue;
        }

        let compatible = |d: &DiffEntry, a: &DiffEntry| mode_compatible(d, a);

        match (ds.len(), as_.len()) {
            (1, 1) => {
                let (d, a) = (&ds[0], &as_[0]);
                if compatible(d, a) {
                    resolved.push(make_rename(d, a, matched_source_paths));
                } else {
                    leftover_deletes.push(d.clone());
                    leftover_adds.push(a.clone());
                }
            }
            (_, 1) => {
                // one-add-to-many-deletes: best path match among
                // mode-compatible deletes.
                let a = &as_[0];
                let best = ds
                    .iter()
                    .filter(|d| compatible(d, a))
                    .max_by_key(|d| path_name_score(d.old_path.as_ref().unwrap(), a.new_path.as_ref().unwrap()));
                if let Some(best) = best {
                    let best = best.clone();
                    resolved.push(make_rename(&best, a, matched_source_paths));
                    leftover_deletes.extend(ds.into_iter().filter(|d| d.old_path != best.old_path));
                } else {
                    leftover_deletes.extend(ds);
                    leftover_adds.push(a.clone());
                }
            }
            (1, _) => {
                // many-adds-to-one-delete: best add is RENAME, the rest COPY.
                let d = &ds[0];
                let best = as_
                    .iter()
                    .filter(|a| compatible(d, a))
                    .max_by_key(|a| path_name_score(d.old_path.as_ref().unwrap(), a.new_path.as_ref().unwrap()));
                if let Some(best) = best {
                    let best = best.clone();
                    resolved.push(make_rename(d, &best, matched_source_paths));
                    for a in &as_ {
                        if a.new_path != best.new_path && compatible(d, a) {
                            resolved.push(make_rename(d, a, matched_source_paths));
                        } else if a.new_path != best.new_path {
                            leftover_adds.push(a.clone());
                        }
                    }
                } else {
                    leftover_deletes.push(d.clone());
                    leftover_adds.extend(as_);
                }
            }
            _ => {
                // many-to-many: full name-score matrix, greedy claim.
                let mut scored: Vec<(usize, usize, u32)> = Vec::new();
                for (di, d) in ds.iter().enumerate() {
                    for (ai, a) in as_.iter().enumerate() {
                        if !compatible(d, a) {
                            continue;
                        }
                        let score = path_name_score(d.old_path.as_ref().unwrap(), a.new_path.as_ref().unwrap());
                        scored.push((di, ai, score));
                    }
                }
                scored.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
                let mut claimed_d = vec![false; ds.len()];
                let mut claimed_a = vec![false; as_.len()];
                for (di, ai, _) in scored {
                    if claimed_a[ai] {
                        continue;
                    }
                    claimed_a[ai] = true;
                    claimed_d[di] = true;
                    resolved.push(make_rename(&ds[di], &as_[ai], matched_source_paths));
                }
                for (di, d) in ds.into_iter().enumerate() {
                    if !claimed_d[di] {
                        leftover_deletes.push(d);
                    }
                }
                for (ai, a) in as_.into_iter().enumerate() {
                    if !claimed_a[ai] {
                        leftover_adds.push(a);
                    }
                }
            }
        }
    }

    (resolved, leftover_deletes, leftover_adds)
}

fn mode_compatible(d: &DiffEntry, a: &DiffEntry) -> bool {
    match (d.old_kind, a.new_kind) {
        (Some(dk), Some(ak)) => dk.compatible_with(ak),
        _ => false,
    }
}

/// Emits a RENAME, or a COPY if `d.old_path` is already in
/// `matched_source_paths` from an earlier claim in this same exact-rename
/// phase (this mirrors the "many-adds-to-one-delete" sub-case, where the
/// first add claimed is a RENAME and the rest are COPY).
fn make_rename(d: &DiffEntry, a: &DiffEntry, matched_source_paths: &mut HashSet<RepoPathBuf>) -> DiffEntry {
    let old_path = d.old_path.clone().expect("delete entry has an old path");
    let change_type = if matched_source_paths.insert(old_path) {
        ChangeType::Rename
    } else {
        ChangeType::Copy
    };
    DiffEntry {
        change_type,
        old_path: d.old_path.clone(),
        new_path: a.new_path.clone(),
        old_id: d.old_id.clone(),
        new_id: a.new_id.clone(),
        old_kind: d.old_kind,
        new_kind: a.new_kind,
        score: 100,
    }
}

/// Phase 4 (SPEC_FULL.md §4.D): re-unify a broken `(oldPath, newPath)` pair
/// back into a single MODIFY entry if both halves are still present as
/// standalone DELETE and ADD after renames/copies were resolved (i.e.
/// neither half paired up with a *different* file). Uses a last-write-wins
/// map keyed by `newPath`, per the SPEC_FULL.md §9 open question.
fn rejoin_broken_modifications(entries: &mut Vec<DiffEntry>, broken_pairs: &[(RepoPathBuf, RepoPathBuf)]) {
    let mut new_path_to_old: HashMap<RepoPathBuf, RepoPathBuf> = HashMap::new();
    for (old_path, new_path) in broken_pairs {
        new_path_to_old.insert(new_path.clone(), old_path.clone());
    }

    let mut delete_positions: HashMap<RepoPathBuf, usize> = HashMap::new();
    let mut add_positions: HashMap<RepoPathBuf, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        match entry.change_type {
            ChangeType::Delete => {
                delete_positions.insert(entry.old_path.clone().unwrap(), i);
            }
            ChangeType::Add => {
                add_positions.insert(entry.new_path.clone().unwrap(), i);
            }
            _ => {}
        }
    }

    let mut to_remove = Vec::new();
    let mut to_modify = Vec::new();
    for (new_path, old_path) in &new_path_to_old {
        let (Some(&del_pos), Some(&add_pos)) =
            (delete_positions.get(old_path), add_positions.get(new_path))
        else {
            continue;
        };
        to_modify.push((del_pos, add_pos, old_path.clone(), new_path.clone()));
        to_remove.push(add_pos);
    }

    for (del_pos, add_pos, old_path, new_path) in to_modify {
        let old_id = entries[del_pos].old_id.clone();
        let old_kind = entries[del_pos].old_kind;
        let new_id = entries[add_pos].new_id.clone();
        let new_kind = entries[add_pos].new_kind;
        entries[del_pos] = DiffEntry {
            change_type: ChangeType::Modify,
            old_path: Some(old_path),
            new_path: Some(new_path),
            old_id,
            new_id,
            old_kind,
            new_kind,
            score: 0,
        };
    }
    to_remove.sort_unstable();
    for pos in to_remove.into_iter().rev() {
        entries.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntryKind;
    use crate::store::ObjectId;
    use crate::testutils::InMemoryStore;

    fn store_with(paths_and_content: &[(&str, &[u8])]) -> (InMemoryStore, Vec<ObjectId>) {
        let mut store = InMemoryStore::new();
        let mut ids = Vec::new();
        for (_, content) in paths_and_content {
            let id = ObjectId::new(content.to_vec());
            store.put_blob(id.clone(), content.to_vec());
            ids.push(id);
        }
        (store, ids)
    }

    #[test]
    fn exact_rename_by_blob_id() {
        let content: &[u8] = b"l1\nl2\nl3\n";
        let (store, ids) = store_with(&[("a", content)]);
        let id = ids[0].clone();
        let entries = vec![
            DiffEntry::delete(RepoPathBuf::new("old.rs"), id.clone(), EntryKind::RegularFile),
            DiffEntry::add(RepoPathBuf::new("new.rs"), id, EntryKind::RegularFile),
        ];
        let (result, outcome) =
            detect_renames(&store, entries, &BlameOptions::default(), &CancellationToken::new()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].change_type, ChangeType::Rename);
        assert_eq!(result[0].score, 100);
        assert!(!outcome.similarity_table_overflowed);
    }

    #[test]
    fn many_adds_to_one_delete_first_is_rename_rest_are_copy() {
        let content: &[u8] = b"l1\nl2\nl3\n";
        let (store, ids) = store_with(&[("a", content)]);
        let id = ids[0].clone();
        let entries = vec![
            DiffEntry::delete(RepoPathBuf::new("old.rs"), id.clone(), EntryKind::RegularFile),
            DiffEntry::add(RepoPathBuf::new("new_a.rs"), id.clone(), EntryKind::RegularFile),
            DiffEntry::add(RepoPathBuf::new("new_b.rs"), id, EntryKind::RegularFile),
        ];
        let (result, _) =
            detect_renames(&store, entries, &BlameOptions::default(), &CancellationToken::new()).unwrap();
        assert_eq!(result.len(), 2);
        let renames = result.iter().filter(|e| e.change_type == ChangeType::Rename).count();
        let copies = result.iter().filter(|e| e.change_type == ChangeType::Copy).count();
        assert_eq!(renames, 1);
        assert_eq!(copies, 1);
    }

    #[test]
    fn rename_limit_negative_skips_content_renames_entirely() {
        let (store, ids) = store_with(&[("a", b"l1\nl2\nl3\nl4\nl5\n"), ("b", b"l1\nl2\nl3\nl4\nl6\n")]);
        let entries = vec![
            DiffEntry::delete(RepoPathBuf::new("old.rs"), ids[0].clone(), EntryKind::RegularFile),
            DiffEntry::add(RepoPathBuf::new("new.rs"), ids[1].clone(), EntryKind::RegularFile),
        ];
        let mut options = BlameOptions::default();
        options.rename_limit = -1;
        let (result, outcome) = detect_renames(&store, entries, &options, &CancellationToken::new()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|e| matches!(e.change_type, ChangeType::Delete | ChangeType::Add)));
        assert!(!outcome.rename_limit_exceeded); // negative means "skip", not "exceeded"
    }

    #[test]
    fn output_ordering_puts_delete_before_add_before_others() {
        let content: &[u8] = b"l1\n";
        let (store, ids) = store_with(&[("x", content)]);
        let id = ids[0].clone();
        let entries = vec![
            DiffEntry::add(RepoPathBuf::new("z_new.rs"), ObjectId::new(b"zzz".to_vec()), EntryKind::RegularFile),
            DiffEntry::delete(RepoPathBuf::new("z_new.rs"), id, EntryKind::RegularFile),
        ];
        let (result, _) =
            detect_renames(&store, entries, &BlameOptions::default(), &CancellationToken::new()).unwrap();
        assert_eq!(result[0].change_type, ChangeType::Delete);
        assert_eq!(result[1].change_type, ChangeType::Add);
    }
}
