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

//! The score-matrix similarity rename/copy detector (SPEC_FULL.md §4.C),
//! component C.
//!
//! Grounded on the candidate-generation/fallback-ordering shape of
//! `other_examples/38b64f09_vegerot-sapling__eden-scm-lib-copytrace-src-rename_finders.rs.rs`
//! (sources vs. destinations, a size/name prefilter before content
//! comparison) and the Copy-vs-Rename output vocabulary of
//! `src_teacher/copies.rs`'s `CopyOperation`.

use std::collections::HashSet;

use crate::config::BlameOptions;
use crate::diff_entry::ChangeType;
use crate::diff_entry::DiffEntry;
use crate::progress::CancellationToken;
use crate::rename::path_score::path_name_score;
use crate::repo_path::RepoPathBuf;
use crate::similarity::SimilarityIndex;
use crate::store::ObjectId;
use crate::store::ObjectStore;

/// `2^28`: the index-encoding bound on either side's length (SPEC_FULL.md
/// §4.C "Scale limit").
const INDEX_MASK: u32 = (1 << 28) - 1;

/// One side's candidate: the path/id/kind plus cached size, used both as a
/// "source" (delete side) and a "destination" (add side) depending on
/// which list it is passed in.
#[derive(Clone, Debug)]
struct Side {
    path: RepoPathBuf,
    id: ObjectId,
    is_regular_file: bool,
    size: u64,
    entry_index: usize,
}

/// Surfaced to the caller when a similarity table overflowed for at least
/// one pair (SPEC_FULL.md §4.C "Overflow signalling", §7 item 4).
#[derive(Debug, Default)]
pub struct SimilarityOutcome {
    /// `(source_index, destination_index, score, change_type)`, indices into
    /// the `sources`/`destinations` slices passed to
    /// [`find_similar_pairs`]. `change_type` is `Rename` the first time a
    /// source's `oldPath` is claimed in this run (and not already present
    /// in the caller's `matched_source_paths` set), `Copy` otherwise.
    pub pairs: Vec<(usize, usize, u8, ChangeType)>,
    pub table_overflowed: bool,
}

/// Runs the similarity rename/copy detector over `sources` (typically
/// DELETE entries) and `destinations` (typically ADD entries).
///
/// `matched_source_paths` is mutated: a source claimed here whose path was
/// not already present is added and the pair reported as RENAME; if it was
/// already present (claimed earlier by an exact rename), the pair is
/// reported as COPY instead (SPEC_FULL.md §4.C step 5).
pub fn find_similar_pairs<S: ObjectStore>(
    store: &S,
    sources: &[DiffEntry],
    destinations: &[DiffEntry],
    options: &BlameOptions,
    matched_source_paths: &mut HashSet<RepoPathBuf>,
    cancellation: &CancellationToken,
) -> Result<SimilarityOutcome, crate::error::BlameError> {
    let mut outcome = SimilarityOutcome::default();
    if sources.is_empty() || destinations.is_empty() {
        return Ok(outcome);
    }
    if sources.len() as u64 * destinations.len() as u64 > (u32::MAX as u64) {
        // Degenerate guard; the caller's rename_limit check (§4.D "Rename
        // limit behavior") is expected to have already skipped this case.
        return Ok(outcome);
    }

    let source_sides = collect_side(store, sources, |e| (e.old_path.clone(), e.old_id.clone(), e.old_kind))?;
    let dest_sides = collect_side(store, destinations, |e| (e.new_path.clone(), e.new_id.clone(), e.new_kind))?;

    let mut skipped_destinations = vec![false; dest_sides.len()];
    let mut encoded: Vec<u64> = Vec::new();

    'sources: for s in &source_sides {
        if cancellation.is_cancelled() {
            return Err(crate::error::BlameError::Cancelled);
        }
        let Some(s) = s else { continue };
        if !dest_sides.iter().enumerate().any(|(d_pos, d)| {
            d.as_ref().is_some_and(|d| !skipped_destinations[d_pos] && size_prefilter_ok(s, d, options))
        }) {
            continue;
        }

        let src_content = store.open(&s.id).map_err(wrap_store_err)?;
        if options.skip_binary_files_for_content_renames && crate::similarity::is_binary(&src_content) {
            // "skip *all* destinations for that source" (§4.C step 2).
            continue 'sources;
        }
        let src_index = match SimilarityIndex::build(&src_content) {
            Ok(idx) => idx,
            Err(_) => {
                tracing::debug!(source = %s.path, size = s.size, "similarity table overflowed building source index");
                outcome.table_overflowed = true;
                continue 'sources;
            }
        };

        for (d_pos, d) in dest_sides.iter().enumerate() {
            let Some(d) = d else { continue };
            if skipped_destinations[d_pos] {
                continue;
            }
            if !size_prefilter_ok(s, d, options) {
                continue;
            }

            let dst_content = store.open(&d.id).map_err(wrap_store_err)?;
            if options.skip_binary_files_for_content_renames && crate::similarity::is_binary(&dst_content) {
                skipped_destinations[d_pos] = true;
                continue;
            }

            let dst_index = match SimilarityIndex::build(&dst_content) {
                Ok(idx) => idx,
                Err(_) => {
                    tracing::debug!(
                        destination = %d.path,
                        size = d.size,
                        "similarity table overflowed building destination index"
                    );
                    outcome.table_overflowed = true;
                    skipped_destinations[d_pos] = true;
                    continue;
                }
            };

            let content_score = src_index.score(&dst_index, 10_000);
            let name_score = u64::from(path_name_score(&s.path, &d.path)) * 100;
            let combined = ((99 * content_score + name_score) / 10_000).min(127) as u8;
            if combined < options.rename_score {
                continue;
            }

            let src_idx = (s.entry_index as u32) & INDEX_MASK;
            let dst_idx = (d.entry_index as u32) & INDEX_MASK;
            let packed = (u64::from(combined) << 56)
                | (u64::from(INDEX_MASK - src_idx) << 28)
                | u64::from(INDEX_MASK - dst_idx);
            encoded.push(packed);
        }
    }

    encoded.sort_unstable_by(|a, b| b.cmp(a));

    let mut claimed_sources = vec![false; source_sides.len()];
    let mut claimed_destinations = vec![false; dest_sides.len()];
    for packed in encoded {
        let score = (packed >> 56) as u8;
        let src_idx = (INDEX_MASK - ((packed >> 28) & u64::from(INDEX_MASK)) as u32) as usize;
        let dst_idx = (INDEX_MASK - (packed & u64::from(INDEX_MASK)) as u32) as usize;
        if claimed_sources[src_idx] || claimed_destinations[dst_idx] {
            continue;
        }
        claimed_sources[src_idx] = true;
        claimed_destinations[dst_idx] = true;
        let old_path = source_sides[src_idx].as_ref().unwrap().path.clone();
        let change_type = if matched_source_paths.insert(old_path) {
            ChangeType::Rename
        } else {
            ChangeType::Copy
        };
        outcome.pairs.push((src_idx, dst_idx, score, change_type));
    }

    Ok(outcome)
}

fn collect_side<S: ObjectStore>(
    store: &S,
    entries: &[DiffEntry],
    extract: impl Fn(&DiffEntry) -> (Option<RepoPathBuf>, ObjectId, Option<crate::store::EntryKind>),
) -> Result<Vec<Option<Side>>, crate::error::BlameError> {
    entries
        .iter()
        .enumerate()
        .map(|(entry_index, entry)| {
            let (path, id, kind) = extract(entry);
            let Some(path) = path else { return Ok(None) };
            let is_regular_file = matches!(kind, Some(crate::store::EntryKind::RegularFile));
            let size = store.size(&id).unwrap_or(0);
            Ok(Some(Side {
                path,
                id,
                is_regular_file,
                size,
                entry_index,
            }))
        })
        .collect()
}

fn size_prefilter_ok(s: &Side, d: &Side, options: &BlameOptions) -> bool {
    if !s.is_regular_file || !d.is_regular_file {
        return false;
    }
    let max = s.size.max(d.size);
    if max == 0 {
        return true;
    }
    if max > options.big_file_threshold {
        return false;
    }
    let min = s.size.min(d.size);
    100 * min / max >= u64::from(options.rename_score)
}

/// Builds the resulting [`DiffEntry`] for one resolved similarity pair
/// (score clamped into `[0, 127]` per SPEC_FULL.md §4.C, widened here into
/// the shared `u8` score field also used for exact renames at 100).
pub fn to_diff_entry(source: &DiffEntry, destination: &DiffEntry, score: u8, change_type: ChangeType) -> DiffEntry {
    DiffEntry {
        change_type,
        old_path: source.old_path.clone(),
        new_path: destination.new_path.clone(),
        old_id: source.old_id.clone(),
        new_id: destination.new_id.clone(),
        old_kind: source.old_kind,
        new_kind: destination.new_kind,
        score,
    }
}

fn wrap_store_err(e: crate::store::StoreError) -> crate::error::BlameError {
    crate::error::BlameError::Backend(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::InMemoryStore;

    fn entry_delete(path: &str, content: &[u8]) -> (DiffEntry, ObjectId) {
        let id = ObjectId::new(content.to_vec());
        (
            DiffEntry::delete(RepoPathBuf::new(path), id.clone(), crate::store::EntryKind::RegularFile),
            id,
        )
    }

    fn entry_add(path: &str, content: &[u8]) -> (DiffEntry, ObjectId) {
        let id = ObjectId::new(content.to_vec());
        (
            DiffEntry::add(RepoPathBuf::new(path), id.clone(), crate::store::EntryKind::RegularFile),
            id,
        )
    }

    #[test]
    fn identical_content_renamed_path_is_a_rename() {
        let mut store = InMemoryStore::new();
        let content = b"l1\nl2\nl3\nl4\nl5\n".to_vec();
        let (del, del_id) = entry_delete("old/name.rs", &content);
        let (add, add_id) = entry_add("new/name.rs", &content);
        store.put_blob(del_id, content.clone());
        store.put_blob(add_id, content);

        let options = BlameOptions::default();
        let mut matched = HashSet::new();
        let outcome = find_similar_pairs(
            &store,
            &[del],
            &[add],
            &options,
            &mut matched,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(outcome.pairs.len(), 1);
        assert!(matched.contains(&RepoPathBuf::new("old/name.rs")));
    }

    #[test]
    fn disjoint_content_below_threshold_is_dropped() {
        let mut store = InMemoryStore::new();
        let (del, del_id) = entry_delete("a.rs", b"l1\nl2\nl3\n");
        let (add, add_id) = entry_add("b.rs", b"x1\nx2\nx3\n");
        store.put_blob(del_id, b"l1\nl2\nl3\n".to_vec());
        store.put_blob(add_id, b"x1\nx2\nx3\n".to_vec());

        let options = BlameOptions::default();
        let mut matched = HashSet::new();
        let outcome = find_similar_pairs(
            &store,
            &[del],
            &[add],
            &options,
            &mut matched,
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(outcome.pairs.is_empty());
    }
}
