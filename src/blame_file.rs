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

//! Component F: the per-file blamer and the take-blame algorithm
//! (SPEC_FULL.md §4.F), the core of the region algebra.
//!
//! The edit-list walk below follows the same lockstep-iteration shape as
//! `src_teacher/diff.rs`'s hunk iteration (`DiffHunkIterator`: walk an
//! edit list against two running indices), generalized here from "produce
//! a presentation diff" to "partition a region list between two owners".

use crate::diff_backend::DiffAlgorithm;
use crate::diff_backend::Edit;
use crate::region::Region;
use crate::region::RegionList;

/// Outcome of blaming one child file against its parent counterpart.
///
/// `child_remaining` is what the child keeps after this one parent's
/// diff — the part of the region set this parent's content does *not*
/// explain. For a node with multiple parents the scheduler feeds this back
/// in as the next parent's input (SPEC_FULL.md §4.G "multiple parents may
/// legitimately be responsible for different regions"): only what survives
/// every parent's pass is finally attributed to the child's own commit.
/// `parent_regions` is handed to the parent-side
/// [`crate::candidate::FileCandidate`] (may be empty, in which case the
/// caller drops the parent candidate entirely per SPEC_FULL.md §4.F step
/// 4).
pub struct BlameOutcome {
    pub child_remaining: RegionList,
    pub parent_regions: RegionList,
}

/// Applies the take-blame algorithm described in SPEC_FULL.md §4.F.
///
/// `edits` must be ordered by `begin_a`/`begin_b` ascending (the contract
/// every [`DiffAlgorithm`] implementation upholds). `child_regions` is the
/// child [`crate::candidate::FileCandidate`]'s region list *before* this
/// call; it is consumed (the caller is expected to have already taken it
/// out of the candidate, since every claimed region either stays on the
/// child or moves to the parent — SPEC_FULL.md §3 invariant 1).
///
/// Returns `(child_regions_after, parent_regions)`: the list of regions
/// the child keeps (step 5, unaffected runs fully inside an edit), and the
/// list handed to the parent (everything reassigned to the A/parent side).
pub fn take_blame(edits: &[Edit], child_regions: RegionList) -> (RegionList, RegionList) {
    let mut remaining: std::collections::VecDeque<Region> = child_regions.into_iter().collect();
    let mut to_child = RegionList::new();
    let mut to_parent = RegionList::new();

    let mut edit_iter = edits.iter().peekable();
    let mut last_edit: Option<&Edit> = None;

    'regions: while let Some(mut r) = remaining.pop_front() {
        loop {
            let Some(&edit) = edit_iter.peek() else {
                // No more edits: whatever remains goes to the parent,
                // shifted by the last edit's end-of-range delta.
                assign_remaining_to_parent(&mut to_parent, r, last_edit);
                continue 'regions;
            };

            if edit.end_b <= r.source_start {
                // This edit ends before the region starts on the B side:
                // it cannot affect this (or any later, since regions are
                // sorted) region's head; move on to the next edit.
                last_edit = Some(edit_iter.next().unwrap());
                continue;
            }

            if r.source_start < edit.begin_b {
                // Part of `r` lies before the edit on the B side: unchanged,
                // reassign that prefix to A (the parent).
                let d = edit.begin_b - r.source_start;
                if r.length <= d {
                    let shifted = Region::new(r.result_start, parent_source_start(r.source_start, last_edit, edit), r.length);
                    append_to(&mut to_parent, shifted);
                    continue 'regions;
                }
                let head = r.split_first(parent_source_start(r.source_start, last_edit, edit), d);
                append_to(&mut to_parent, head);
                r.slide_and_shrink(d);
            }

            if edit.length_b() == 0 {
                // Pure deletion on the B side (nothing inserted): it
                // cannot claim any of `r`, which now starts at or after
                // `edit.begin_b == edit.end_b`.
                last_edit = Some(edit_iter.next().unwrap());
                continue;
            }

            // Now r.source_start is within [edit.begin_b, edit.end_b).
            if r.source_end() <= edit.end_b {
                // `r` ends within the edit (or exactly at its boundary):
                // the child keeps it entirely.
                if r.source_end() == edit.end_b {
                    last_edit = Some(edit_iter.next().unwrap());
                }
                append_to(&mut to_child, r);
                continue 'regions;
            }

            // `r` extends beyond the edit: split off the part inside the
            // edit to the child, keep iterating with the remainder.
            let inside_len = edit.end_b - r.source_start;
            let head = r.split_first(r.source_start, inside_len);
            append_to(&mut to_child, head);
            r.slide_and_shrink(inside_len);
            last_edit = Some(edit_iter.next().unwrap());
        }
    }

    (to_child, to_parent)
}

/// `sourceStart` of a region reassigned to A (the parent) mid-walk: offset
/// by the same `beginA - beginB` delta as the edit that currently bounds
/// it (SPEC_FULL.md §4.F step 3: `sourceStart = e.beginA − d`, generalized
/// to "wherever along the B axis we are reassigning from").
fn parent_source_start(source_start_b: u32, _last_edit: Option<&Edit>, edit: &Edit) -> u32 {
    let delta = i64::from(edit.begin_a) - i64::from(edit.begin_b);
    (i64::from(source_start_b) + delta) as u32
}

/// After all edits are exhausted, any remaining region is reassigned to A
/// with `sourceStart` shifted by `endB_last - endA_last` (SPEC_FULL.md
/// §4.F, final step).
fn assign_remaining_to_parent(to_parent: &mut RegionList, r: Region, last_edit: Option<&Edit>) {
    let delta = match last_edit {
        Some(e) => i64::from(e.end_a) - i64::from(e.end_b),
        None => 0,
    };
    let shifted_start = (i64::from(r.source_start) + delta) as u32;
    append_to(to_parent, Region::new(r.result_start, shifted_start, r.length));
}

fn append_to(list: &mut RegionList, region: Region) {
    list.append(region);
}

/// Runs the full per-file blame step (SPEC_FULL.md §4.F): handles the
/// "identical blob" short-circuit, invokes `diff`, and falls back to the
/// identical-blob case if the diff nonetheless reports no edits (this
/// happens under whitespace-ignoring comparators over textually different
/// but semantically equal content).
pub fn blame_one_file(
    diff: &dyn DiffAlgorithm,
    cmp: crate::config::LineComparator,
    parent_blob_id: &crate::store::ObjectId,
    child_blob_id: &crate::store::ObjectId,
    parent_content: impl FnOnce() -> Result<Vec<u8>, crate::error::BlameError>,
    child_content: impl FnOnce() -> Result<Vec<u8>, crate::error::BlameError>,
    child_regions: RegionList,
) -> Result<BlameOutcome, crate::error::BlameError> {
    if parent_blob_id == child_blob_id {
        return Ok(BlameOutcome { child_remaining: RegionList::new(), parent_regions: child_regions });
    }

    let parent_bytes = parent_content()?;
    let child_bytes = child_content()?;
    let edits = diff.diff(cmp, &parent_bytes, &child_bytes);
    if edits.is_empty() {
        // No edits despite differing blob ids: whitespace-ignoring
        // comparator saw no difference (SPEC_FULL.md §4.F step 5).
        return Ok(BlameOutcome { child_remaining: RegionList::new(), parent_regions: child_regions });
    }

    let (child_remaining, parent_regions) = take_blame(&edits, child_regions);
    Ok(BlameOutcome { child_remaining, parent_regions })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(pairs: &[(u32, u32, u32)]) -> RegionList {
        let mut list = RegionList::new();
        for &(result_start, source_start, length) in pairs {
            list.append(Region::new(result_start, source_start, length));
        }
        list
    }

    fn region_vec(list: &RegionList) -> Vec<(u32, u32, u32)> {
        list.iter().map(|r| (r.result_start, r.source_start, r.length)).collect()
    }

    #[test]
    fn no_edits_moves_everything_to_parent() {
        let child = regions(&[(0, 0, 5)]);
        let (to_child, to_parent) = take_blame(&[], child);
        assert!(to_child.is_empty());
        assert_eq!(region_vec(&to_parent), vec![(0, 0, 5)]);
    }

    #[test]
    fn single_line_edit_at_last_line_moves_one_line_to_child() {
        // 3-line file, last line changed: edit covers b-index [2, 3).
        let edit = Edit { begin_a: 2, end_a: 3, begin_b: 2, end_b: 3 };
        let child = regions(&[(0, 0, 3)]);
        let (to_child, to_parent) = take_blame(&[edit], child);
        assert_eq!(region_vec(&to_child), vec![(2, 2, 1)]);
        assert_eq!(region_vec(&to_parent), vec![(0, 0, 2)]);
    }

    #[test]
    fn pure_insertion_keeps_surrounding_lines_with_parent() {
        // a="x\ny\n" (2 lines), b="x\nNEW\ny\n" (3 lines): insertion at b=1.
        let edit = Edit { begin_a: 1, end_a: 1, begin_b: 1, end_b: 2 };
        let child = regions(&[(0, 0, 3)]);
        let (to_child, to_parent) = take_blame(&[edit], child);
        assert_eq!(region_vec(&to_child), vec![(1, 1, 1)]);
        // line 0 (before the edit) and line 2 (after) both go to parent,
        // shifted into a-coordinates; they are not adjacent in b-space so
        // they don't coalesce into one region's source span, but they are
        // contiguous across the removed edit — line 2 maps to a-index 1.
        assert_eq!(region_vec(&to_parent), vec![(0, 0, 1), (2, 1, 1)]);
    }

    #[test]
    fn pure_deletion_on_parent_side_has_no_child_claim_at_the_gap() {
        // a="x\nDEL\ny\n" (3 lines), b="x\ny\n" (2 lines): deletion at a=1.
        let edit = Edit { begin_a: 1, end_a: 2, begin_b: 1, end_b: 1 };
        let child = regions(&[(0, 0, 2)]);
        let (to_child, to_parent) = take_blame(&[edit], child);
        assert!(to_child.is_empty());
        assert_eq!(region_vec(&to_parent), vec![(0, 0, 1), (1, 2, 1)]);
    }

    #[test]
    fn region_spanning_edit_boundary_splits_correctly() {
        // Replace b[1..3) with something; region [0, 5) spans before,
        // inside, and after the edit.
        let edit = Edit { begin_a: 1, end_a: 2, begin_b: 1, end_b: 3 };
        let child = regions(&[(0, 0, 5)]);
        let (to_child, to_parent) = take_blame(&[edit], child);
        assert_eq!(region_vec(&to_child), vec![(1, 1, 2)]);
        assert_eq!(region_vec(&to_parent), vec![(0, 0, 1), (3, 2, 2)]);
    }
}
