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

//! End-to-end scenarios run against [`InMemoryStore`], one per concrete
//! worked example in SPEC_FULL.md §8.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use multiblame::repo_path::RepoPathBuf;
use multiblame::store::ObjectId;
use multiblame::testutils::InMemoryStore;
use multiblame::BlameOptions;

fn id(bytes: &[u8]) -> ObjectId {
    ObjectId::new(bytes.to_vec())
}

fn path(p: &str) -> RepoPathBuf {
    RepoPathBuf::new(p)
}

fn hashes_of(result: &multiblame::BlameResult, file: &RepoPathBuf) -> Vec<Option<ObjectId>> {
    result.get(file).unwrap().commit_hashes().map(|h| h.cloned()).collect()
}

#[test]
fn scenario_1_initial_commit() {
    let mut store = InMemoryStore::new();
    let blob = id(b"line1\n");
    store.put_blob(blob.clone(), b"line1\n".to_vec());
    let file_a = path("fileA");
    store.put_commit(id(b"c1"), 10, vec![], "a@x.com", vec![(file_a.clone(), blob)]);

    let options = BlameOptions {
        start_commit: Some(id(b"c1")),
        ..Default::default()
    };
    let (result, summary) = multiblame::blame(options, store).unwrap();

    assert_eq!(hashes_of(&result, &file_a), vec![Some(id(b"c1"))]);
    assert_eq!(summary.nodes_visited, 1);
}

#[test]
fn scenario_2_rename_and_copy_both_attribute_to_the_original_commit() {
    let mut store = InMemoryStore::new();
    let content: Vec<u8> = (1..=7).map(|n| format!("l{n}\n")).collect::<String>().into_bytes();
    let blob = id(&content);
    store.put_blob(blob.clone(), content);

    let file_a = path("fileA");
    let file_b = path("fileB");
    let file_c = path("fileC");
    store.put_commit(id(b"c1"), 10, vec![], "a@x.com", vec![(file_a, blob.clone())]);
    store.put_commit(
        id(b"c2"),
        20,
        vec![id(b"c1")],
        "a@x.com",
        vec![(file_b.clone(), blob.clone()), (file_c.clone(), blob)],
    );

    let options = BlameOptions {
        start_commit: Some(id(b"c2")),
        ..Default::default()
    };
    let (result, _summary) = multiblame::blame(options, store).unwrap();

    for file in [&file_b, &file_c] {
        let hashes = hashes_of(&result, file);
        assert_eq!(hashes.len(), 7);
        assert!(hashes.iter().all(|h| h.as_ref() == Some(&id(b"c1"))));
    }
}

#[test]
fn scenario_3_merge_prefers_same_name_parent_over_same_content_parent() {
    let mut store = InMemoryStore::new();
    let blob = id(b"l1\nl2\n");
    store.put_blob(blob.clone(), b"l1\nl2\n".to_vec());
    let file_a = path("fileA");

    store.put_commit(id(b"c1"), 0, vec![], "a@x.com", vec![]);
    store.put_commit(id(b"c2"), 10, vec![id(b"c1")], "a@x.com", vec![(file_a.clone(), blob.clone())]);
    store.put_commit(id(b"c3"), 20, vec![id(b"c1")], "a@x.com", vec![(path("fileB"), blob.clone())]);
    // Merge of c2 into c3's line, keeping only fileA at the same content/name as c2.
    store.put_commit(id(b"merge"), 30, vec![id(b"c3"), id(b"c2")], "a@x.com", vec![(file_a.clone(), blob)]);

    let options = BlameOptions {
        start_commit: Some(id(b"merge")),
        ..Default::default()
    };
    let (result, _summary) = multiblame::blame(options, store).unwrap();

    assert_eq!(hashes_of(&result, &file_a), vec![Some(id(b"c2")), Some(id(b"c2"))]);
}

#[test]
fn scenario_5_parent_with_exact_content_short_circuits() {
    let mut store = InMemoryStore::new();
    let file_a = path("fileA");
    let c2_blob = id(b"l1\nl3\n");
    let c3_blob = id(b"l1\nl2\n");
    store.put_blob(c2_blob.clone(), b"l1\nl3\n".to_vec());
    store.put_blob(c3_blob.clone(), b"l1\nl2\n".to_vec());

    store.put_commit(id(b"c1"), 0, vec![], "a@x.com", vec![]);
    store.put_commit(id(b"c2"), 10, vec![id(b"c1")], "a@x.com", vec![(file_a.clone(), c2_blob.clone())]);
    store.put_commit(id(b"c3"), 20, vec![id(b"c1")], "a@x.com", vec![(file_a.clone(), c3_blob.clone())]);
    // Merge of c3 into c2's line, keeping c3's content verbatim.
    store.put_commit(id(b"merge"), 30, vec![id(b"c2"), id(b"c3")], "a@x.com", vec![(file_a.clone(), c3_blob)]);

    let options = BlameOptions {
        start_commit: Some(id(b"merge")),
        ..Default::default()
    };
    let (result, _summary) = multiblame::blame(options, store).unwrap();

    assert_eq!(hashes_of(&result, &file_a), vec![Some(id(b"c3")), Some(id(b"c3"))]);
}

#[test]
fn scenario_6_queue_order_visits_far_fewer_nodes_than_the_chain_length() {
    let mut store = InMemoryStore::new();
    let file_a = path("fileA");
    let base_blob = id(b"r1\nr2\n");
    store.put_blob(base_blob.clone(), b"r1\nr2\n".to_vec());
    store.put_commit(id(b"c1"), 0, vec![], "a@x.com", vec![(file_a.clone(), base_blob.clone())]);

    let mut previous = id(b"c1");
    for i in 0..100u32 {
        let commit_id = id(format!("unrelated-{i}").as_bytes());
        let unrelated_blob = id(format!("content-{i}").as_bytes());
        store.put_blob(unrelated_blob.clone(), format!("content-{i}").into_bytes());
        store.put_commit(
            commit_id.clone(),
            10 + i as i64,
            vec![previous.clone()],
            "a@x.com",
            vec![(file_a.clone(), base_blob.clone()), (path("other"), unrelated_blob)],
        );
        previous = commit_id;
    }

    let fork_base = previous.clone();
    let fork = id(b"fork");
    store.put_commit(fork.clone(), 200, vec![fork_base.clone()], "a@x.com", vec![(file_a.clone(), base_blob.clone())]);
    let merge = id(b"merge");
    store.put_commit(merge.clone(), 210, vec![fork_base, fork], "a@x.com", vec![(file_a.clone(), base_blob)]);

    let visited = Arc::new(AtomicU64::new(0));
    let visited_for_callback = visited.clone();
    let options = BlameOptions {
        start_commit: Some(merge),
        progress: Some(Arc::new(move |_n, _hash| {
            visited_for_callback.fetch_add(1, Ordering::Relaxed);
        })),
        ..Default::default()
    };
    let (result, summary) = multiblame::blame(options, store).unwrap();

    assert_eq!(hashes_of(&result, &file_a), vec![Some(id(b"c1")), Some(id(b"c1"))]);
    assert!(summary.nodes_visited < 105, "visited {} nodes", summary.nodes_visited);
    assert_eq!(visited.load(Ordering::Relaxed), summary.nodes_visited);
}
