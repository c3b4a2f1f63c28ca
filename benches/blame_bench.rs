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

//! Benchmarks the scheduler's dominant cost: walking a long linear history
//! of small, single-line edits to one file.

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;

use multiblame::repo_path::RepoPathBuf;
use multiblame::store::ObjectId;
use multiblame::testutils::InMemoryStore;
use multiblame::BlameOptions;

fn linear_history(depth: usize) -> (InMemoryStore, ObjectId) {
    let mut store = InMemoryStore::new();
    let path = RepoPathBuf::new("file.txt");

    let mut lines: Vec<String> = (0..depth).map(|i| format!("line{i}\n")).collect();
    let mut parent: Option<ObjectId> = None;
    let mut head = ObjectId::null();

    for i in 0..depth {
        lines[i] = format!("edit{i}\n");
        let content: Vec<u8> = lines.concat().into_bytes();
        let blob = ObjectId::new(content.clone());
        store.put_blob(blob.clone(), content);
        let commit_id = ObjectId::new(format!("c{i}").into_bytes());
        store.put_commit(
            commit_id.clone(),
            i as i64,
            parent.clone().into_iter().collect(),
            "a@x.com",
            vec![(path.clone(), blob)],
        );
        parent = Some(commit_id.clone());
        head = commit_id;
    }

    (store, head)
}

fn bench_linear_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_history");
    for depth in [50usize, 200] {
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter_batched(
                || linear_history(depth),
                |(store, head)| {
                    let options = BlameOptions {
                        start_commit: Some(head),
                        ..Default::default()
                    };
                    multiblame::blame(options, store).unwrap()
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_linear_history);
criterion_main!(benches);
