// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Chat Branches and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chat_branches::query::{
    locate, outline, project, project_active, PathSelector, ProjectionOptions,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

mod fixtures;
mod profiler;

use fixtures::Case;

// Benchmark identity (keep stable):
// - Group name: `query.project`
// - Case ids: `<view>_<case>`, e.g. `active_medium`, `whole_tree_long`.
fn benches_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("query.project");

    for case in [Case::Small, Case::Medium, Case::Long] {
        let tree = fixtures::conversation(case);

        group.throughput(Throughput::Elements(tree.active_path().len() as u64));
        group.bench_function(format!("active_{}", case.id()), |b| {
            b.iter(|| {
                let messages = project_active(black_box(&tree));
                black_box(messages.iter().map(|m| m.content.len()).sum::<usize>())
            })
        });

        group.throughput(Throughput::Elements(tree.node_count() as u64));
        group.bench_function(format!("whole_tree_{}", case.id()), |b| {
            b.iter(|| {
                let count = project(
                    black_box(&tree),
                    PathSelector::WholeTree,
                    ProjectionOptions::default().with_root(),
                )
                .count();
                black_box(count)
            })
        });

        group.bench_function(format!("outline_{}", case.id()), |b| {
            b.iter(|| {
                let rows = outline(black_box(&tree));
                black_box(rows.iter().filter(|row| row.on_active_path).count())
            })
        });

        group.throughput(Throughput::Elements(tree.active_path().len() as u64));
        group.bench_function(format!("locate_active_{}", case.id()), |b| {
            b.iter(|| {
                let mut acc = 0usize;
                for node_id in tree.active_path() {
                    if let Some(position) = locate(black_box(&tree), node_id.as_str()) {
                        let j = position.j.unwrap_or(0);
                        let n = position.n.unwrap_or(0);
                        acc = acc.wrapping_add(j * 31 + n + position.depth);
                    }
                }
                black_box(acc)
            })
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_project
}
criterion_main!(benches);
