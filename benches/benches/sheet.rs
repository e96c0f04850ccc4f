// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_sheet` insertion and extraction.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_sheet::StyleSheet;

fn populated(groups: usize, per_group: usize) -> StyleSheet {
    let mut sheet = StyleSheet::new();
    for round in 0..per_group {
        for group in 0..groups {
            let name = format!("n{group}x{round}");
            sheet.insert_rules(&format!("C-{group}"), &name, [format!(".{name}{{top:0;}}")]);
        }
    }
    sheet
}

fn bench_sheet(c: &mut Criterion) {
    let mut group = c.benchmark_group("sheet");

    for groups in [8_usize, 64] {
        group.bench_function(BenchmarkId::new("interleaved_insert", groups), |b| {
            b.iter_batched(
                StyleSheet::new,
                |mut sheet| {
                    for round in 0..8 {
                        for g in 0..groups {
                            sheet.insert_rules(&format!("C-{g}"), &format!("n{round}"), [".x{}"]);
                        }
                    }
                    sheet
                },
                BatchSize::SmallInput,
            );
        });
    }

    let sheet = populated(64, 8);
    group.bench_function("materialize", |b| {
        b.iter(|| black_box(sheet.materialize()));
    });

    let marked = sheet.marked_output();
    group.bench_function("rehydrate", |b| {
        b.iter_batched(
            StyleSheet::new,
            |mut client| {
                black_box(client.rehydrate(&marked));
                client
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("remove_reinsert", |b| {
        b.iter_batched(
            || populated(64, 8),
            |mut sheet| {
                sheet.remove_group("C-10");
                sheet.reinsert_group("C-10");
                sheet
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_sheet);
criterion_main!(benches);
