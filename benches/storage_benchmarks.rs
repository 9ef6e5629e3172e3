//! Performance benchmarks for lock-protected state

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ocdc::cleanup::{CleanupQueue, CleanupRequest};
use ocdc::config::PortRange;
use ocdc::ports::{MockPortProbe, PortAllocator, WorkspaceMeta};
use ocdc::storage::{LockPolicy, LockedStore};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn allocator(temp_dir: &TempDir) -> PortAllocator {
    PortAllocator::with_probe(
        temp_dir.path().join("ports.json"),
        PortRange::new(20000, 29999),
        LockPolicy::default(),
        Arc::new(MockPortProbe::free()),
    )
}

fn bench_locked_update(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("locked_update");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("increment", size), size, |b, &size| {
            b.to_async(&rt).iter_batched(
                || {
                    let temp_dir = TempDir::new().unwrap();
                    let path = temp_dir.path().join("counters.json");
                    let seed: BTreeMap<String, u64> =
                        (0..size).map(|i| (format!("key-{i}"), i as u64)).collect();
                    std::fs::write(&path, serde_json::to_string_pretty(&seed).unwrap()).unwrap();
                    let store: LockedStore<BTreeMap<String, u64>> =
                        LockedStore::new(path, LockPolicy::default());
                    (store, temp_dir)
                },
                |(store, _temp_dir)| async move {
                    store
                        .update(|map| {
                            *map.entry("key-0".to_string()).or_default() += 1;
                            Ok(())
                        })
                        .await
                        .unwrap();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_port_allocation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("port_allocation");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(5));

    for existing in [0, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("allocate_new", existing),
            existing,
            |b, &existing| {
                b.to_async(&rt).iter_batched(
                    || {
                        let temp_dir = TempDir::new().unwrap();
                        let ports = allocator(&temp_dir);
                        seed_port_map(&ports, &temp_dir, existing);
                        (ports, temp_dir)
                    },
                    |(ports, temp_dir)| async move {
                        let assignment = ports
                            .allocate(
                                &temp_dir.path().join("fresh"),
                                WorkspaceMeta::new("bench", "main"),
                            )
                            .await
                            .unwrap();
                        black_box(assignment);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Pre-populate the port map by writing it directly
fn seed_port_map(ports: &PortAllocator, temp_dir: &TempDir, count: usize) {
    let started = chrono::Utc::now();
    let map: BTreeMap<String, serde_json::Value> = (0..count)
        .map(|i| {
            (
                temp_dir
                    .path()
                    .join(format!("ws-{i}"))
                    .to_string_lossy()
                    .into_owned(),
                serde_json::json!({
                    "port": ports.range().range_start as usize + i,
                    "repo": "bench",
                    "branch": format!("branch-{i}"),
                    "started": started,
                }),
            )
        })
        .collect();
    std::fs::write(
        temp_dir.path().join("ports.json"),
        serde_json::to_string_pretty(&map).unwrap(),
    )
    .unwrap();
}

fn bench_queue_add(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    c.bench_function("cleanup_queue_add", |b| {
        b.to_async(&rt).iter_batched(
            || {
                let temp_dir = TempDir::new().unwrap();
                let queue = CleanupQueue::at(
                    temp_dir.path().join("cleanup-queue.json"),
                    LockPolicy::default(),
                );
                (queue, temp_dir)
            },
            |(queue, _temp_dir)| async move {
                let request = CleanupRequest {
                    key: "bench-pr-1".to_string(),
                    poll_id: "bench".to_string(),
                    reason: "merged".to_string(),
                    tmux_session: "bench-pr-1".to_string(),
                    clone_path: PathBuf::from("/clones/bench/pr-1"),
                    source_url: "https://github.com/acme/bench/pull/1".to_string(),
                    source_type: "github_pr".to_string(),
                };
                black_box(queue.add(request, "5m").await.unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_locked_update,
    bench_port_allocation,
    bench_queue_add
);
criterion_main!(benches);
