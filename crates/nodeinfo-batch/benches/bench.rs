use core::hint::black_box;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nodeinfo_batch::batch::{Deadline, MemoryDiagnostics, PoolConfig, RecordFields, run_batch};
use std::sync::Arc;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

const IDS: usize = 1_000;

async fn echo(_: CancellationToken, id: String) -> Result<usize, String> {
    tokio::task::yield_now().await;
    Ok(id.len())
}

fn pool_bench(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let input: String = (0..IDS).map(|i| format!("host-{i}.example\n")).collect();

    let mut group = c.benchmark_group("batch/run");
    group.throughput(Throughput::Elements(IDS as u64));

    for workers in [1, 8, 64, 256] {
        for queue_capacity in [1, 16] {
            let pool = PoolConfig {
                workers,
                queue_capacity,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("workers/{workers}/cap"), queue_capacity),
                &pool,
                |b, pool| {
                    b.to_async(&rt).iter(|| async {
                        let summary = run_batch(
                            pool,
                            RecordFields::DISCOVERY,
                            &Deadline::never(),
                            input.as_bytes(),
                            tokio::io::sink(),
                            echo,
                            Arc::new(MemoryDiagnostics::default()),
                        )
                        .await
                        .unwrap();
                        assert_eq!(summary.emitted, IDS);
                        black_box(summary);
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, pool_bench);
criterion_main!(benches);
