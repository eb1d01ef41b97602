//! Benchmarks for batch execution and pipeline chaining.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use taskflow::cancellation::CancellationToken;
use taskflow::executor::{execute, task_fn, ExecutorConfig, SharedTask};
use taskflow::pipeline::{chain, map, PipelineConfig, Stage};
use taskflow::testing::stream_of;
use tokio::runtime::Runtime;

fn noop_tasks(count: usize) -> Vec<SharedTask> {
    (0..count)
        .map(|i| task_fn(format!("noop-{i}"), || async { Ok(()) }))
        .collect()
}

fn executor_benchmark(c: &mut Criterion) {
    let Ok(rt) = Runtime::new() else {
        return;
    };
    let tasks = noop_tasks(1_000);

    for parallelism in [1, 8] {
        c.bench_function(&format!("execute_1000_noop_p{parallelism}"), |b| {
            b.iter(|| {
                let config = ExecutorConfig::new(parallelism, 0);
                black_box(rt.block_on(execute(tasks.clone(), config)))
            });
        });
    }
}

fn chain_benchmark(c: &mut Criterion) {
    let Ok(rt) = Runtime::new() else {
        return;
    };
    let stages: Vec<Arc<dyn Stage<u64>>> = (0..4)
        .map(|_| Arc::new(map(|v: u64| v.wrapping_add(1))) as Arc<dyn Stage<u64>>)
        .collect();

    for capacity in [1, 64] {
        let config = PipelineConfig::new().with_relay_capacity(capacity);
        c.bench_function(&format!("chain_4_stages_1000_values_cap{capacity}"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    use futures::StreamExt;

                    let cancel = Arc::new(CancellationToken::new());
                    let out = chain(stream_of(0..1_000_u64), cancel, &stages, &config);
                    black_box(out.count().await)
                })
            });
        });
    }
}

criterion_group!(benches, executor_benchmark, chain_benchmark);
criterion_main!(benches);
