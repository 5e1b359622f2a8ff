use std::sync::Arc;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wallet_screening_service::app::{BatchOrchestrator, RiskEngine, ServiceConfig};
use wallet_screening_service::domain::ScreeningStore;
use wallet_screening_service::test_utils::MockScreeningStore;

fn bench_classify(c: &mut Criterion) {
    let engine = RiskEngine::new();

    c.bench_function("classify_clear_address", |b| {
        b.iter(|| {
            black_box(engine.classify(
                black_box("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"),
                black_box("ethereum"),
            ))
        })
    });

    c.bench_function("classify_sanctioned_address", |b| {
        b.iter(|| black_box(engine.classify(black_box("0xABC1234567890def"), black_box("ethereum"))))
    });
}

fn bench_batch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let full: Arc<Vec<String>> = Arc::new((0..100).map(|i| format!("0x{:040x}", i)).collect());
    let oversized: Arc<Vec<String>> = Arc::new((0..101).map(|i| format!("0x{:040x}", i)).collect());

    let orchestrator = || {
        BatchOrchestrator::new(
            Arc::new(MockScreeningStore::new()) as Arc<dyn ScreeningStore>,
            RiskEngine::new(),
            ServiceConfig::default(),
        )
    };

    c.bench_function("screen_batch_100", |b| {
        b.to_async(&runtime).iter_batched(
            orchestrator,
            |orchestrator| {
                let addresses = Arc::clone(&full);
                async move { black_box(orchestrator.screen_batch(&addresses, None).await) }
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("reject_oversized_batch", |b| {
        let orchestrator = orchestrator();
        b.to_async(&runtime).iter(|| async {
            black_box(orchestrator.screen_batch(&oversized, None).await).is_err()
        })
    });
}

criterion_group!(benches, bench_classify, bench_batch);
criterion_main!(benches);
