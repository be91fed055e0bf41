use common::{OrderId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{InMemoryInventoryLedger, InventoryLedger};

fn bench_reserve_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryInventoryLedger::new();
    rt.block_on(async {
        ledger
            .register_product(ProductId::new("SKU-BENCH"), u32::MAX)
            .await
            .unwrap();
    });
    let product = ProductId::new("SKU-BENCH");

    c.bench_function("inventory/reserve_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = ledger.reserve(&product, 1, OrderId::new()).await.unwrap();
                ledger.release(id).await.unwrap();
            });
        });
    });
}

fn bench_reserve_commit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryInventoryLedger::new();
    rt.block_on(async {
        ledger
            .register_product(ProductId::new("SKU-BENCH"), u32::MAX)
            .await
            .unwrap();
    });
    let product = ProductId::new("SKU-BENCH");

    c.bench_function("inventory/reserve_commit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = ledger.reserve(&product, 1, OrderId::new()).await.unwrap();
                ledger.commit(id).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_reserve_release, bench_reserve_commit);
criterion_main!(benches);
