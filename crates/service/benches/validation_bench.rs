use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use models::schema::ResourceSchema;
use serde_json::json;
use service::storage::file_store::FileRecordStore;
use service::ResourceService;

fn claims_schema() -> ResourceSchema {
    let cfg = configs::default_resources().unwrap().into_iter().find(|r| r.name == "claims").unwrap();
    ResourceSchema::from_config(&cfg).unwrap()
}

fn bench_validation(c: &mut Criterion) {
    let schema = claims_schema();
    let input = json!({"vin": "VF3ABCDEF12345678", "customer_id": "42", "description": "battery", "claim_amount": "120.5"})
        .as_object()
        .cloned()
        .unwrap();

    c.bench_function("claims_validate_create", |b| {
        b.iter(|| schema.validate_create(&input).unwrap());
    });
}

fn bench_memory_create(c: &mut Criterion) {
    let store = Arc::new(FileRecordStore::in_memory(&["claims".to_string()]));
    let svc = ResourceService::new(claims_schema(), store);
    let input = json!({"vin": "VF3ABCDEF12345678", "customer_id": 42}).as_object().cloned().unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("claims_create_in_memory", |b| {
        b.to_async(&rt).iter(|| async { svc.create(&input).await.unwrap() });
    });
}

criterion_group!(benches, bench_validation, bench_memory_create);
criterion_main!(benches);
