// Criterion benchmarks for PawMatch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use paw_match::core::{ActionSubmission, DiscoverLimits, MatchEngine};
use paw_match::models::{ActionKind, Caller, Location, PairKey, Profile};
use paw_match::services::{MemoryStore, ProfileStore};
use std::sync::Arc;
use uuid::Uuid;

fn create_dog(owner: &Caller, id: usize) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        owner_id: owner.user_id,
        name: format!("Dog {}", id),
        age: Some((id % 15) as i16),
        breed: Some("mixed".to_string()),
        gender: Some(if id % 2 == 0 { "female" } else { "male" }.to_string()),
        energy: Some("medium".to_string()),
        temperament: vec!["friendly".to_string()],
        vaccinated: Some(true),
        images: vec![],
        caption: None,
        location: Location::default(),
        created_at: chrono::Utc::now(),
    }
}

fn bench_pair_key(c: &mut Criterion) {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    c.bench_function("pair_key", |bench| {
        bench.iter(|| PairKey::new(black_box(a), black_box(b)));
    });
}

fn bench_parse_submission(c: &mut Criterion) {
    let from = Uuid::new_v4().to_string();
    let to = Uuid::new_v4().to_string();

    c.bench_function("parse_submission", |b| {
        b.iter(|| ActionSubmission::parse(black_box(&from), black_box(&to), black_box("like")));
    });
}

fn bench_reciprocal_likes(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let mut group = c.benchmark_group("reciprocal_likes");

    for dog_count in [10usize, 100, 500].iter() {
        let (engine, pairs) = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let mut pairs = Vec::new();
            for i in 0..*dog_count / 2 {
                let alice = Caller::new(Uuid::new_v4());
                let bob = Caller::new(Uuid::new_v4());
                let a = create_dog(&alice, i * 2);
                let b = create_dog(&bob, i * 2 + 1);
                store.insert_profile(&a).await.unwrap();
                store.insert_profile(&b).await.unwrap();
                pairs.push((alice, a.id, bob, b.id));
            }
            let engine = MatchEngine::new(store.clone(), store, DiscoverLimits::default());
            (engine, pairs)
        });

        group.bench_with_input(
            BenchmarkId::new("submit_actions", dog_count),
            dog_count,
            |b, _| {
                b.iter(|| {
                    rt.block_on(async {
                        for (alice, a, bob, other) in &pairs {
                            let _ = engine
                                .submit_action(alice, ActionSubmission::new(*a, *other, ActionKind::Like))
                                .await;
                            let _ = engine
                                .submit_action(bob, ActionSubmission::new(*other, *a, ActionKind::Like))
                                .await;
                        }
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pair_key, bench_parse_submission, bench_reciprocal_likes);

criterion_main!(benches);
