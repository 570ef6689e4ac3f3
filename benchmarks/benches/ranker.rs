use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use narrascope_kernel::{Iri, PathKey, Priority};
use narrascope_search::{Ranker, ScoringRule};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_occurrences(n: usize) -> BTreeMap<PathKey, u64> {
    (0..n)
        .map(|i| {
            let key = PathKey::Predicate {
                priority: if i % 7 == 0 { Priority::Target } else { Priority::Other },
                predicate: Iri::new(format!("http://dbpedia.org/ontology/p{i}")),
            };
            (key, u64::try_from(i % 13 + 1).unwrap_or(1))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ranking the occurrence map
// ---------------------------------------------------------------------------

fn bench_rank_with_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_with_score");
    for &size in &[10usize, 100, 1_000] {
        for rule in [ScoringRule::PredFreq, ScoringRule::EntropyPredFreq, ScoringRule::InversePredFreq] {
            let label = format!("{size}/{rule:?}");
            group.bench_with_input(BenchmarkId::from_parameter(label), &size, |b, &n| {
                let ranker = Ranker::new(rule);
                b.iter_batched(
                    || make_occurrences(n),
                    |occurrences| black_box(ranker.rank_with_score(&occurrences)),
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_rank_with_score);
criterion_main!(benches);
