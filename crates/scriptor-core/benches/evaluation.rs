use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use scriptor_core::engine::{EvaluationConfig, Evaluator};
use scriptor_core::model::{Competence, LetterTarget, MasteryThresholds};
use scriptor_core::pressure::classify_series;
use scriptor_core::reference::generate;
use scriptor_core::trace::{resample, Trace, TracePoint};

fn wobbly_replay(reference: &Trace, samples: usize) -> Trace {
    let path = resample(reference.points(), samples).unwrap();
    let mut trace = Trace::user_with_capacity(samples);
    for (i, (x, y)) in path.into_iter().enumerate() {
        let wobble = (i as f64 * 0.7).sin() * 3.0;
        trace
            .append(TracePoint::new(x + wobble, y - wobble, i as f64 * 16.0, 0.48))
            .unwrap();
    }
    trace.finalize().unwrap();
    trace
}

fn bench_evaluate(c: &mut Criterion) {
    let competence = Competence {
        code: "BENCH".into(),
        name: "bench".into(),
        thresholds: MasteryThresholds::default(),
        prerequisites: Default::default(),
    };
    let target = LetterTarget {
        letter: "m".into(),
        precision_tolerance_px: 30.0,
        speed_target_ms: 3000.0,
        inclination_angle: Some(75.0),
        points: 10,
    };
    let reference = generate("m", 100.0, 180.0, 1.0).unwrap();

    let mut group = c.benchmark_group("evaluate");
    for samples in [60, 240, 1000] {
        let user = wobbly_replay(&reference, samples);
        let evaluator = Evaluator::new(EvaluationConfig::default());
        group.bench_with_input(BenchmarkId::new("m", samples), &user, |b, user| {
            b.iter(|| {
                evaluator
                    .evaluate(black_box(user), &reference, &target, 0, &competence)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_pressure(c: &mut Criterion) {
    let samples: Vec<f64> = (0..1000).map(|i| 0.4 + (i % 20) as f64 * 0.01).collect();
    c.bench_function("classify_series/1000", |b| {
        b.iter(|| classify_series(black_box(&samples)))
    });
}

criterion_group!(benches, bench_evaluate, bench_pressure);
criterion_main!(benches);
