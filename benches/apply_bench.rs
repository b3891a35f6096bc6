use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mdp_domain::plan::{Plan, Reason, ReplacementItem};
use mdp_domain::report::StageStats;
use mdp_engine::applier::{apply, ApplyNode};

fn plan_with_items(n: usize) -> Plan {
    let mut plan = Plan::new();
    for i in 0..n {
        plan.push_dedup(ReplacementItem {
            find: format!("pattern{i}"),
            replace: format!("spoken{i}"),
            reason: Reason::SimplePunct,
        });
    }
    plan
}

fn sample_text(repeats: usize) -> String {
    "This line has pattern0 and pattern5 and pattern10 repeated.\n\
     Pattern0 Pattern5 Pattern10 should not match due to case.\n\
     The quick brown fox jumps over the lazy dog. pattern1 pattern2 pattern3.\n"
        .repeat(repeats)
}

fn bench_apply_small_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_small_plan");

    let plan_10 = plan_with_items(10);
    let plan_50 = plan_with_items(50);
    let text = sample_text(4);

    group.bench_with_input(BenchmarkId::new("10_items", "sample"), &plan_10, |b, plan| {
        let nodes = vec![ApplyNode { node_index: 0, text: text.clone() }];
        b.iter(|| {
            let mut stats = StageStats::default();
            black_box(apply(&nodes, plan, &mut stats));
        });
    });

    group.bench_with_input(BenchmarkId::new("50_items", "sample"), &plan_50, |b, plan| {
        let nodes = vec![ApplyNode { node_index: 0, text: text.clone() }];
        b.iter(|| {
            let mut stats = StageStats::default();
            black_box(apply(&nodes, plan, &mut stats));
        });
    });

    group.finish();
}

fn bench_apply_many_nodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_many_nodes");

    let plan = plan_with_items(20);
    let nodes: Vec<ApplyNode> = (0..50)
        .map(|i| ApplyNode { node_index: i, text: sample_text(1) })
        .collect();

    group.bench_function("50_nodes", |b| {
        b.iter(|| {
            let mut stats = StageStats::default();
            black_box(apply(&nodes, &plan, &mut stats));
        });
    });

    group.finish();
}

fn bench_apply_large_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_large_document");

    let plan = plan_with_items(30);
    let text = sample_text(200);

    group.bench_function("large_single_node", |b| {
        let nodes = vec![ApplyNode { node_index: 0, text: text.clone() }];
        b.iter(|| {
            let mut stats = StageStats::default();
            black_box(apply(&nodes, &plan, &mut stats));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_apply_small_plan, bench_apply_many_nodes, bench_apply_large_document);
criterion_main!(benches);
