//! Benchmarks for forward-chaining closure and retraction cascades.

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

use maat::kb::{EngineConfig, KnowledgeBase};
use maat::parse::parse_statement;
use maat::term::Statement;

const CHAIN_LEN: usize = 32;

fn stmt(text: &str) -> Statement {
    parse_statement(text).unwrap()
}

fn bench_config() -> EngineConfig {
    EngineConfig {
        max_chain_depth: 512,
        max_derived: 100_000,
    }
}

/// A knowledge base holding a successor chain a0 → a1 → ... plus the base
/// reachability rule, ready for the transitive rule to close over.
fn chain_kb() -> KnowledgeBase {
    let mut kb = KnowledgeBase::new(bench_config());
    for i in 0..CHAIN_LEN - 1 {
        kb.assert_fact(stmt(&format!("(succ a{i} a{})", i + 1)))
            .unwrap();
    }
    kb.assert_rule(vec![stmt("(succ ?x ?y)")], stmt("(reach ?x ?y)"))
        .unwrap();
    kb
}

fn transitive_closure(c: &mut Criterion) {
    c.bench_function("closure_transitive_chain_32", |b| {
        b.iter_batched(
            chain_kb,
            |mut kb| {
                kb.assert_rule(
                    vec![stmt("(reach ?x ?y)"), stmt("(succ ?y ?z)")],
                    stmt("(reach ?x ?z)"),
                )
                .unwrap();
                kb
            },
            BatchSize::SmallInput,
        );
    });
}

fn retraction_cascade(c: &mut Criterion) {
    c.bench_function("retract_cascade_chain_32", |b| {
        b.iter_batched(
            || {
                let mut kb = chain_kb();
                kb.assert_rule(
                    vec![stmt("(reach ?x ?y)"), stmt("(succ ?y ?z)")],
                    stmt("(reach ?x ?z)"),
                )
                .unwrap();
                kb
            },
            |mut kb| {
                // Removing the first link tears down every reach fact that
                // passed through it.
                kb.retract_fact(&stmt("(succ a0 a1)"));
                kb
            },
            BatchSize::SmallInput,
        );
    });
}

fn ask_scan(c: &mut Criterion) {
    let mut kb = chain_kb();
    kb.assert_rule(
        vec![stmt("(reach ?x ?y)"), stmt("(succ ?y ?z)")],
        stmt("(reach ?x ?z)"),
    )
    .unwrap();
    let query = stmt("(reach a0 ?far)");

    c.bench_function("ask_reach_from_root_chain_32", |b| {
        b.iter(|| kb.ask(&query).unwrap());
    });
}

criterion_group!(benches, transitive_closure, retraction_cascade, ask_scan);
criterion_main!(benches);
