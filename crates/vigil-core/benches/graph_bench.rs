//! Graph evaluation Criterion benchmarks.
//!
//! Measures single-pass latency over a linear detector chain, fan-out
//! dispatch, and sustained throughput of the input queue drain loop.
//!
//! Run with: cargo bench --bench graph_bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vigil_core::{
    Detector, DetectorError, Graph, Outputs, Publication, Subscriber, TopicState,
};

// ---------------------------------------------------------------------------
// Helper types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Reading(i64);
impl TopicState for Reading {}

#[derive(Clone, Debug)]
struct Stage1(i64);
impl TopicState for Stage1 {}

#[derive(Clone, Debug)]
struct Stage2(i64);
impl TopicState for Stage2 {}

#[derive(Clone, Debug)]
struct Stage3(i64);
impl TopicState for Stage3 {}

/// Forwards its input into the next stage with minimal work.
struct Forward<I: TopicState, O: TopicState> {
    output: Publication<O>,
    map: fn(&I) -> O,
}

impl<I: TopicState, O: TopicState> Detector for Forward<I, O> {}

impl<I: TopicState, O: TopicState> Subscriber<I> for Forward<I, O> {
    fn evaluate(&mut self, value: &I, out: &mut Outputs) -> Result<(), DetectorError> {
        out.publish(&self.output, (self.map)(value));
        Ok(())
    }
}

fn linear_chain_graph() -> Graph {
    let mut graph = Graph::new();
    graph
        .add_detector(|ctx| {
            ctx.subscribe::<Reading>()?;
            Ok(Forward {
                output: ctx.publish_to::<Stage1>()?,
                map: |r: &Reading| Stage1(r.0 + 1),
            })
        })
        .expect("wire stage 1");
    graph
        .add_detector(|ctx| {
            ctx.subscribe::<Stage1>()?;
            Ok(Forward {
                output: ctx.publish_to::<Stage2>()?,
                map: |s: &Stage1| Stage2(s.0 + 1),
            })
        })
        .expect("wire stage 2");
    graph
        .add_detector(|ctx| {
            ctx.subscribe::<Stage2>()?;
            Ok(Forward {
                output: ctx.publish_to::<Stage3>()?,
                map: |s: &Stage2| Stage3(s.0 + 1),
            })
        })
        .expect("wire stage 3");
    graph
}

fn fan_out_graph() -> Graph {
    let mut graph = Graph::new();
    graph
        .add_detector(|ctx| {
            ctx.subscribe::<Reading>()?;
            Ok(Forward {
                output: ctx.publish_to::<Stage1>()?,
                map: |r: &Reading| Stage1(-r.0),
            })
        })
        .expect("wire negate branch");
    graph
        .add_detector(|ctx| {
            ctx.subscribe::<Reading>()?;
            Ok(Forward {
                output: ctx.publish_to::<Stage2>()?,
                map: |r: &Reading| Stage2(r.0 * r.0),
            })
        })
        .expect("wire square branch");
    graph
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_single_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_pass");

    group.bench_function("linear_3_stage", |b| {
        let mut graph = linear_chain_graph();
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            graph.push_data(Reading(n)).expect("push");
            graph.evaluate().expect("evaluate");
            black_box(graph.output_list().len());
        });
    });

    group.bench_function("fan_out_2_branch", |b| {
        let mut graph = fan_out_graph();
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            graph.push_data(Reading(n)).expect("push");
            graph.evaluate().expect("evaluate");
            black_box(graph.output_list().len());
        });
    });

    group.bench_function("zero_input_pass", |b| {
        let mut graph = linear_chain_graph();
        graph.evaluate().expect("prime sort");
        b.iter(|| {
            graph.evaluate().expect("evaluate");
            black_box(graph.output_list().is_empty());
        });
    });

    group.finish();
}

fn bench_queue_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_drain");

    for batch in [16usize, 256] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let mut graph = linear_chain_graph();
            b.iter(|| {
                for n in 0..batch {
                    #[allow(clippy::cast_possible_wrap)]
                    graph.push_data(Reading(n as i64)).expect("push");
                }
                while graph.evaluate_if_pending().expect("evaluate") {}
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_pass, bench_queue_drain);
criterion_main!(benches);
