use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures_group::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("fan_out 10", |b| b.iter(|| fan_out_test(black_box(10))));
    c.bench_function("fan_out 100", |b| b.iter(|| fan_out_test(black_box(100))));
    c.bench_function("fan_out 1000", |b| b.iter(|| fan_out_test(black_box(1000))));
    c.bench_function("nested 100", |b| b.iter(|| nested_test(black_box(100))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

/// Reserve `max` slots up front, then complete them in reverse order.
pub(crate) fn fan_out_test(max: usize) {
    let queue = LocalQueue::new();
    let group: Group<usize, ()> = Group::with_capacity(queue.clone(), max);
    let slots: Vec<_> = (0..max).map(|_| group.slot()).collect();
    for (n, slot) in slots.into_iter().enumerate().rev() {
        slot.ok(n);
    }

    let out = queue.run_until(group.settled()).unwrap();
    assert_eq!(out.len(), max);
    assert!(out.iter().enumerate().all(|(i, n)| i == *n));
}

/// One child group per slot, each carrying a single value.
pub(crate) fn nested_test(max: usize) {
    let queue = LocalQueue::new();
    let group: Group<Vec<usize>, ()> = Group::new(queue.clone());
    for n in 0..max {
        group.make_group().pass([n]);
    }

    let out = queue.run_until(group.settled()).unwrap();
    assert_eq!(out.len(), max);
}
