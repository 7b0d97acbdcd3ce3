//! First-fit heap benchmarks.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use firstfit::Heap;

fn bench_alloc_free_cycle(c: &mut Criterion) {
  let sizes: &[usize] = &[16, 64, 256, 1024, 4096];
  let mut group = c.benchmark_group("alloc_free_cycle");

  for &size in sizes {
    group.bench_with_input(BenchmarkId::new("arena", size), &size, |b, &sz| {
      let mut heap = Heap::with_arena(1024 * 1024);
      b.iter(|| {
        let ptr = heap.allocate(sz).ok();
        heap.deallocate(criterion::black_box(ptr));
      });
    });
  }
  group.finish();
}

fn bench_fragmented_search(c: &mut Criterion) {
  let mut group = c.benchmark_group("fragmented_search");

  group.bench_function("512 holes", |b| {
    let mut heap = Heap::with_arena(4 * 1024 * 1024);
    let ptrs: Vec<_> = (0..1024).filter_map(|_| heap.allocate(32).ok()).collect();

    for ptr in ptrs.iter().step_by(2) {
      heap.deallocate(Some(*ptr));
    }

    b.iter(|| {
      let ptr = heap.allocate(64).ok();
      heap.deallocate(criterion::black_box(ptr));
    });
  });

  group.finish();
}

criterion_group!(benches, bench_alloc_free_cycle, bench_fragmented_search);
criterion_main!(benches);
