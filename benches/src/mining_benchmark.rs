use criterion::{black_box, criterion_group, criterion_main, Criterion};

use patterndiff_core::{Differencer, Pattern, Recommender, SourceParser};
use patterndiff_lang::{parse_document, PythonParser};

const SMALL_ORIGINAL: &str = "def greet(name):\n    print('hello ' + name)\n";
const SMALL_MODIFIED: &str = "def greet(name):\n    print('hi ' + name)\n";

fn repeat_function(template: &str, count: usize) -> String {
  (0..count)
    .map(|i| template.replace("greet", &format!("greet_{i}")))
    .collect()
}

fn build_pattern_bench(c: &mut Criterion) {
  let differencer = Differencer::new(0.1, 1000);
  let parser = PythonParser;
  c.bench_function("create pattern (small function)", |b| {
    b.iter(|| {
      Pattern::create(
        &parser,
        &differencer,
        black_box(SMALL_ORIGINAL),
        black_box(SMALL_MODIFIED),
      )
      .unwrap()
    })
  });
}

fn differencer_bench(c: &mut Criterion) {
  let large_original = repeat_function(SMALL_ORIGINAL, 50);
  let large_modified = repeat_function(SMALL_MODIFIED, 50);
  let parser = PythonParser;

  let mut original_arena = patterndiff_core::Arena::new();
  let original_root = parser.parse(&mut original_arena, &large_original).unwrap();
  let modified_root = parser.parse(&mut original_arena, &large_modified).unwrap();
  let differencer = Differencer::new(0.1, 1000);

  c.bench_function("connect_nodes (50 functions)", |b| {
    b.iter(|| {
      black_box(differencer.connect_nodes(&original_arena, original_root, modified_root))
    })
  });
}

fn recommender_bench(c: &mut Criterion) {
  let differencer = Differencer::new(0.1, 1000);
  let parser = PythonParser;
  let pattern = Pattern::create(&parser, &differencer, SMALL_ORIGINAL, SMALL_MODIFIED).unwrap();

  let host_source = repeat_function(SMALL_ORIGINAL, 50);
  let (doc, root) = parse_document(&host_source).unwrap();

  c.bench_function("recommender scan (50 functions, 1 pattern)", |b| {
    b.iter(|| {
      let mut recommender = Recommender::new(&doc, root);
      recommender.subscribe(&pattern);
      black_box(recommender.run())
    })
  });
}

criterion_group!(
  benches,
  build_pattern_bench,
  differencer_bench,
  recommender_bench
);
criterion_main!(benches);
