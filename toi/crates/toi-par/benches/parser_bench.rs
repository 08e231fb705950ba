//! Parser benchmarks.
//! Run with: `cargo bench --package toi-par`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use toi_lex::tokenize;
use toi_par::parse;

fn parse_source(source: &str) {
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty());
    parse(tokens).unwrap();
}

fn bench_parser_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_simple");
    let source = "x = 42\n";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("assignment", |b| b.iter(|| parse_source(black_box(source))));
    group.finish();
}

fn bench_parser_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_functions");
    let source = "fib | n | r {\nif n <= 1 {\nr = n\n} otherwise {\nr = fib(n - 1) + fib(n - 2)\n}\n}\nprintln(fib(10))\n";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("recursive_function", |b| {
        b.iter(|| parse_source(black_box(source)))
    });
    group.finish();
}

fn bench_parser_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_types");
    let source = "type Point { x y }\np = Point(1, 2)\np.x = p.x + 1\nprintln(p.x, p.y)\n";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("type_and_field_access", |b| {
        b.iter(|| parse_source(black_box(source)))
    });
    group.finish();
}

fn bench_parser_control_flow(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_control_flow");
    let source = r#"
sum = 0
i = 0
while i < 100 {
    if i == 50 {
        exit loop
    }
    if i band 1 == 1 {
        i = i + 1
        next iteration
    }
    sum = sum + i
    i = i + 1
}
println(sum)
"#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("loop_with_break_continue", |b| {
        b.iter(|| parse_source(black_box(source)))
    });
    group.finish();
}

fn bench_parser_containers(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_containers");
    let source = r#"
m = map()
set(m, "a", 1)
set(m, "b", 2)
for v = [m] k {
    println(k, v)
}
arr = array(1, 2, 3)
push(arr, 4)
println(len(arr))
"#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("map_and_array", |b| b.iter(|| parse_source(black_box(source))));
    group.finish();
}

criterion_group!(
    benches,
    bench_parser_simple,
    bench_parser_functions,
    bench_parser_types,
    bench_parser_control_flow,
    bench_parser_containers,
);
criterion_main!(benches);
