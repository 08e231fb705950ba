//! Lexer benchmarks.
//!
//! Run with: `cargo bench --package toi-lex`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use toi_lex::tokenize;

fn bench_lexer_programs(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let arithmetic = "println(1 + 2 * 3 - 4 / 2 % 2)";
    group.throughput(Throughput::Bytes(arithmetic.len() as u64));
    group.bench_function("arithmetic", |b| {
        b.iter(|| tokenize(black_box(arithmetic)))
    });

    let loop_src = "i = 0\nwhile i < 1000 {\n  i = i + 1\n  if i == 500 { exit loop }\n}\n";
    group.throughput(Throughput::Bytes(loop_src.len() as u64));
    group.bench_function("loop", |b| b.iter(|| tokenize(black_box(loop_src))));

    let function_src = "add | a b | r { r = a + b }\nprintln(add(2, 3))\n";
    group.throughput(Throughput::Bytes(function_src.len() as u64));
    group.bench_function("function_decl", |b| {
        b.iter(|| tokenize(black_box(function_src)))
    });

    group.finish();
}

fn bench_lexer_strings_and_numbers(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_literals");

    let numbers: String = (0..200).map(|n| format!("{n} ")).collect();
    group.throughput(Throughput::Bytes(numbers.len() as u64));
    group.bench_function("numbers", |b| b.iter(|| tokenize(black_box(&numbers))));

    let strings = r#""hello" "world" "escaped ${"}quote${"}" "#.repeat(50);
    group.throughput(Throughput::Bytes(strings.len() as u64));
    group.bench_function("strings", |b| b.iter(|| tokenize(black_box(&strings))));

    group.finish();
}

criterion_group!(benches, bench_lexer_programs, bench_lexer_strings_and_numbers);
criterion_main!(benches);
