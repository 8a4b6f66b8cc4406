use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use newick_core::{
    lexer::Lexer, parser::Parser, read_default_tree, write_default_tree, NewickPrinter,
    TopologyBuilder,
};

// ============================================================================
// Test Data
// ============================================================================

const TINY_NWK: &str = "(A,B);";

const SMALL_NWK: &str = "((A:0.1,B:0.2)C:0.3,(D:0.4,E:0.5)F:0.6)R;";

const PLACEMENT_NWK: &str = "((Homo_sapiens:0.21{0},Pan_troglodytes:0.19{1})Hominini:0.05{2},\
Gorilla_gorilla:0.3{3},(Pongo_abelii:0.4{4},'Pongo pygmaeus':0.38{5})Pongo:0.1{6})Hominidae;";

/// Balanced binary tree with `leaves` leaves (rounded up to a power of two).
fn generate_balanced(leaves: usize) -> String {
    fn subtree(out: &mut String, leaves: usize, next: &mut usize) {
        if leaves <= 1 {
            out.push_str(&format!("T{}:0.01", *next));
            *next += 1;
            return;
        }
        out.push('(');
        subtree(out, leaves / 2, next);
        out.push(',');
        subtree(out, leaves - leaves / 2, next);
        out.push_str("):0.1");
    }
    let mut out = String::new();
    let mut next = 0;
    subtree(&mut out, leaves.next_power_of_two(), &mut next);
    out.push(';');
    out
}

/// Caterpillar tree, i.e. the deepest possible tree for `leaves` leaves.
fn generate_caterpillar(leaves: usize) -> String {
    let mut out = "(".repeat(leaves - 1);
    out.push_str("T0");
    for i in 1..leaves {
        out.push_str(&format!(",T{i})"));
    }
    out.push(';');
    out
}

// ============================================================================
// Lexer Benchmarks
// ============================================================================

fn bench_lexer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_by_size");

    for (name, source) in [
        ("tiny", TINY_NWK),
        ("small", SMALL_NWK),
        ("placement", PLACEMENT_NWK),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(src));
                lexer.lex()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Parser Benchmarks
// ============================================================================

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_balanced_scaling");

    for size in [16, 128, 1024, 8192] {
        let source = generate_balanced(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_broker())
        });
    }

    group.finish();
}

fn bench_parser_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_caterpillar_depth");

    for size in [100, 1000, 10000] {
        let source = generate_caterpillar(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| Parser::new(black_box(src)).parse_broker())
        });
    }

    group.finish();
}

// ============================================================================
// Topology Benchmarks
// ============================================================================

fn bench_build_and_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    let builder = TopologyBuilder::default_tree();

    for size in [128, 1024, 8192] {
        let broker = Parser::new(&generate_balanced(size)).parse_broker().unwrap();
        let tree = builder.build(&broker).unwrap();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("build", size), &broker, |b, broker| {
            b.iter(|| builder.build(black_box(broker)))
        });
        group.bench_with_input(BenchmarkId::new("flatten", size), &tree, |b, tree| {
            b.iter(|| builder.flatten(black_box(tree)))
        });
        group.bench_with_input(BenchmarkId::new("euler_tour", size), &tree, |b, tree| {
            b.iter(|| black_box(tree).euler_tour().count())
        });
    }

    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_e2e_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("e2e_round_trip");

    for size in [128, 1024, 8192] {
        let source = generate_balanced(size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| {
                let tree = read_default_tree(black_box(src)).unwrap();
                write_default_tree(&tree)
            })
        });
    }

    group.finish();
}

fn bench_printer(c: &mut Criterion) {
    let broker = Parser::new(PLACEMENT_NWK).parse_broker().unwrap();
    let printer = NewickPrinter::default();
    c.bench_function("printer_placement", |b| {
        b.iter(|| printer.print(black_box(&broker)))
    });
}

criterion_group!(lexer_benches, bench_lexer_sizes);

criterion_group!(parser_benches, bench_parser_scaling, bench_parser_depth);

criterion_group!(topology_benches, bench_build_and_flatten);

criterion_group!(e2e_benches, bench_e2e_round_trip, bench_printer);

criterion_main!(lexer_benches, parser_benches, topology_benches, e2e_benches);
