//! Benchmark: classify + build, fix-up, and write for a synthetic protocol of
//! many domains. Set PDLGEN_BENCH_FILE to benchmark a real PDL file instead.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdlgen::{fix_domains, parse, to_pdl, FixupConfig};

fn synthetic(domains: usize, types: usize) -> String {
    let mut src = String::from("# Synthetic benchmark protocol.\n\nversion\n  major 1\n  minor 3\n\n");
    for d in 0..domains {
        src.push_str(&format!("experimental domain Domain{}\n", d));
        if d > 0 {
            src.push_str(&format!("  depends on Domain{}\n", d - 1));
        }
        src.push('\n');
        for t in 0..types {
            src.push_str(&format!("  # Type {} of domain {}.\n", t, d));
            src.push_str(&format!("  type Domain{}Type{} extends object\n    properties\n", d, t));
            src.push_str("      integer id\n      optional string name\n");
            src.push_str("      array of number values\n");
            src.push_str("      enum state\n        idle\n        busy\n        gone\n");
            if d > 0 {
                src.push_str(&format!("      optional Domain{}.Domain{}Type0 parent\n", d - 1, d - 1));
            }
            src.push('\n');
        }
        src.push_str("  command enable\n    parameters\n      optional integer budget\n    returns\n");
        src.push_str(&format!("      Domain{}Type0 first\n\n", d));
        src.push_str("  event changed\n    parameters\n      string reason\n\n");
    }
    src
}

fn bench_parse_pdl(c: &mut Criterion) {
    let src = match std::env::var("PDLGEN_BENCH_FILE") {
        Ok(path) => std::fs::read_to_string(&path).expect("read bench file"),
        Err(_) => synthetic(40, 25),
    };
    let protocol = parse(&src).expect("parse");
    let config = FixupConfig::default();
    eprintln!(
        "parse_pdl: {} lines, {} domains",
        src.lines().count(),
        protocol.domains.len()
    );

    c.bench_function("parse", |b| b.iter(|| parse(black_box(&src)).expect("parse")));

    c.bench_function("fixup", |b| {
        b.iter(|| {
            let mut p = protocol.clone();
            fix_domains(&mut p, black_box(&config)).expect("fixup");
            p
        })
    });

    c.bench_function("write", |b| b.iter(|| to_pdl(black_box(&protocol)).expect("write")));
}

criterion_group!(benches, bench_parse_pdl);
criterion_main!(benches);
