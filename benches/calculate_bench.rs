use criterion::{Criterion, black_box, criterion_group, criterion_main};

use gobl::bill::{Invoice, InvoiceBuilder, LineBuilder};
use gobl::engine::engine;
use gobl::org::Party;
use gobl::schema::Document;
use gobl::tax::Identity;

fn supplier() -> Party {
    Party::new("Benchmark S.L.").with_tax_id(Identity::new("ES", "B98602642"))
}

fn build_invoice(lines: usize) -> Invoice {
    let mut builder = InvoiceBuilder::new("BENCH", "001").currency("EUR").supplier(supplier());
    for i in 1..=lines {
        let rate = if i % 3 == 0 { "reduced" } else { "standard" };
        builder = builder.add_line(
            LineBuilder::new(&format!("Item {i}"), "2", "9.99")
                .tax("VAT", rate)
                .build(),
        );
    }
    builder.build_unchecked().unwrap()
}

fn bench_calculate(c: &mut Criterion) {
    let invoice = build_invoice(10);
    c.bench_function("calculate_10_lines", |b| {
        b.iter(|| {
            let mut inv = invoice.clone();
            inv.calculate_with(engine()).unwrap();
            black_box(inv)
        });
    });

    let invoice = build_invoice(100);
    c.bench_function("calculate_100_lines", |b| {
        b.iter(|| {
            let mut inv = invoice.clone();
            inv.calculate_with(engine()).unwrap();
            black_box(inv)
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let invoice = build_invoice(100);
    c.bench_function("validate_100_lines", |b| {
        b.iter(|| black_box(black_box(&invoice).validate_using(engine())));
    });
}

fn bench_json(c: &mut Criterion) {
    let json = serde_json::to_string(&build_invoice(100)).unwrap();
    c.bench_function("document_from_json_100_lines", |b| {
        b.iter(|| black_box(Document::from_json(black_box(&json))));
    });
}

criterion_group!(benches, bench_calculate, bench_validate, bench_json);
criterion_main!(benches);
