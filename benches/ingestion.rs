use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tabular_ingest::ingestion::{convert_str, ConvertOptions, Format};

fn generate_csv(rows: usize) -> String {
    let mut out = String::from("id,name,score,active,note\n");
    for i in 0..rows {
        let note = if i % 7 == 0 { "" } else { "ok" };
        out.push_str(&format!(
            "{i},user_{i},{}.{},{},{note}\n",
            i % 100,
            i % 10,
            i % 2 == 0
        ));
    }
    out
}

fn generate_ndjson(rows: usize) -> String {
    let mut out = String::new();
    for i in 0..rows {
        out.push_str(&format!(
            "{{\"id\":{i},\"user\":{{\"name\":\"user_{i}\"}},\"score\":{}.5,\"active\":{}}}\n",
            i % 100,
            i % 2 == 0
        ));
    }
    out
}

fn bench_ingestion(c: &mut Criterion) {
    let opts = ConvertOptions::default();
    let mut group = c.benchmark_group("convert_str");

    for rows in [1_000usize, 10_000] {
        let csv = generate_csv(rows);
        group.throughput(Throughput::Bytes(csv.len() as u64));
        group.bench_with_input(BenchmarkId::new("csv", rows), &csv, |b, input| {
            b.iter(|| convert_str(black_box(input), Format::CSV, &opts).unwrap())
        });

        let ndjson = generate_ndjson(rows);
        group.throughput(Throughput::Bytes(ndjson.len() as u64));
        group.bench_with_input(BenchmarkId::new("ndjson", rows), &ndjson, |b, input| {
            b.iter(|| convert_str(black_box(input), Format::JsonLines, &opts).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ingestion);
criterion_main!(benches);
