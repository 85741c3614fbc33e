use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlbind::{Cond, MySql, Postgres, RowSet, SqlQb, Value, qb, scan_map};

/// SELECT col0, col1, ... FROM t WHERE (col0=$1 AND col1=$2 ...)
fn build_select(n: usize) -> qb::SelectQb {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let conds: Vec<Cond> = (0..n).map(|i| Cond::eq(format!("col{i}").as_str(), i as i64)).collect();
    qb::select(columns.iter().map(String::as_str))
        .from("t")
        .and_where(Cond::and(conds))
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build");

    for n in [1, 5, 10, 50, 100] {
        let pg = build_select(n).dialect(Postgres);
        group.bench_with_input(BenchmarkId::new("postgres", n), &pg, |b, qb| {
            b.iter(|| black_box(qb.build()));
        });
        let my = build_select(n).dialect(MySql);
        group.bench_with_input(BenchmarkId::new("mysql", n), &my, |b, qb| {
            b.iter(|| black_box(qb.build()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let stmt = qb::select(["*"])
                    .from("t")
                    .dialect(Postgres)
                    .in_list("id", values.iter().copied())
                    .build();
                black_box(stmt)
            });
        });
    }

    group.finish();
}

fn bench_nested_conditions(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/nested_conditions");

    for depth in [1, 4, 16] {
        let mut cond = Cond::eq("leaf", 0);
        for i in 0..depth {
            cond = Cond::or([Cond::and([cond, Cond::gt("a", i)]), Cond::is_null("b")]);
        }
        let qb = qb::select(["id"]).from("t").dialect(Postgres).and_where(cond);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &qb, |b, qb| {
            b.iter(|| black_box(qb.build()));
        });
    }

    group.finish();
}

fn bench_scan_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/scan_map");

    for n in [10, 1_000] {
        let mut rows = RowSet::new(["k", "v"]);
        for i in 0..n {
            rows.push(vec![Value::Int(i), Value::from(format!("v{i}"))])
                .unwrap();
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| {
                let map: sqlbind::SqlResult<std::collections::HashMap<i64, String>> =
                    scan_map(&mut rows.clone());
                black_box(map)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_in_list,
    bench_nested_conditions,
    bench_scan_map
);
criterion_main!(benches);
