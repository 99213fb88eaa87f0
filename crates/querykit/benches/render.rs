use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querykit::dialect::{MsSql, Postgres};
use querykit::{Condition, Query};

/// A query with `n` columns, `n` AND leaves and one shorthand join:
/// SELECT col0, col1, ... FROM t JOIN u ON (t.u_id = u.id) WHERE col0 = $1 AND ...
fn build_query(n: usize) -> Query {
    let mut q = Query::table("t");
    for i in 0..n {
        let col = format!("col{i}");
        q = q.add_column(&col).add_and(&col, i as i64);
    }
    q.join("t.u_id", "u.id").unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build");

    for n in [1, 5, 10, 50] {
        let q = build_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.select_statement(Some(&Postgres))));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/render");

    for n in [1, 5, 10, 50] {
        let stmt = build_query(n).select_statement(Some(&Postgres)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.render(&Postgres)));
        });
    }

    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/count");

    for n in [1, 10, 50] {
        let q = build_query(n).group_by("col0");
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.count_statement(Some(&Postgres))));
        });
    }

    group.finish();
}

fn bench_mssql_paging(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/mssql_paging");

    for n in [1, 10, 50] {
        let q = build_query(n).limit(20).set_offset(40);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.select_statement(Some(&MsSql))));
        });
    }

    group.finish();
}

fn bench_condition_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/condition_groups");

    for depth in [1, 4, 16] {
        let mut cond = Condition::eq("leaf", 0);
        for i in 0..depth {
            let mut outer = Condition::new();
            outer.add_or("level", i as i64).and_group(&cond);
            cond = outer;
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &cond, |b, cond| {
            b.iter(|| black_box(cond.to_statement()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_render,
    bench_count,
    bench_mssql_paging,
    bench_condition_groups
);
criterion_main!(benches);
