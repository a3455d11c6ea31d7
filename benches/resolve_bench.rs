use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use lexdump::config::{AnalyzerConfig, FieldNames};
use lexdump::testing::{build_fixture_index, synthetic_corpus};
use lexdump::{DocNo, DocOrder, DocidResolver, IndexHandle, TermStatsReader};

struct BenchEnv {
    _tmp: TempDir,
    handle: IndexHandle,
    count: usize,
}

fn build_env(doc_count: usize) -> BenchEnv {
    let tmp = TempDir::new().unwrap();
    build_fixture_index(tmp.path(), &synthetic_corpus(doc_count)).unwrap();
    let handle = IndexHandle::open(tmp.path()).unwrap();

    BenchEnv {
        _tmp: tmp,
        handle,
        count: doc_count,
    }
}

fn build_envs() -> Vec<BenchEnv> {
    [1_000usize, 10_000, 50_000].iter().map(|&count| build_env(count)).collect()
}

fn bench_resolve_internal(c: &mut Criterion) {
    let envs = build_envs();
    let fields = FieldNames::default();

    let mut group = c.benchmark_group("resolve_internal");
    for env in envs.iter() {
        let resolver = DocidResolver::new(&env.handle, &fields);
        let docid = format!("doc-{:06}", env.count / 2);
        group.bench_with_input(BenchmarkId::from_parameter(env.count), &docid, |b, docid| {
            b.iter(|| {
                black_box(resolver.resolve_internal(docid).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_resolve_external(c: &mut Criterion) {
    let envs = build_envs();
    let fields = FieldNames::default();

    let mut group = c.benchmark_group("resolve_external");
    for env in envs.iter() {
        let resolver = DocidResolver::new(&env.handle, &fields);
        let docno = DocNo((env.count / 2) as u32);
        group.bench_with_input(BenchmarkId::from_parameter(env.count), &docno, |b, docno| {
            b.iter(|| {
                black_box(resolver.resolve_external(*docno).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_term_lookup(c: &mut Criterion) {
    let envs = build_envs();
    let fields = FieldNames::default();
    let analyzer = AnalyzerConfig::default();

    let mut group = c.benchmark_group("term_postings");
    for env in envs.iter() {
        let reader = TermStatsReader::new(&env.handle, &fields, &analyzer);
        group.bench_with_input(BenchmarkId::from_parameter(env.count), &reader, |b, reader| {
            b.iter(|| {
                black_box(reader.postings("postings").unwrap().len());
            });
        });
    }
    group.finish();
}

fn bench_docid_ordering(c: &mut Criterion) {
    let envs = build_envs();
    let order = DocOrder::by_docid(&FieldNames::default());

    let mut group = c.benchmark_group("sorted_docs");
    for env in envs.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(env.count), env, |b, env| {
            b.iter(|| {
                black_box(env.handle.sorted_docs(&order, None).unwrap().len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolve_internal,
    bench_resolve_external,
    bench_term_lookup,
    bench_docid_ordering
);
criterion_main!(benches);
