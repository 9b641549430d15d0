//! Benchmarks for composing and compiling sites.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quire_compiler::{
    BoxError, Compiler, CompilerSettings, ContentTransformer, FragmentProviders, RenderContext,
};
use quire_location::Location;
use quire_meta::Metadata;
use quire_site::{ComposerSettings, Site, SiteComposer};
use quire_storage::{Loader, MockLoader};

struct Identity;

impl ContentTransformer for Identity {
    fn transform(&self, raw: &str, _id: &str, _ctx: &RenderContext<'_>) -> Result<String, BoxError> {
        Ok(raw.to_owned())
    }
}

/// Generate a site with `sections` folders of `pages` pages each.
fn generate_loader(sections: usize, pages: usize) -> MockLoader {
    let mut loader = MockLoader::new()
        .with_file("_layouts/base.html", "<html>{% header %}{{ content }}</html>")
        .with_file(
            "_layouts/doc.html",
            "---\nlayout: base\n---\n<article>{{ content }}</article>",
        )
        .with_file("_includes/header.md", "<header>{% nav::links %}</header>")
        .with_file("_includes/nav/links.md", "---\ncount: 3\n---\n<nav>links</nav>")
        .with_file("index.md", "---\nlayout: base\n---\nHome");

    for s in 0..sections {
        loader = loader.with_file(&format!("s{s}/index.md"), format!("Section {s}"));
        for p in 0..pages {
            loader = loader.with_file(
                &format!("s{s}/p{p}.md"),
                format!("---\nlayout: doc\ntitle: Page {p}\n---\nIntro {{% header %}} body of page {p}."),
            );
        }
    }
    loader
}

fn compose(loader: &MockLoader) -> Site {
    let files = loader.load(&Location::default()).unwrap();
    SiteComposer::new(ComposerSettings::default(), Metadata::new())
        .compose(files, "")
        .unwrap()
}

fn compiler() -> Compiler {
    Compiler::new(
        Arc::new(Identity),
        Arc::new(FragmentProviders::new()),
        &CompilerSettings::default(),
    )
    .unwrap()
}

fn bench_compose(c: &mut Criterion) {
    let loader = generate_loader(10, 20);

    c.bench_function("compose_200_pages", |b| b.iter(|| compose(&loader)));
}

fn bench_compile(c: &mut Criterion) {
    let compiler = compiler();
    let mut group = c.benchmark_group("compile");

    for &(sections, pages) in &[(5, 10), (10, 20), (20, 50)] {
        let loader = generate_loader(sections, pages);
        let total = sections * (pages + 1) + 1;
        group.throughput(Throughput::Elements(total as u64));

        group.bench_with_input(BenchmarkId::new("sequential", total), &loader, |b, loader| {
            b.iter_batched(
                || compose(loader),
                |mut site| compiler.compile(&mut site).unwrap().count(),
                criterion::BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("parallel", total), &loader, |b, loader| {
            b.iter_batched(
                || compose(loader),
                |mut site| compiler.compile_parallel(&mut site).unwrap().len(),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose, bench_compile);
criterion_main!(benches);
