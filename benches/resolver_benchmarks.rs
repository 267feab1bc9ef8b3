//! Benchmarks for binding resolution and view compilation.
//!
//! - `binding/*`: one binding source resolved against a data context,
//!   covering member chains, overload ranking, params shaping and operators
//! - `view/*`: whole views compiled from an in-memory source with a cold cache
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- view
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use dothtml::compiler::{BindingBinder, DataContextStack};
use dothtml::core::Span;
use dothtml::parser::markup::{BindingKind, BindingSource};
use dothtml::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::with_standard_controls();
    let order = DataType::named("Shop.Order");
    let entries = [
        TypeBuilder::new("Shop.Order", "Shop")
            .property("Total", DataType::decimal())
            .property("Quantity", DataType::int32())
            .build(),
        TypeBuilder::new("Shop.Customer", "Shop")
            .property("Name", DataType::string())
            .property("Discount", DataType::nullable(DataType::int32()))
            .property("Orders", DataType::array(order))
            .method(MethodBuilder::new("Format", DataType::string()).param("x", DataType::int32()))
            .method(MethodBuilder::new("Format", DataType::string()).param("x", DataType::int64()))
            .method(MethodBuilder::new("Format", DataType::string()).param("x", DataType::double()))
            .method(MethodBuilder::new("Format", DataType::string()).param("x", DataType::object()))
            .method(MethodBuilder::new("Sum", DataType::int32()).params_tail("xs", DataType::int32()))
            .method(MethodBuilder::new("Save", DataType::Void))
            .build(),
    ];
    for entry in entries {
        registry.register_type(entry).expect("benchmark types register");
    }
    Arc::new(registry)
}

fn source(expression: &str) -> BindingSource {
    BindingSource {
        kind: BindingKind::Value,
        expression: expression.to_string(),
        span: Span::new(1, 1, 1),
        expression_span: Span::new(1, 10, 1),
    }
}

fn bench_bindings(c: &mut Criterion) {
    let registry = registry();
    let context = DataContextStack::root(DataType::named("Shop.Customer"), vec!["Shop".to_string()]);
    let cases = [
        ("member_chain", "Orders[0].Total"),
        ("overload", "Format(Orders[0].Quantity)"),
        ("params", "Sum(1, 2, 3, 4, 5)"),
        ("nullable_operator", "Discount + 1 > 10"),
    ];

    let mut group = c.benchmark_group("binding");
    for (name, expression) in cases {
        let source = source(expression);
        group.bench_function(name, |b| {
            b.iter(|| {
                let binder = BindingBinder::new(&*registry, &context);
                black_box(binder.bind_source(black_box(&source)))
            })
        });
    }
    group.finish();
}

fn site(pages: usize) -> Arc<InMemorySource> {
    let source = InMemorySource::new().with_file(
        "Views/Site.dotmaster",
        "@viewModel Shop.Customer\n<html><body><dot:ContentPlaceHolder ID=\"main\" /></body></html>",
    );
    for i in 0..pages {
        source.insert(
            &format!("Views/page{i}.dothtml"),
            "@viewModel Shop.Customer\n@masterPage Views/Site.dotmaster\n\
             <dot:Content ContentPlaceHolderID=\"main\">\n\
             <h1>{{value: Name}}</h1>\n\
             <p>{{value: Format(Orders[0].Quantity)}}</p>\n\
             <dot:TextBox Text={value: Name} Enabled={value: Discount > 0} />\n\
             <div DataContext={value: Orders[0]}>{{value: Total * 2}}</div>\n\
             <dot:Button Text=\"Save\" Click={command: Save()} />\n\
             </dot:Content>",
        );
    }
    Arc::new(source)
}

fn bench_views(c: &mut Criterion) {
    setup_profiler();
    let registry = registry();

    let mut group = c.benchmark_group("view");
    for pages in [1usize, 16] {
        let source = site(pages);
        let config = (0..pages).fold(CompilerConfig::default(), |config, i| {
            config.with_route(&format!("page{i}"), &format!("Views/page{i}.dothtml"))
        });
        group.throughput(Throughput::Elements(pages as u64));
        group.bench_function(format!("compile_{pages}"), |b| {
            b.iter(|| {
                let compiler = StaticViewCompiler::new(Arc::clone(&registry), source.clone(), config.clone());
                let result = black_box(compiler.compile());
                end_profiling_frame();
                result
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bindings, bench_views);
criterion_main!(benches);
