// Dispatch benchmarks
//
// This benchmark suite measures:
// - Direct method calls
// - Cooperative chains through a diamond and a deep hierarchy
// - Forwarding through proxies
// - Multi-threaded dispatch on a shared runtime

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use oxidex_attr::{ForwardingProxy, Method, Runtime, TypeId, Value};
use std::sync::Arc;
use std::thread;

/// A method that adds one to whatever the rest of the chain returns.
fn counting_method() -> Method {
    Method::new(|access, args| {
        let rest = match access.next_call(args) {
            Ok(value) => value.as_int().unwrap_or(0),
            Err(err) if err.is_chain_end() => 0,
            Err(err) => return Err(err),
        };
        Ok(Value::from(rest + 1))
    })
}

fn diamond(rt: &Runtime) -> TypeId {
    let base = rt.declare_type("Base", &[]).unwrap();
    let a = rt.declare_type("A", &["Base"]).unwrap();
    let b = rt.declare_type("B", &["Base"]).unwrap();
    let c = rt.declare_type("C", &["A", "B"]).unwrap();
    for ty in [base, a, b, c] {
        rt.attach_method(ty, "count", counting_method()).unwrap();
    }
    c
}

fn bench_direct_call(c: &mut Criterion) {
    let rt = Runtime::new();
    let t = rt.declare_type("T", &[]).unwrap();
    rt.attach_method(t, "noop", Method::new(|_, _| Ok(Value::None)))
        .unwrap();
    let obj = rt.create_instance(t).unwrap();

    c.bench_function("direct_call", |b| {
        b.iter(|| black_box(rt.call(&obj, "noop", &[]).unwrap()));
    });
}

fn bench_cooperative_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("cooperative_chain");

    {
        let rt = Runtime::new();
        let leaf = diamond(&rt);
        let obj = rt.create_instance(leaf).unwrap();
        group.bench_function("diamond", |b| {
            b.iter(|| black_box(rt.call(&obj, "count", &[]).unwrap()));
        });
    }

    for depth in [4, 16, 32] {
        let rt = Runtime::new();
        let mut last = rt.declare_type("D0", &[]).unwrap();
        rt.attach_method(last, "count", counting_method()).unwrap();
        for i in 1..depth {
            let parent = format!("D{}", i - 1);
            last = rt.declare_type(&format!("D{i}"), &[parent.as_str()]).unwrap();
            rt.attach_method(last, "count", counting_method()).unwrap();
        }
        let obj = rt.create_instance(last).unwrap();

        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("depth", depth), &obj, |b, obj| {
            b.iter(|| black_box(rt.call(obj, "count", &[]).unwrap()));
        });
    }

    group.finish();
}

fn bench_forwarding(c: &mut Criterion) {
    let rt = Runtime::new();
    let spam = rt.declare_type("Spam", &[]).unwrap();
    let proxy_type = ForwardingProxy::declare(&rt, "Proxy").unwrap();
    let target = rt.create_instance(spam).unwrap();
    rt.write(&target, "x", 2).unwrap();
    let proxy = proxy_type.wrap(&rt, &target).unwrap();

    c.bench_function("forwarded_read", |b| {
        b.iter(|| black_box(rt.read(&proxy, "x").unwrap()));
    });
}

fn bench_multithreaded(c: &mut Criterion) {
    let rt = Arc::new(Runtime::new());
    let leaf = diamond(&rt);

    c.bench_function("multithreaded_dispatch", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let rt = Arc::clone(&rt);
                    thread::spawn(move || {
                        let obj = rt.create_instance(leaf).unwrap();
                        for _ in 0..100 {
                            black_box(rt.call(&obj, "count", &[]).unwrap());
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_direct_call,
    bench_cooperative_chain,
    bench_forwarding,
    bench_multithreaded
);
criterion_main!(benches);
