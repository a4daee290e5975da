// Cached Attribute Integration Tests
//
// These tests verify that compute-once attributes compute on first read,
// are served from the instance afterwards, and recompute after deletion.

use oxidex_attr::{Access, CachedResolver, Error, Result, Runtime, TypeId, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// pi * radius^2, counting every computation.
fn area(counter: Arc<AtomicUsize>) -> impl Fn(&Access<'_>) -> Result<Value> + Send + Sync + 'static {
    move |access| {
        counter.fetch_add(1, Ordering::SeqCst);
        let radius = access.get("radius")?.as_float().unwrap_or(0.0);
        Ok(Value::from(std::f64::consts::PI * radius * radius))
    }
}

fn circle(rt: &Runtime, protected: bool) -> (TypeId, Arc<AtomicUsize>) {
    let ty = rt.declare_type("Circle", &[]).unwrap();
    let computed = Arc::new(AtomicUsize::new(0));

    let compute = area(Arc::clone(&computed));
    let resolver = if protected {
        CachedResolver::read_only(compute)
    } else {
        CachedResolver::new(compute)
    };
    rt.attach_resolver(ty, "area", resolver).unwrap();
    (ty, computed)
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_float().expect("float");
    assert!((actual - expected).abs() < 1e-5, "{actual} != {expected}");
}

#[test]
fn test_circle_area_computed_once() {
    let rt = Runtime::new();
    let (ty, computed) = circle(&rt, false);

    let c = rt.create_instance(ty).unwrap();
    rt.write(&c, "radius", 4.0).unwrap();

    assert_close(&rt.read(&c, "area").unwrap(), 50.26548);
    assert_eq!(computed.load(Ordering::SeqCst), 1);

    assert_close(&rt.read(&c, "area").unwrap(), 50.26548);
    assert_eq!(computed.load(Ordering::SeqCst), 1);
    assert!(c.raw_contains("area"));
}

#[test]
fn test_delete_forces_recompute() {
    let rt = Runtime::new();
    let (ty, computed) = circle(&rt, false);

    let c = rt.create_instance(ty).unwrap();
    rt.write(&c, "radius", 4.0).unwrap();
    rt.read(&c, "area").unwrap();

    rt.delete(&c, "area").unwrap();
    rt.write(&c, "radius", 1.0).unwrap();
    assert_close(&rt.read(&c, "area").unwrap(), std::f64::consts::PI);
    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_instances_cache_independently() {
    let rt = Runtime::new();
    let (ty, computed) = circle(&rt, false);

    let small = rt.create_instance(ty).unwrap();
    let large = rt.create_instance(ty).unwrap();
    rt.write(&small, "radius", 1.0).unwrap();
    rt.write(&large, "radius", 10.0).unwrap();

    assert_close(&rt.read(&small, "area").unwrap(), std::f64::consts::PI);
    assert_close(&rt.read(&large, "area").unwrap(), std::f64::consts::PI * 100.0);
    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_protected_area() {
    let rt = Runtime::new();
    let (ty, computed) = circle(&rt, true);

    let c = rt.create_instance(ty).unwrap();
    rt.write(&c, "radius", 4.0).unwrap();

    assert_close(&rt.read(&c, "area").unwrap(), 50.26548);
    assert_close(&rt.read(&c, "area").unwrap(), 50.26548);
    assert_eq!(computed.load(Ordering::SeqCst), 1);

    assert!(matches!(
        rt.write(&c, "area", 25),
        Err(Error::NotWritable { .. })
    ));
    assert!(matches!(
        rt.delete(&c, "area"),
        Err(Error::Undeletable { .. })
    ));
    assert!(c.raw_contains("_lazy_area"));
}
