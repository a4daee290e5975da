// Common test utilities for integration tests
//
// Shared fixtures: the diamond hierarchy, a call log for recording the order
// in which implementations run, and helpers for reading orders as names.

#![allow(dead_code)]

use oxidex_attr::{Runtime, TypeId};
use parking_lot::Mutex;
use std::sync::Arc;

/// `Base; A(Base); B(Base); C(A, B)`.
pub struct Diamond {
    pub base: TypeId,
    pub a: TypeId,
    pub b: TypeId,
    pub c: TypeId,
}

pub fn diamond(rt: &Runtime) -> Diamond {
    let base = rt.declare_type("Base", &[]).expect("declare Base");
    let a = rt.declare_type("A", &["Base"]).expect("declare A");
    let b = rt.declare_type("B", &["Base"]).expect("declare B");
    let c = rt.declare_type("C", &["A", "B"]).expect("declare C");
    Diamond { base, a, b, c }
}

/// The resolution order of `ty` as plain strings.
pub fn order_names(rt: &Runtime, ty: TypeId) -> Vec<&'static str> {
    rt.resolution_order_names(ty)
        .expect("resolution order")
        .into_iter()
        .map(|name| name.as_str())
        .collect()
}

/// Records events from inside resolvers and methods.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
