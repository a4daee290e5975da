//! `oxidex-attr`: attribute resolution and cooperative dispatch
//!
//! `oxidex-attr` models how a dynamic object system resolves an attribute
//! name on an instance. It provides:
//!
//! - **Linearized hierarchies**: deterministic C3 resolution orders over
//!   multiple inheritance, rejecting inconsistent hierarchies
//! - **Resolvers**: per-type interceptors for reads, writes and deletes,
//!   with data/non-data precedence against instance storage
//! - **Cooperative dispatch**: "continue with the next implementation" along
//!   the order of the instance's actual type
//! - **Building blocks**: compute-once attributes, typed attributes and
//!   forwarding proxies
//!
//! # Architecture
//!
//! - **Definition Layer**: [`TypeGraph`], [`Linearizer`](linearize::Linearizer)
//!   and [`ResolverRegistry`](registry::ResolverRegistry)
//! - **Engine Layer**: [`Runtime`] operations and [`Access`] contexts
//! - **Library Layer**: [`CachedResolver`], [`TypedResolver`] and
//!   [`ForwardingProxy`]
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::{Method, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let base = rt.declare_type("Base", &[]).unwrap();
//! let a = rt.declare_type("A", &["Base"]).unwrap();
//! let b = rt.declare_type("B", &["Base"]).unwrap();
//! let c = rt.declare_type("C", &["A", "B"]).unwrap();
//!
//! for (ty, label) in [(a, "A"), (b, "B"), (c, "C")] {
//!     rt.attach_method(ty, "init", Method::new(move |access, args| {
//!         access.next_call(args)?;
//!         let log = access.get("log").unwrap_or_default();
//!         access.set("log", format!("{}{label}", log.as_str().unwrap_or("")))?;
//!         Ok(Value::None)
//!     }))
//!     .unwrap();
//! }
//! rt.attach_method(base, "init", Method::new(|access, _| {
//!     access.set("log", "Base")?;
//!     Ok(Value::None)
//! }))
//! .unwrap();
//!
//! let obj = rt.create_instance(c).unwrap();
//! rt.call(&obj, "init", &[]).unwrap();
//! assert_eq!(rt.read(&obj, "log").unwrap(), Value::from("BaseBAC"));
//! ```

pub mod cached;
pub mod config;
pub mod dispatch;
mod engine;
pub mod error;
pub mod graph;
pub mod instance;
pub mod linearize;
pub mod name;
pub mod proxy;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod typed;
pub mod value;

// Re-export commonly used types
pub use cached::CachedResolver;
pub use config::RuntimeConfig;
pub use dispatch::{Access, DispatchCursor, Operation};
pub use error::{Error, ErrorCategory, Result};
pub use graph::{TypeGraph, TypeId};
pub use instance::Instance;
pub use linearize::ResolutionOrder;
pub use name::Name;
pub use proxy::{ForwardingProxy, ForwardingResolver};
pub use resolver::{Fallback, Member, Method, Resolver, ResolverBuilder};
pub use runtime::Runtime;
pub use store::AttributeStore;
pub use typed::TypedResolver;
pub use value::{Value, ValueKind};
