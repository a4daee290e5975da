//! Cooperative dispatch: cursors, operations and the member access context.
//!
//! Every member invocation receives an [`Access`] describing where it was
//! found: the instance, the attribute name and a [`DispatchCursor`]
//! positioned at the type that supplied the member. From there
//! [`Access::dispatch_next`] continues the search in the instance's order.
//!
//! # Dispatch Algorithm
//!
//! 1. Take the cursor's order (always the order of the instance's actual
//!    type, never that of the type where the calling code lives)
//! 2. Scan `order[index + 1..]` for the next type binding the name
//! 3. Apply the operation to that member, with a fresh cursor at its position
//! 4. Fail with [`Error::NoMoreInChain`] if nothing is left
//!
//! Because the order belongs to the actual type, a mixin with no declared
//! relation to another type still reaches it when both appear in a third
//! type's order. As long as each override calls `dispatch_next` exactly once,
//! every implementation in a diamond runs exactly once.
//!
//! Calling an ancestor's implementation by fixed type instead
//! ([`Runtime::invoke_on`]) bypasses the order; in a diamond the shared base
//! then runs once per path.
//!
//! # Example
//!
//! ```rust
//! use oxidex_attr::{Method, Operation, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let base = rt.declare_type("Base", &[]).unwrap();
//! let child = rt.declare_type("Child", &["Base"]).unwrap();
//!
//! rt.attach_method(base, "greet", Method::new(|_, _| Ok(Value::from("base"))))
//!     .unwrap();
//! rt.attach_method(child, "greet", Method::new(|access, args| {
//!     let parent = access.dispatch_next(Operation::Call(args.to_vec()))?;
//!     Ok(Value::from(format!("child+{}", parent.as_str().unwrap_or(""))))
//! }))
//! .unwrap();
//!
//! let obj = rt.create_instance(child).unwrap();
//! assert_eq!(rt.call(&obj, "greet", &[]).unwrap(), Value::from("child+base"));
//! ```

use crate::error::{Error, Result};
use crate::graph::TypeId;
use crate::instance::Instance;
use crate::linearize::ResolutionOrder;
use crate::name::Name;
use crate::runtime::Runtime;
use crate::value::Value;

/// An attribute operation, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read the attribute.
    Read,
    /// Write the given value.
    Write(Value),
    /// Delete the attribute.
    Delete,
    /// Call the method with the given arguments.
    Call(Vec<Value>),
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write(_) => "write",
            Operation::Delete => "delete",
            Operation::Call(_) => "call",
        }
    }
}

/// Search position within an instance's resolution order.
#[derive(Debug, Clone)]
pub struct DispatchCursor {
    instance: Instance,
    order: ResolutionOrder,
    index: usize,
}

impl DispatchCursor {
    pub(crate) fn new(instance: Instance, order: ResolutionOrder, index: usize) -> Self {
        debug_assert!(index < order.len());
        DispatchCursor {
            instance,
            order,
            index,
        }
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Order of the instance's actual type.
    #[must_use]
    pub fn order(&self) -> &ResolutionOrder {
        &self.order
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The type at the current position.
    #[must_use]
    pub fn current(&self) -> TypeId {
        self.order[self.index]
    }

    /// A fresh cursor over the same order at `index`.
    #[cfg(test)]
    pub(crate) fn at(&self, index: usize) -> Self {
        DispatchCursor::new(self.instance.clone(), self.order.clone(), index)
    }
}

/// Context handed to resolvers, methods and fallback hooks.
pub struct Access<'a> {
    runtime: &'a Runtime,
    cursor: DispatchCursor,
    name: Name,
}

impl<'a> Access<'a> {
    pub(crate) fn new(runtime: &'a Runtime, cursor: DispatchCursor, name: Name) -> Self {
        Access {
            runtime,
            cursor,
            name,
        }
    }

    #[must_use]
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        self.cursor.instance()
    }

    /// The attribute being resolved.
    #[must_use]
    pub fn name(&self) -> Name {
        self.name
    }

    /// The type that supplied the running member.
    #[must_use]
    pub fn owner(&self) -> TypeId {
        self.cursor.current()
    }

    #[must_use]
    pub fn cursor(&self) -> &DispatchCursor {
        &self.cursor
    }

    /// Applies `op` to the next member bound to this name.
    ///
    /// # Errors
    ///
    /// [`Error::NoMoreInChain`] when no later type binds the name, or
    /// whatever the next member returns.
    pub fn dispatch_next(&self, op: Operation) -> Result<Value> {
        self.runtime.dispatch_next(&self.cursor, self.name.as_str(), op)
    }

    /// Reads through the next member.
    ///
    /// # Errors
    ///
    /// See [`Access::dispatch_next`].
    pub fn next_read(&self) -> Result<Value> {
        self.dispatch_next(Operation::Read)
    }

    /// Writes through the next member.
    ///
    /// # Errors
    ///
    /// See [`Access::dispatch_next`].
    pub fn next_write(&self, value: impl Into<Value>) -> Result<()> {
        self.dispatch_next(Operation::Write(value.into())).map(drop)
    }

    /// Deletes through the next member.
    ///
    /// # Errors
    ///
    /// See [`Access::dispatch_next`].
    pub fn next_delete(&self) -> Result<()> {
        self.dispatch_next(Operation::Delete).map(drop)
    }

    /// Calls the next method.
    ///
    /// # Errors
    ///
    /// See [`Access::dispatch_next`].
    pub fn next_call(&self, args: &[Value]) -> Result<Value> {
        self.dispatch_next(Operation::Call(args.to_vec()))
    }

    /// Reads another attribute of the same instance through the engine.
    ///
    /// # Errors
    ///
    /// See [`Runtime::read`].
    pub fn get(&self, name: &str) -> Result<Value> {
        self.runtime.read(self.instance(), name)
    }

    /// Writes another attribute of the same instance through the engine.
    ///
    /// # Errors
    ///
    /// See [`Runtime::write`].
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.runtime.write(self.instance(), name, value)
    }

    /// Reads the instance's store directly.
    #[must_use]
    pub fn store_get(&self, name: &str) -> Option<Value> {
        self.instance().store_get(Name::new(name))
    }

    /// Writes the instance's store directly.
    pub fn store_set(&self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.instance().store_insert(Name::new(name), value.into())
    }

    /// Removes an entry from the instance's store directly.
    pub fn store_remove(&self, name: &str) -> Option<Value> {
        self.instance().store_remove(Name::new(name))
    }

    /// The ordinary write of this name, ignoring fallback hooks.
    ///
    /// # Errors
    ///
    /// [`Error::NotWritable`] if a data member without `on_write` binds the
    /// name, or whatever its `on_write` returns.
    pub fn write_default(&self, value: impl Into<Value>) -> Result<()> {
        self.runtime
            .write_plain(self.instance(), self.cursor.order(), self.name, value.into())
    }

    /// The ordinary delete of this name, ignoring fallback hooks.
    ///
    /// # Errors
    ///
    /// [`Error::AttributeNotFound`] if nothing is stored, or whatever the
    /// member's `on_delete` returns.
    pub fn delete_default(&self) -> Result<()> {
        self.runtime
            .delete_plain(self.instance(), self.cursor.order(), self.name)
    }

    /// The error for "nothing resolved this name".
    #[must_use]
    pub fn not_found(&self) -> Error {
        Error::AttributeNotFound {
            ty: self.instance().type_name(),
            name: self.name,
        }
    }

    /// The error for a member refusing an operation.
    #[must_use]
    pub fn reject(&self, reason: impl Into<String>) -> Error {
        Error::Rejected {
            name: self.name,
            reason: reason.into(),
        }
    }
}
