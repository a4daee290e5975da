//! Resolution engine: read, write, delete and call on instances.
//!
//! Every operation starts from the resolution order of the instance's actual
//! type and the first member bound to the name in that order.
//!
//! # Read
//!
//! 1. Data resolver: its `on_read`, or [`Error::NotReadable`]
//! 2. Non-data member: the stored value if present, else the member's read
//!    (a method yields [`Error::NotReadable`])
//! 3. No member: the stored value, else the first fallback hook's read,
//!    else [`Error::AttributeNotFound`]
//!
//! # Write and Delete
//!
//! A fallback hook in the order intercepts every write and delete. Without
//! one (or through [`Access::write_default`]) the plain rules apply: a data
//! resolver handles the name, anything else goes to the store.
//!
//! # Call
//!
//! A method is invoked with a cursor at its owner. A stored value shadowing
//! the name, or a resolver bound to it, is not callable. With no member the
//! fallback hook's call runs.
//!
//! Store locks are never held while a member runs.

use crate::dispatch::{Access, DispatchCursor, Operation};
use crate::error::{Error, Result};
use crate::graph::TypeId;
use crate::instance::Instance;
use crate::linearize::ResolutionOrder;
use crate::name::Name;
use crate::registry::Found;
use crate::resolver::Member;
use crate::runtime::Runtime;
use crate::value::Value;

impl Runtime {
    /// Reads `name` on `instance`.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNotFound`] if nothing resolves the name
    /// - [`Error::NotReadable`] if the bound member cannot be read
    /// - [`Error::Linearization`] if the instance's hierarchy is inconsistent
    /// - anything a resolver or fallback hook returns
    pub fn read(&self, instance: &Instance, name: &str) -> Result<Value> {
        let name = Name::new(name);
        let order = self.order_for(instance)?;

        match self.registry.lookup(&order, name) {
            Some(found) if found.member.is_data() => {
                tracing::trace!(%name, owner = %found.owner, "read via data member");
                self.apply(instance, &order, name, found, Operation::Read)
            }
            Some(found) => {
                if let Some(value) = instance.store_get(name) {
                    tracing::trace!(%name, "read shadowed by store");
                    return Ok(value);
                }
                tracing::trace!(%name, owner = %found.owner, "read via non-data member");
                self.apply(instance, &order, name, found, Operation::Read)
            }
            None => {
                if let Some(value) = instance.store_get(name) {
                    tracing::trace!(%name, "read from store");
                    return Ok(value);
                }
                match self.registry.fallback(&order) {
                    Some(fallback) => {
                        tracing::trace!(%name, owner = %fallback.owner, "read via fallback");
                        let access = self.access(instance, &order, fallback.index, name);
                        fallback.hook.read(&access)
                    }
                    None => Err(Error::AttributeNotFound {
                        ty: instance.type_name(),
                        name,
                    }),
                }
            }
        }
    }

    /// Writes `value` to `name` on `instance`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotWritable`] if a data member without `on_write` binds
    ///   the name
    /// - anything a resolver or fallback hook returns
    pub fn write(&self, instance: &Instance, name: &str, value: impl Into<Value>) -> Result<()> {
        let name = Name::new(name);
        let value = value.into();
        let order = self.order_for(instance)?;

        if let Some(fallback) = self.registry.fallback(&order) {
            tracing::trace!(%name, owner = %fallback.owner, "write via fallback");
            let access = self.access(instance, &order, fallback.index, name);
            return fallback.hook.write(&access, value);
        }
        self.write_plain(instance, &order, name, value)
    }

    /// Deletes `name` on `instance`.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNotFound`] if nothing is stored under the name
    /// - [`Error::Undeletable`] if the bound resolver refuses deletion
    /// - anything a resolver or fallback hook returns
    pub fn delete(&self, instance: &Instance, name: &str) -> Result<()> {
        let name = Name::new(name);
        let order = self.order_for(instance)?;

        if let Some(fallback) = self.registry.fallback(&order) {
            tracing::trace!(%name, owner = %fallback.owner, "delete via fallback");
            let access = self.access(instance, &order, fallback.index, name);
            return fallback.hook.delete(&access);
        }
        self.delete_plain(instance, &order, name)
    }

    /// Calls the method bound to `name` on `instance`.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNotFound`] if nothing resolves the name
    /// - [`Error::NotCallable`] if a stored value or a resolver holds the
    ///   name
    /// - anything the method or fallback hook returns
    pub fn call(&self, instance: &Instance, name: &str, args: &[Value]) -> Result<Value> {
        let name = Name::new(name);
        let order = self.order_for(instance)?;

        match self.registry.lookup(&order, name) {
            Some(found)
                if matches!(found.member, Member::Method(_)) && !instance.store_contains(name) =>
            {
                tracing::trace!(%name, owner = %found.owner, "call");
                self.apply(instance, &order, name, found, Operation::Call(args.to_vec()))
            }
            Some(_) => Err(Error::NotCallable { name }),
            None if instance.store_contains(name) => Err(Error::NotCallable { name }),
            None => match self.registry.fallback(&order) {
                Some(fallback) => {
                    tracing::trace!(%name, owner = %fallback.owner, "call via fallback");
                    let access = self.access(instance, &order, fallback.index, name);
                    fallback.hook.call(&access, args)
                }
                None => Err(Error::AttributeNotFound {
                    ty: instance.type_name(),
                    name,
                }),
            },
        }
    }

    /// Applies `op` to the next member after `cursor` bound to `name`.
    ///
    /// # Errors
    ///
    /// - [`Error::NoMoreInChain`] if no later type binds the name
    /// - [`Error::NotReadable`], [`Error::NotWritable`],
    ///   [`Error::NotDeletable`] or [`Error::NotCallable`] if the next member
    ///   lacks the operation
    /// - anything the next member returns
    pub fn dispatch_next(&self, cursor: &DispatchCursor, name: &str, op: Operation) -> Result<Value> {
        let name = Name::new(name);
        let order = cursor.order();

        let Some(found) = self.registry.lookup_from(order, cursor.index() + 1, name) else {
            return Err(Error::NoMoreInChain {
                name,
                after: self.graph.name_of(cursor.current())?,
            });
        };

        tracing::trace!(
            %name,
            from = %cursor.current(),
            to = %found.owner,
            op = op.as_str(),
            "dispatch next"
        );
        self.apply(cursor.instance(), order, name, found, op)
    }

    /// A cursor positioned at `ty` in the order of `instance`'s actual type.
    ///
    /// Dispatching from it continues with the types after `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInOrder`] if `ty` is not an ancestor of the
    /// instance's type.
    pub fn cursor_at(&self, instance: &Instance, ty: TypeId) -> Result<DispatchCursor> {
        let order = self.order_for(instance)?;
        let index = self.position_in(instance, &order, ty)?;
        Ok(DispatchCursor::new(instance.clone(), order, index))
    }

    /// Calls the method attached exactly on `ty`, bypassing the order.
    ///
    /// The method still receives a cursor at `ty` within the instance's
    /// order. Naming a fixed ancestor this way from several overrides in a
    /// diamond runs the shared base once per path.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNotFound`] if `ty` itself binds nothing to `name`
    /// - [`Error::NotCallable`] if `ty` binds a resolver to `name`
    /// - [`Error::NotInOrder`] if `ty` is not an ancestor of the instance's
    ///   type
    pub fn invoke_on(
        &self,
        ty: TypeId,
        instance: &Instance,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let name = Name::new(name);
        let Some(member) = self.registry.member(ty, name) else {
            return Err(Error::AttributeNotFound {
                ty: self.graph.name_of(ty)?,
                name,
            });
        };

        let order = self.order_for(instance)?;
        let index = self.position_in(instance, &order, ty)?;
        tracing::trace!(%name, owner = %ty, "invoke on fixed type");

        let found = Found {
            index,
            owner: ty,
            member,
        };
        self.apply(instance, &order, name, found, Operation::Call(args.to_vec()))
    }

    /// The write rules without fallback hooks.
    pub(crate) fn write_plain(
        &self,
        instance: &Instance,
        order: &ResolutionOrder,
        name: Name,
        value: Value,
    ) -> Result<()> {
        match self.registry.lookup(order, name) {
            Some(found) if found.member.is_data() => {
                tracing::trace!(%name, owner = %found.owner, "write via data member");
                self.apply(instance, order, name, found, Operation::Write(value))
                    .map(drop)
            }
            _ => {
                tracing::trace!(%name, "write to store");
                instance.store_insert(name, value);
                Ok(())
            }
        }
    }

    /// The delete rules without fallback hooks.
    pub(crate) fn delete_plain(
        &self,
        instance: &Instance,
        order: &ResolutionOrder,
        name: Name,
    ) -> Result<()> {
        let deleter = self.registry.lookup(order, name).filter(|found| {
            matches!(&found.member, Member::Resolver(resolver) if resolver.can_delete())
        });
        if let Some(found) = deleter {
            tracing::trace!(%name, owner = %found.owner, "delete via resolver");
            return self
                .apply(instance, order, name, found, Operation::Delete)
                .map(drop);
        }

        match instance.store_remove(name) {
            Some(_) => {
                tracing::trace!(%name, "deleted from store");
                Ok(())
            }
            None => Err(Error::AttributeNotFound {
                ty: instance.type_name(),
                name,
            }),
        }
    }

    /// Runs `op` on a found member with a cursor at its position.
    fn apply(
        &self,
        instance: &Instance,
        order: &ResolutionOrder,
        name: Name,
        found: Found,
        op: Operation,
    ) -> Result<Value> {
        let access = self.access(instance, order, found.index, name);
        match (found.member, op) {
            (Member::Resolver(resolver), Operation::Read) => resolver.read(&access),
            (Member::Resolver(resolver), Operation::Write(value)) => resolver
                .write(&access, value)
                .map(|()| Value::None),
            (Member::Resolver(resolver), Operation::Delete) => {
                resolver.delete(&access).map(|()| Value::None)
            }
            (Member::Resolver(_), Operation::Call(_)) => Err(Error::NotCallable { name }),
            (Member::Method(method), Operation::Call(args)) => method.invoke(&access, &args),
            (Member::Method(_), Operation::Read) => Err(Error::NotReadable { name }),
            (Member::Method(_), Operation::Write(_)) => Err(Error::NotWritable { name }),
            (Member::Method(_), Operation::Delete) => Err(Error::NotDeletable { name }),
        }
    }

    fn access(
        &self,
        instance: &Instance,
        order: &ResolutionOrder,
        index: usize,
        name: Name,
    ) -> Access<'_> {
        Access::new(
            self,
            DispatchCursor::new(instance.clone(), order.clone(), index),
            name,
        )
    }

    fn order_for(&self, instance: &Instance) -> Result<ResolutionOrder> {
        self.linearizer.order_of(&self.graph, instance.type_id())
    }

    fn position_in(&self, instance: &Instance, order: &ResolutionOrder, ty: TypeId) -> Result<usize> {
        order.position(ty).ok_or_else(|| Error::NotInOrder {
            ty: self
                .graph
                .name_of(ty)
                .unwrap_or_else(|_| Name::new(&ty.to_string())),
            actual: instance.type_name(),
        })
    }
}
