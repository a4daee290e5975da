//! Error types for the `OxideX` attribute runtime.
//!
//! Every failure surfaces as a typed [`Error`] returned to the immediate
//! caller. Errors fall into three families, see [`ErrorCategory`]:
//!
//! - **Structural** errors are raised while the type graph or the registry is
//!   being built, and are never auto-corrected.
//! - **Resolution** errors are raised by read/write/delete/call and are
//!   recoverable by the caller (for example by substituting a default).
//! - **Dispatch** errors describe the state of a cooperative chain.

use crate::name::Name;
use crate::value::ValueKind;
use thiserror::Error;

/// Errors that can occur in the attribute runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A declared parent has not been declared itself.
    #[error("Unknown parent type '{parent}' while declaring '{ty}'")]
    UnknownParent {
        /// The type being declared.
        ty: Name,
        /// The missing parent.
        parent: Name,
    },

    /// A type id or name does not belong to this runtime.
    #[error("Unknown type '{ty}'")]
    UnknownType {
        /// Name (or rendered id) of the unknown type.
        ty: String,
    },

    /// A type with this name already exists in the graph.
    #[error("Type '{ty}' is already declared")]
    DuplicateType {
        /// The duplicated name.
        ty: Name,
    },

    /// The same parent was listed twice in one declaration.
    #[error("Duplicate parent '{parent}' in declaration of '{ty}'")]
    DuplicateParent {
        /// The type being declared.
        ty: Name,
        /// The repeated parent.
        parent: Name,
    },

    /// The graph was mutated after a resolution order was published.
    #[error("Type graph is frozen; cannot declare '{ty}'")]
    FrozenGraph {
        /// The type whose declaration was rejected.
        ty: Name,
    },

    /// No consistent resolution order exists for this type.
    #[error("Cannot linearize '{ty}': inconsistent order among {}", conflicting.join(", "))]
    Linearization {
        /// The type whose order was requested.
        ty: Name,
        /// Heads of the lists that could not be merged.
        conflicting: Vec<String>,
    },

    /// A member is already attached for this (type, name) pair.
    #[error("'{ty}' already has a member named '{name}'")]
    AlreadyAttached {
        /// Owning type.
        ty: Name,
        /// Attribute name.
        name: Name,
    },

    /// Nothing resolved the attribute.
    #[error("'{ty}' object has no attribute '{name}'")]
    AttributeNotFound {
        /// Actual type of the instance.
        ty: Name,
        /// Attribute name.
        name: Name,
    },

    /// The resolved member does not support reads.
    #[error("Attribute '{name}' is not readable")]
    NotReadable {
        /// Attribute name.
        name: Name,
    },

    /// The resolved member does not support writes.
    #[error("Attribute '{name}' is not writable")]
    NotWritable {
        /// Attribute name.
        name: Name,
    },

    /// The resolved member does not support deletion.
    #[error("Attribute '{name}' has no deleter")]
    NotDeletable {
        /// Attribute name.
        name: Name,
    },

    /// The resolved member refuses deletion as a matter of policy.
    #[error("Attribute '{name}' cannot be deleted")]
    Undeletable {
        /// Attribute name.
        name: Name,
    },

    /// The resolved member is not a method.
    #[error("Attribute '{name}' is not callable")]
    NotCallable {
        /// Attribute name.
        name: Name,
    },

    /// A typed member received a value of the wrong kind.
    #[error("Attribute '{name}' expected {expected}, got {found}")]
    TypeMismatch {
        /// Attribute name.
        name: Name,
        /// Kind the member accepts.
        expected: ValueKind,
        /// Kind that was supplied.
        found: ValueKind,
    },

    /// A resolver rejected the operation for its own reasons.
    #[error("Attribute '{name}' rejected the operation: {reason}")]
    Rejected {
        /// Attribute name.
        name: Name,
        /// Human-readable reason.
        reason: String,
    },

    /// Cooperative dispatch ran past the last implementation.
    #[error("No more implementations of '{name}' after '{after}'")]
    NoMoreInChain {
        /// Attribute name.
        name: Name,
        /// Type at which the search started.
        after: Name,
    },

    /// A cursor was requested at a type absent from the instance's order.
    #[error("'{ty}' is not in the resolution order of '{actual}'")]
    NotInOrder {
        /// Requested type.
        ty: Name,
        /// Actual type of the instance.
        actual: Name,
    },

    /// Forwarding exceeded the configured depth.
    #[error("Forwarding loop detected for '{name}' at depth {depth}")]
    ForwardingLoop {
        /// Attribute name.
        name: Name,
        /// Depth at which the loop was detected.
        depth: u32,
    },
}

/// Broad family of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised while building the graph or registry.
    Structural,
    /// Raised by an attribute operation.
    Resolution,
    /// Raised by cooperative dispatch or forwarding.
    Dispatch,
}

impl Error {
    /// Returns the family this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownParent { .. }
            | Error::UnknownType { .. }
            | Error::DuplicateType { .. }
            | Error::DuplicateParent { .. }
            | Error::FrozenGraph { .. }
            | Error::Linearization { .. }
            | Error::AlreadyAttached { .. } => ErrorCategory::Structural,
            Error::AttributeNotFound { .. }
            | Error::NotReadable { .. }
            | Error::NotWritable { .. }
            | Error::NotDeletable { .. }
            | Error::Undeletable { .. }
            | Error::NotCallable { .. }
            | Error::TypeMismatch { .. }
            | Error::Rejected { .. } => ErrorCategory::Resolution,
            Error::NoMoreInChain { .. }
            | Error::NotInOrder { .. }
            | Error::ForwardingLoop { .. } => ErrorCategory::Dispatch,
        }
    }

    /// Returns true when a cooperative chain simply ran out.
    ///
    /// A terminal implementation calling `dispatch_next` treats this as a
    /// normal stop and propagates everything else.
    #[must_use]
    pub const fn is_chain_end(&self) -> bool {
        matches!(self, Error::NoMoreInChain { .. })
    }

    /// Returns true when nothing resolved an attribute.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::AttributeNotFound { .. })
    }
}

/// Result type for attribute runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
