//! Runtime configuration.

/// Default prefix marking names a forwarding proxy keeps for itself.
pub const DEFAULT_RESERVED_PREFIX: &str = "_";

/// Default bound on nested forwarding before a loop is reported.
pub const DEFAULT_MAX_FORWARDING_DEPTH: u32 = 32;

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// # Example
///
/// ```rust
/// use oxidex_attr::{Runtime, RuntimeConfig};
///
/// let config = RuntimeConfig::default()
///     .with_reserved_prefix("__")
///     .with_max_forwarding_depth(8);
/// let runtime = Runtime::with_config(config);
///
/// assert_eq!(runtime.config().reserved_prefix(), "__");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    reserved_prefix: String,
    max_forwarding_depth: u32,
    cache_lookups: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
            max_forwarding_depth: DEFAULT_MAX_FORWARDING_DEPTH,
            cache_lookups: true,
        }
    }
}

impl RuntimeConfig {
    /// Prefix of names a forwarding proxy never forwards.
    #[must_use]
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    /// Nested forwards allowed before [`Error::ForwardingLoop`](crate::Error::ForwardingLoop).
    #[must_use]
    pub fn with_max_forwarding_depth(mut self, depth: u32) -> Self {
        self.max_forwarding_depth = depth;
        self
    }

    /// Enables or disables the (type, name) lookup cache.
    #[must_use]
    pub fn with_lookup_cache(mut self, enabled: bool) -> Self {
        self.cache_lookups = enabled;
        self
    }

    #[must_use]
    pub fn reserved_prefix(&self) -> &str {
        &self.reserved_prefix
    }

    #[must_use]
    pub fn max_forwarding_depth(&self) -> u32 {
        self.max_forwarding_depth
    }

    #[must_use]
    pub fn cache_lookups(&self) -> bool {
        self.cache_lookups
    }
}
