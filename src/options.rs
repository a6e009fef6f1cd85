//! Configuration options for binary encoding and decoding.
//!
//! This module provides:
//!
//! - [`BinaryOptions`]: per-call configuration handed to the `*_with_options`
//!   entry points
//! - [`Metadata`]: arbitrary read-only values made available to every
//!   container created during a pass
//!
//! ## Examples
//!
//! ```rust
//! use serde_lnt::{to_vec_with_options, BinaryOptions};
//!
//! let options = BinaryOptions::new().with_metadata("schema", "v2".to_string());
//! assert_eq!(
//!     options.metadata.get::<String>("schema").map(String::as_str),
//!     Some("v2")
//! );
//!
//! let bytes = to_vec_with_options(&[1u8, 2, 3], &options).unwrap();
//! assert!(!bytes.is_empty());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Read-only user values threaded through one encode or decode pass.
///
/// Values are type-erased and looked up by key and type. Cloning is cheap:
/// the map is shared behind an [`Arc`] and only copied when a clone is
/// modified.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::Metadata;
///
/// let mut metadata = Metadata::new();
/// metadata.insert("limit", 42u32);
///
/// assert_eq!(metadata.get::<u32>("limit"), Some(&42));
/// // Wrong type, no value
/// assert_eq!(metadata.get::<i64>("limit"), None);
/// ```
#[derive(Clone, Default)]
pub struct Metadata {
    entries: Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        Arc::make_mut(&mut self.entries).insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries
            .get(key)
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("Metadata").field("keys", &keys).finish()
    }
}

/// Configuration for one encode or decode call.
///
/// # Examples
///
/// ```rust
/// use serde_lnt::BinaryOptions;
///
/// let options = BinaryOptions::new()
///     .with_metadata("tenant", "acme".to_string())
///     .with_metadata("strict", true);
///
/// assert_eq!(options.metadata.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BinaryOptions {
    pub metadata: Metadata,
}

impl BinaryOptions {
    /// Creates default options with no metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one metadata value visible to every container of the pass.
    #[must_use]
    pub fn with_metadata<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.metadata.insert(key, value);
        self
    }

    /// Replaces the whole metadata map.
    #[must_use]
    pub fn with_metadata_map(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}
