//! Route registry and route value helpers.
//!
//! Nodes declare routes by *name*; requests carry the [`RouteHandle`] the
//! framework matched. A route-bound node is only a candidate for requests
//! whose handle resolves to the same registered route.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

/// Opaque reference to a registered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteHandle(u32);

/// Thread-safe name -> route registry shared between the host and the
/// site map.
#[derive(Debug, Default)]
pub struct RouteTable {
    names: RwLock<FxHashMap<String, RouteHandle>>,
    next: AtomicU32,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route name, returning its handle. Idempotent per name.
    pub fn register(&self, name: impl Into<String>) -> RouteHandle {
        let name = name.into();
        let mut names = self.names.write();
        if let Some(&handle) = names.get(&name) {
            return handle;
        }
        let handle = RouteHandle(self.next.fetch_add(1, Ordering::Relaxed));
        names.insert(name, handle);
        handle
    }

    /// Resolve a declared route name to its handle.
    pub fn get(&self, name: &str) -> Option<RouteHandle> {
        self.names.read().get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.read().is_empty()
    }
}

/// Ordered route values: controller, action, area, ids and friends.
///
/// Insertion order is preserved (`serde_json` with `preserve_order`), so
/// declared must-match constraints compare in authoring order.
pub type RouteValues = serde_json::Map<String, Value>;

/// Render a route value the way it would appear in a URL segment.
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Whether a value places no constraint on matching: `null` (the
/// optional-parameter sentinel) or the empty string.
pub fn value_is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Case-insensitive route value comparison.
pub(crate) fn text_equal_ci(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
