//! Per-request query context.
//!
//! One context per inbound request. It carries the request's route
//! information plus the two request-scoped caches: the accessibility memo
//! and the resolved current node. A context is owned by exactly one
//! request's execution and needs no synchronization.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::core::UrlPath;
use crate::node::{NodeId, SiteMapNode};
use crate::route::{RouteHandle, RouteValues};

#[derive(Debug, Default)]
pub struct RequestContext {
    /// Normalized virtual path of the request.
    pub(crate) path: Option<UrlPath>,
    /// Raw request URL as received; the context-only fallback lookup.
    pub(crate) raw_url: String,
    /// The route the framework matched for this request.
    pub(crate) route: Option<RouteHandle>,
    /// Route values extracted from the request.
    pub(crate) route_values: RouteValues,
    /// Per-request accessibility memo (node -> allowed).
    pub(crate) acl_cache: FxHashMap<NodeId, bool>,
    /// Current-node resolution, computed at most once per request.
    /// Outer `None` means "not yet resolved".
    pub(crate) current_node: Option<Option<SiteMapNode>>,
}

impl RequestContext {
    /// Context for a request to `url`, which also serves as the raw
    /// fallback URL unless overridden with [`RequestContext::with_raw_url`].
    pub fn new(url: &str) -> Self {
        Self {
            path: UrlPath::from_request(url),
            raw_url: url.to_string(),
            ..Default::default()
        }
    }

    /// Attach the route the framework matched.
    pub fn with_route(mut self, route: RouteHandle) -> Self {
        self.route = Some(route);
        self
    }

    /// Replace the full route value set.
    pub fn with_route_values(mut self, values: RouteValues) -> Self {
        self.route_values = values;
        self
    }

    /// Add a single route value.
    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    /// Override the raw fallback URL when it differs from the virtual path.
    pub fn with_raw_url(mut self, raw: &str) -> Self {
        self.raw_url = raw.to_string();
        self
    }

    pub fn route(&self) -> Option<RouteHandle> {
        self.route
    }

    pub fn route_values(&self) -> &RouteValues {
        &self.route_values
    }

    /// Number of distinct nodes with a memoized accessibility verdict.
    pub fn acl_cache_len(&self) -> usize {
        self.acl_cache.len()
    }
}
