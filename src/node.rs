//! Navigation node record.

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::core::UrlPath;
use crate::route::RouteValues;

/// Handle into the site map's arena storage.
///
/// Assigned when a node is inserted. Stale handles (the node was removed
/// since the clone was taken) re-resolve by key at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub(crate) u32);

/// A single navigable entry in the site tree.
///
/// Identity is the `key`: two instances with equal keys refer to the same
/// logical node even when one carries a stale arena handle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteMapNode {
    /// Arena handle, set on insert.
    #[serde(skip)]
    pub(crate) id: Option<NodeId>,
    /// Globally unique, caller-assigned identity.
    pub key: String,
    /// Normalized URL; `None` for nodes reachable only by route matching.
    pub url: Option<UrlPath>,
    /// Name of the registered route this node is bound to, if any.
    pub route: Option<String>,
    pub controller: String,
    pub action: String,
    pub area: String,
    /// Declared must-match route constraints (ordered).
    pub route_values: RouteValues,
    /// Attribute bag; the route-value fallback source during matching.
    pub attributes: FxHashMap<String, String>,
    /// Dynamic nodes skip action-parameter resolution during matching.
    pub dynamic: bool,
}

impl SiteMapNode {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the node URL. Empty input leaves the node URL-less; external
    /// and app-relative URLs are normalized by [`UrlPath::from_authored`].
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = UrlPath::from_authored(url);
        self
    }

    /// Bind this node to a registered route by name.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set controller and action, mirroring them into the attribute bag so
    /// they participate in route matching.
    pub fn with_controller_action(
        mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        self.controller = controller.into();
        self.action = action.into();
        self.attributes
            .insert("controller".to_string(), self.controller.clone());
        self.attributes
            .insert("action".to_string(), self.action.clone());
        self
    }

    /// Set the area, mirrored into the attribute bag.
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = area.into();
        self.attributes.insert("area".to_string(), self.area.clone());
        self
    }

    /// Declare a must-match route value constraint.
    pub fn with_route_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.route_values.insert(key.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Mark the node dynamic: it is assumed to match any parameter shape.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Arena handle, if this instance has been inserted.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Attribute value, treating empty strings as absent.
    pub(crate) fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl PartialEq for SiteMapNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SiteMapNode {}
