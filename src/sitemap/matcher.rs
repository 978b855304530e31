//! Route matching: which node corresponds to a request's route values.
//!
//! Matching works over the node's attribute bag (controller, action, area
//! and anything else mirrored there), its declared must-match route values,
//! and the formal parameters of the target action. The rules, in order:
//! every declared route value must agree with the incoming set; every
//! incoming value must either agree with the node's attribute of the same
//! name or name an action parameter; an incoming value with no attribute
//! counterpart is request variance and is tolerated, except a non-empty
//! `area`, which always disqualifies a node outside that area.

use crate::node::SiteMapNode;
use crate::request::RequestContext;
use crate::route::{RouteHandle, RouteValues, text_equal_ci, value_is_unset, value_text};
use crate::sitemap::SiteMap;

/// Whether the incoming values honor the node's declared route value
/// constraints. Only keys present on both sides constrain; an incoming
/// key the node does not declare, or a declared key the request does not
/// supply, is no constraint at all.
pub fn compare_must_match_route_values(declared: &RouteValues, incoming: &RouteValues) -> bool {
    incoming.iter().all(|(key, got)| match declared.get(key) {
        Some(want) => text_equal_ci(&value_text(want), &value_text(got)),
        None => true,
    })
}

impl SiteMap {
    /// Whether `node` matches the incoming route values.
    ///
    /// `None` never matches; an empty value set matches everything.
    pub fn node_matches_route(&self, node: Option<&SiteMapNode>, values: &RouteValues) -> bool {
        let Some(node) = node else {
            return false;
        };
        if values.is_empty() {
            return true;
        }
        if !compare_must_match_route_values(&node.route_values, values) {
            return false;
        }

        // Action parameters are resolved lazily; most comparisons settle on
        // the attribute bag alone.
        let mut params: Option<Vec<String>> = None;
        for (key, value) in values {
            match node.attribute(key) {
                Some(attr) => {
                    if text_equal_ci(attr, &value_text(value)) {
                        continue;
                    }
                    if self.key_is_action_parameter(node, key, &mut params) {
                        continue;
                    }
                    return false;
                }
                None => {
                    if value_is_unset(value) {
                        continue;
                    }
                    // A request inside an area never matches a node that
                    // declares none.
                    if key == "area" {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn key_is_action_parameter(
        &self,
        node: &SiteMapNode,
        key: &str,
        params: &mut Option<Vec<String>>,
    ) -> bool {
        if node.dynamic {
            return true;
        }
        let params = params.get_or_insert_with(|| {
            self.resolver
                .action_parameters(&node.area, &node.controller, &node.action)
        });
        params.iter().any(|p| text_equal_ci(p, key))
    }

    /// Whether `node`'s route binding is compatible with the request's
    /// matched route. Unbound nodes are compatible with any request.
    pub(crate) fn route_binding_matches(
        &self,
        node: &SiteMapNode,
        route: Option<RouteHandle>,
    ) -> bool {
        match node.route.as_deref() {
            None => true,
            Some(name) => route.is_some() && self.routes.get(name) == route,
        }
    }

    /// Breadth-level search below `start` for a node matching `values`.
    ///
    /// Each level's own candidates are tried in child order before any
    /// grandchild, so the shallowest match wins. Only accessible nodes are
    /// visited.
    pub(crate) fn find_controller_action_node(
        &self,
        ctx: &mut RequestContext,
        start: &SiteMapNode,
        values: &RouteValues,
        route: Option<RouteHandle>,
    ) -> Option<SiteMapNode> {
        let children = self.get_child_nodes(ctx, start);
        for child in &children {
            if self.route_binding_matches(child, route)
                && self.node_matches_route(Some(child), values)
            {
                return Some(child.clone());
            }
        }
        for child in &children {
            if let Some(found) = self.find_controller_action_node(ctx, child, values, route) {
                return Some(found);
            }
        }
        None
    }
}
