//! Query surface: lookups, traversal, current-node resolution, hints.
//!
//! Every method takes the request context and returns only nodes that pass
//! the accessibility gate. Index reads clone their results out before the
//! gate runs, so the ACL collaborator never executes under the tree lock.

use serde_json::Value;

use crate::core::UrlPath;
use crate::error::{Result, SiteMapError};
use crate::node::SiteMapNode;
use crate::request::RequestContext;
use crate::route::RouteValues;
use crate::sitemap::SiteMap;

impl SiteMap {
    /// Look up a node by request URL.
    pub fn find_site_map_node(&self, ctx: &mut RequestContext, url: &str) -> Option<SiteMapNode> {
        let node = self.lookup_by_url(url)?;
        self.return_if_accessible(ctx, node)
    }

    /// Look up a node by key.
    ///
    /// The key is first tried as a URL; only when that misses does the key
    /// index answer. A key that happens to collide with another node's URL
    /// therefore resolves to the URL owner.
    pub fn find_site_map_node_from_key(
        &self,
        ctx: &mut RequestContext,
        key: &str,
    ) -> Option<SiteMapNode> {
        let node = match self.lookup_by_url(key) {
            Some(node) => node,
            None => {
                let index = self.index.read();
                let id = index.by_key(key)?;
                index.node(id).cloned()?
            }
        };
        self.return_if_accessible(ctx, node)
    }

    /// Accessible children of `node`, in insertion order.
    pub fn get_child_nodes(&self, ctx: &mut RequestContext, node: &SiteMapNode) -> Vec<SiteMapNode> {
        let children: Vec<SiteMapNode> = {
            let index = self.index.read();
            let Some(id) = index.resolve(node) else {
                return Vec::new();
            };
            index
                .children(id)
                .iter()
                .filter_map(|&child| index.node(child).cloned())
                .collect()
        };
        children
            .into_iter()
            .filter(|child| self.is_accessible(ctx, child))
            .collect()
    }

    /// Accessible parent of `node`, if any.
    pub fn get_parent_node(&self, ctx: &mut RequestContext, node: &SiteMapNode) -> Option<SiteMapNode> {
        let parent = {
            let index = self.index.read();
            let id = index.resolve(node)?;
            let pid = index.parent(id)?;
            index.node(pid).cloned()?
        };
        self.return_if_accessible(ctx, parent)
    }

    /// The tree root, if built and accessible.
    pub fn root_node(&self, ctx: &mut RequestContext) -> Option<SiteMapNode> {
        let root = self.root_unchecked()?;
        self.return_if_accessible(ctx, root)
    }

    /// The node corresponding to the request, resolved at most once per
    /// context. Subsequent calls on the same context return the memoized
    /// answer, including a memoized miss.
    pub fn current_node(&self, ctx: &mut RequestContext) -> Option<SiteMapNode> {
        if let Some(cached) = ctx.current_node.as_ref() {
            return cached.clone();
        }
        let resolved = self.find_site_map_node_from_context(ctx);
        ctx.current_node = Some(resolved.clone());
        resolved
    }

    /// Resolve the request context to a node, bypassing the current-node
    /// memo. The result still passes the accessibility gate.
    pub fn find_site_map_node_from_context(
        &self,
        ctx: &mut RequestContext,
    ) -> Option<SiteMapNode> {
        let node = self.resolve_current_node(ctx)?;
        self.return_if_accessible(ctx, node)
    }

    /// The resolution ladder for a request context.
    ///
    /// Without route data this is a plain URL lookup (virtual path, then
    /// raw URL). With route data: a URL hit wins if its route binding is
    /// compatible with the request's matched route; otherwise the root is
    /// tried against the route values, then the tree below it, and the raw
    /// URL is the last resort.
    fn resolve_current_node(&self, ctx: &mut RequestContext) -> Option<SiteMapNode> {
        let route = ctx.route();
        let has_route_data = route.is_some() || !ctx.route_values.is_empty();
        let path = ctx.path.clone();

        if !has_route_data {
            return path
                .and_then(|p| self.lookup_by_url_path(&p))
                .or_else(|| self.lookup_by_url(&ctx.raw_url));
        }

        // Route-value matching treats a missing area as the empty area.
        let mut values: RouteValues = ctx.route_values.clone();
        values
            .entry("area".to_string())
            .or_insert(Value::String(String::new()));

        let mut node = path
            .and_then(|p| self.lookup_by_url_path(&p))
            .filter(|n| self.route_binding_matches(n, route));

        if node.is_none()
            && let Some(root) = self.root_unchecked()
        {
            node = if self.route_binding_matches(&root, route)
                && self.node_matches_route(Some(&root), &values)
            {
                Some(root)
            } else {
                self.find_controller_action_node(ctx, &root, &values, route)
            };
        }

        node.or_else(|| {
            self.lookup_by_url(&ctx.raw_url)
                .filter(|n| self.route_binding_matches(n, route))
        })
    }

    fn lookup_by_url(&self, url: &str) -> Option<SiteMapNode> {
        let path = UrlPath::from_request(url)?;
        self.lookup_by_url_path(&path)
    }

    fn lookup_by_url_path(&self, path: &UrlPath) -> Option<SiteMapNode> {
        let index = self.index.read();
        let id = index.by_url_key(&path.index_key())?;
        index.node(id).cloned()
    }

    // ========================================================================
    // Hints
    //
    // The hint operations exist for interface parity with tiered providers
    // that prefetch node neighborhoods. This implementation holds the whole
    // tree in memory, so they only validate their arguments.
    // ========================================================================

    /// Current node after announcing interest in `up_level` ancestors.
    /// `up_level` of `-1` means unbounded.
    pub fn get_current_node_and_hint_ancestor_nodes(
        &self,
        ctx: &mut RequestContext,
        up_level: i32,
    ) -> Result<Option<SiteMapNode>> {
        check_hint_level(up_level)?;
        Ok(self.current_node(ctx))
    }

    /// Current node after announcing interest in the surrounding
    /// neighborhood. Either level may be `-1` for unbounded.
    pub fn get_current_node_and_hint_neighborhood_nodes(
        &self,
        ctx: &mut RequestContext,
        up_level: i32,
        down_level: i32,
    ) -> Result<Option<SiteMapNode>> {
        check_hint_level(up_level)?;
        check_hint_level(down_level)?;
        Ok(self.current_node(ctx))
    }

    /// Ancestor `walkup_levels` above the current node, hinting that
    /// `relative_depth_from_walkup` levels below it will be visited.
    pub fn get_parent_node_relative_to_current_node_and_hint_down_from_parent(
        &self,
        ctx: &mut RequestContext,
        walkup_levels: i32,
        relative_depth_from_walkup: i32,
    ) -> Result<Option<SiteMapNode>> {
        check_walk_level(walkup_levels)?;
        check_walk_level(relative_depth_from_walkup)?;
        let Some(current) = self.current_node(ctx) else {
            return Ok(None);
        };
        Ok(self.walk_up(ctx, current, walkup_levels))
    }

    /// Ancestor `walkup_levels` above `node`, with the same hint semantics.
    pub fn get_parent_node_relative_to_node_and_hint_down_from_parent(
        &self,
        ctx: &mut RequestContext,
        node: &SiteMapNode,
        walkup_levels: i32,
        relative_depth_from_walkup: i32,
    ) -> Result<Option<SiteMapNode>> {
        check_walk_level(walkup_levels)?;
        check_walk_level(relative_depth_from_walkup)?;
        Ok(self.walk_up(ctx, node.clone(), walkup_levels))
    }

    /// Announce interest in ancestors of `node`. Validation only.
    pub fn hint_ancestor_nodes(&self, _node: &SiteMapNode, up_level: i32) -> Result<()> {
        check_hint_level(up_level)
    }

    /// Announce interest in the neighborhood of `node`. Validation only.
    pub fn hint_neighborhood_nodes(
        &self,
        _node: &SiteMapNode,
        up_level: i32,
        down_level: i32,
    ) -> Result<()> {
        check_hint_level(up_level)?;
        check_hint_level(down_level)
    }

    /// Climb `levels` accessible parents; `None` when the walk runs off
    /// the root.
    fn walk_up(
        &self,
        ctx: &mut RequestContext,
        start: SiteMapNode,
        levels: i32,
    ) -> Option<SiteMapNode> {
        let mut node = start;
        for _ in 0..levels {
            node = self.get_parent_node(ctx, &node)?;
        }
        self.return_if_accessible(ctx, node)
    }
}

fn check_hint_level(level: i32) -> Result<()> {
    if level < -1 {
        return Err(SiteMapError::HintLevelOutOfRange(level));
    }
    Ok(())
}

fn check_walk_level(level: i32) -> Result<()> {
    if level < 0 {
        return Err(SiteMapError::HintLevelOutOfRange(level));
    }
    Ok(())
}
