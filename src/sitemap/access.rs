//! Accessibility gate with per-request memoization.
//!
//! Every node leaving a query method passes through [`SiteMap::is_accessible`]
//! first. Verdicts are memoized in the request context, so the ACL
//! collaborator is consulted at most once per (request, node) pair.

use crate::node::SiteMapNode;
use crate::request::RequestContext;
use crate::sitemap::SiteMap;

/// Per-node authorization check for the current request.
///
/// Called outside the site map's locks; implementations may query the map
/// freely, but a verdict must not depend on tree structure or it can go
/// stale in the memo.
pub trait AclModule: Send + Sync {
    fn is_accessible(&self, map: &SiteMap, ctx: &RequestContext, node: &SiteMapNode) -> bool;
}

impl<F> AclModule for F
where
    F: Fn(&SiteMap, &RequestContext, &SiteMapNode) -> bool + Send + Sync,
{
    fn is_accessible(&self, map: &SiteMap, ctx: &RequestContext, node: &SiteMapNode) -> bool {
        self(map, ctx, node)
    }
}

impl SiteMap {
    /// Whether `node` is visible to the request behind `ctx`.
    ///
    /// Always `true` while security trimming is disabled. Nodes without an
    /// arena handle are delegated uncached; they have no stable identity to
    /// memo under.
    pub fn is_accessible(&self, ctx: &mut RequestContext, node: &SiteMapNode) -> bool {
        if !self.security_trimming_enabled() {
            return true;
        }
        let Some(id) = node.id else {
            return self.acl.is_accessible(self, ctx, node);
        };
        if let Some(&verdict) = ctx.acl_cache.get(&id) {
            return verdict;
        }
        let verdict = self.acl.is_accessible(self, &*ctx, node);
        ctx.acl_cache.insert(id, verdict);
        verdict
    }

    /// Gate helper for the query paths: the node if visible, else `None`.
    pub(crate) fn return_if_accessible(
        &self,
        ctx: &mut RequestContext,
        node: SiteMapNode,
    ) -> Option<SiteMapNode> {
        if self.is_accessible(ctx, &node) {
            Some(node)
        } else {
            None
        }
    }
}
