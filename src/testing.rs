//! Shared collaborators for the test suite: permissive defaults plus
//! counting variants for asserting delegate call counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::node::SiteMapNode;
use crate::request::RequestContext;
use crate::route::RouteTable;
use crate::sitemap::{AclModule, ActionParameterResolver, SiteMap, SiteMapBuilder};

pub(crate) fn allow_all(_: &SiteMap, _: &RequestContext, _: &SiteMapNode) -> bool {
    true
}

pub(crate) fn no_parameters(_: &str, _: &str, _: &str) -> Vec<String> {
    Vec::new()
}

/// Builder that adds a single root node keyed `root` at `/`.
pub(crate) fn empty_builder(
    map: &SiteMap,
    _existing: Option<SiteMapNode>,
) -> anyhow::Result<SiteMapNode> {
    map.add_node(SiteMapNode::new("root").with_url("/"), None)
        .map_err(anyhow::Error::from)
}

/// Map with allow-all access and parameterless actions.
pub(crate) fn permissive_map() -> SiteMap {
    SiteMap::new(
        empty_builder,
        allow_all,
        no_parameters,
        Arc::new(RouteTable::new()),
    )
}

pub(crate) fn open_map(builder: impl SiteMapBuilder + 'static) -> SiteMap {
    SiteMap::new(
        builder,
        allow_all,
        no_parameters,
        Arc::new(RouteTable::new()),
    )
}

pub(crate) fn map_with_acl(acl: impl AclModule + 'static) -> SiteMap {
    SiteMap::new(
        empty_builder,
        acl,
        no_parameters,
        Arc::new(RouteTable::new()),
    )
}

pub(crate) fn map_with_resolver(resolver: impl ActionParameterResolver + 'static) -> SiteMap {
    SiteMap::new(
        empty_builder,
        allow_all,
        resolver,
        Arc::new(RouteTable::new()),
    )
}

/// ACL module that counts delegate invocations before applying `verdict`.
pub(crate) fn counting_acl(
    calls: Arc<AtomicUsize>,
    verdict: impl Fn(&SiteMapNode) -> bool + Send + Sync + 'static,
) -> impl AclModule {
    move |_: &SiteMap, _: &RequestContext, node: &SiteMapNode| {
        calls.fetch_add(1, Ordering::SeqCst);
        verdict(node)
    }
}
