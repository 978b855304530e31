//! Concurrently-accessed navigation tree for MVC-style applications.
//!
//! A [`SiteMap`] holds the full node tree of a site behind a reader-writer
//! lock and answers per-request questions about it: which node a URL maps
//! to, which node the current request's route values resolve to, what a
//! node's accessible parent and children are. Three collaborator traits
//! plug the host application in: [`SiteMapBuilder`] constructs the tree on
//! first access, [`AclModule`] decides per-request node visibility when
//! security trimming is enabled, and [`ActionParameterResolver`] supplies
//! the action parameter names route matching tolerates.
//!
//! Request-scoped state lives in an explicit [`RequestContext`] owned by
//! the caller: the accessibility memo and the resolved current node, both
//! computed at most once per context.

mod core;
mod error;
pub mod logger;
mod node;
mod request;
mod route;
mod sitemap;
#[cfg(test)]
mod testing;

pub use crate::core::UrlPath;
pub use error::{Result, SiteMapError};
pub use node::{NodeId, SiteMapNode};
pub use request::RequestContext;
pub use route::{RouteHandle, RouteTable, RouteValues, value_is_unset, value_text};
pub use sitemap::{
    AclModule, ActionParameterResolver, SiteMap, SiteMapBuilder, compare_must_match_route_values,
};
