//! Arena-backed node storage with the four coupled lookup indices.
//!
//! Nodes live in a slot vector referenced by [`NodeId`]; the key, URL,
//! parent and children indices are auxiliary maps over those ids. Slots are
//! never reused, so a dangling id can only ever resolve to nothing - stale
//! handles fall back to key resolution instead of aliasing a newer node.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Result, SiteMapError};
use crate::node::{NodeId, SiteMapNode};

type Children = SmallVec<[NodeId; 4]>;

/// The index set: owning arena plus key/URL/parent/children indices.
///
/// Exclusively owned by the site map behind its write lock; readers only
/// ever observe a fully consistent state.
#[derive(Debug, Default)]
pub(crate) struct NodeIndex {
    nodes: Vec<Option<SiteMapNode>>,
    /// key -> node, one entry per live node.
    by_key: FxHashMap<String, NodeId>,
    /// Case-insensitive URL -> node, keyed by `UrlPath::index_key`.
    by_url: FxHashMap<String, NodeId>,
    /// child -> parent; absent for the root.
    parents: FxHashMap<NodeId, NodeId>,
    /// parent -> ordered children.
    children: FxHashMap<NodeId, Children>,
    root: Option<NodeId>,
}

impl NodeIndex {
    /// Insert a node, optionally under `parent`.
    ///
    /// Validation order follows the mutation contract: URL uniqueness
    /// first, then key uniqueness. Nothing is written unless both pass, so
    /// a failed insert leaves the index untouched.
    pub fn insert(&mut self, mut node: SiteMapNode, parent: Option<NodeId>) -> Result<SiteMapNode> {
        if let Some(url) = node.url.as_ref() {
            let url_key = url.index_key();
            if self.by_url.contains_key(&url_key) {
                return Err(SiteMapError::DuplicateUrl(url.to_string()));
            }
        }
        if self.by_key.contains_key(&node.key) {
            return Err(SiteMapError::DuplicateKey(node.key.clone()));
        }
        if let Some(pid) = parent
            && !self.contains(pid)
        {
            return Err(SiteMapError::UnknownParent(format!("#{}", pid.0)));
        }

        let id = NodeId(self.nodes.len() as u32);
        node.id = Some(id);
        self.by_key.insert(node.key.clone(), id);
        if let Some(url) = node.url.as_ref() {
            self.by_url.insert(url.index_key(), id);
        }
        if let Some(pid) = parent {
            self.parents.insert(id, pid);
            self.children.entry(pid).or_default().push(id);
        }
        let returned = node.clone();
        self.nodes.push(Some(node));
        Ok(returned)
    }

    /// Detach and delete a single node.
    ///
    /// Descendants are orphaned, not cascaded: they stay in the key index
    /// but lose their parent link. Cascading removal is the caller's call.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(pid) = self.parents.remove(&id)
            && let Some(siblings) = self.children.get_mut(&pid)
        {
            siblings.retain(|c| *c != id);
        }
        if let Some(orphans) = self.children.remove(&id) {
            for child in orphans {
                self.parents.remove(&child);
            }
        }
        if let Some(url) = node.url.as_ref() {
            self.by_url.remove(&url.index_key());
        }
        self.by_key.remove(&node.key);
        if self.root == Some(id) {
            self.root = None;
        }
    }

    /// Drop the root and empty every index.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.by_key.clear();
        self.by_url.clear();
        self.parents.clear();
        self.children.clear();
        self.root = None;
    }

    pub fn node(&self, id: NodeId) -> Option<&SiteMapNode> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Resolve a caller-held instance: direct handle first, stale or
    /// missing handles re-resolve by key.
    pub fn resolve(&self, node: &SiteMapNode) -> Option<NodeId> {
        if let Some(id) = node.id
            && let Some(stored) = self.node(id)
            && stored.key == node.key
        {
            return Some(id);
        }
        self.by_key.get(&node.key).copied()
    }

    pub fn by_key(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Lookup by a pre-folded URL index key.
    pub fn by_url_key(&self, url_key: &str) -> Option<NodeId> {
        self.by_url.get(url_key).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(|c| c.as_slice()).unwrap_or(&[])
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
