//! Crate error taxonomy.

use thiserror::Error;

/// Failures surfaced by site map mutation and policy operations.
///
/// Lookups never error: absence - including nodes hidden by security
/// trimming - is an ordinary `None`.
#[derive(Debug, Error)]
pub enum SiteMapError {
    /// A node with this key is already indexed.
    #[error("multiple nodes with identical key `{0}`")]
    DuplicateKey(String),

    /// A different node already owns this URL.
    #[error("multiple nodes with identical URL `{0}`")]
    DuplicateUrl(String),

    /// Node keys are mandatory.
    #[error("node key must not be empty")]
    EmptyKey,

    /// The supplied parent is not part of this site map.
    #[error("parent node `{0}` is not part of this site map")]
    UnknownParent(String),

    /// Security trimming is a one-way latch.
    #[error("security trimming cannot be disabled once enabled")]
    TrimmingLocked,

    /// Hint levels must be `>= -1`, walk-up levels `>= 0`.
    #[error("hint level {0} is out of range")]
    HintLevelOutOfRange(i32),

    /// The builder collaborator failed while populating the tree.
    #[error("site map build failed")]
    Build(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SiteMapError>;
