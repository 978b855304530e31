//! Core types - pure abstractions shared across the crate.

mod url;

pub use self::url::UrlPath;
