//! Shared type definitions for the deopt crate
//!
//! This module contains the types that flow between the bundle collaborator,
//! the prelude extractor and the splitter.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Name of the fragment holding the module runtime and the core builtins
pub const PRELUDE_KEY: &str = "browserify-prelude.js";

/// Name of the fragment holding the alias registrations
pub const ALIASES_KEY: &str = "browserify-aliases.js";

/// Name of the fragment that requires every entry point
pub const ENTRY_KEY: &str = "browserify-entry.js";

/// A single module as the bundler holds it: an unwrapped body plus an
/// optional explicit module id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileRecord {
    /// Raw module source, before wrapping
    pub body: String,
    /// Explicit override for the module id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl FileRecord {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            target: None,
        }
    }

    pub fn with_target(body: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            target: Some(target.into()),
        }
    }
}
