//! The bundle collaborator
//!
//! The splitter never builds a bundle itself. It borrows one from the caller,
//! rewrites its state for a while, and relies on a handful of capabilities the
//! bundler provides: wrapping a module body, serializing the whole bundle, and
//! invalidating caches after a serialization.

use std::path::PathBuf;

use anyhow::Result;

use crate::types::{FileRecord, FxIndexMap};

/// Map from absolute file path to its module record
pub type FileMap = FxIndexMap<PathBuf, FileRecord>;

/// Map from alias name to the module it stands for
pub type AliasMap = FxIndexMap<String, String>;

/// Observable state of a bundle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleState {
    /// Every module that is part of the bundle, keyed by absolute path
    pub files: FileMap,
    /// Modules run automatically when the bundle loads
    pub entries: FileMap,
    /// Named indirections registered with the runtime
    pub aliases: AliasMap,
    /// Expose the module registry outside the bundle's own closure.
    ///
    /// When unset a serialized bundle keeps `require` private, so a second
    /// script cannot register or load modules through it.
    pub exports: bool,
    /// Code emitted ahead of every module (the require runtime)
    pub prepends: Vec<String>,
    /// Memoize wrapped module text between serializations
    pub cache: bool,
}

/// Capabilities the splitter needs from a bundler
pub trait Bundle {
    fn state(&self) -> &BundleState;

    fn state_mut(&mut self) -> &mut BundleState;

    /// Produce a self-registering fragment for one module
    fn wrap(&self, id: &str, body: &str) -> Result<String>;

    /// Serialize the current state into a single script
    fn bundle(&mut self) -> Result<String>;

    /// Drop anything cached by a previous [`Bundle::bundle`] call
    fn reload(&mut self);

    /// Build a fresh, independent bundle whose only declared requirements are
    /// `requires` (alias name to target), with caching enabled.
    fn fork_with_requires(&self, requires: &AliasMap) -> Result<Self>
    where
        Self: Sized;
}
