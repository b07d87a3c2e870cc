//! Prelude extraction
//!
//! The prelude is whatever the bundler emits when nothing but the core builtins
//! is left in it: the require runtime plus the two modules that runtime needs.
//! Producing it means temporarily emptying the bundle, so the detached state is
//! held by a guard that puts everything back on every exit path.

use std::mem;

use anyhow::{Context, Result};
use log::{debug, trace};

use crate::{
    builtins::is_core_builtin,
    bundle::{AliasMap, Bundle, FileMap},
};

/// Serialize the prelude of `bundle`.
///
/// `files`, `entries` and `aliases` are restored and the bundle is reloaded
/// before this returns, whether serialization succeeded or not.
pub fn extract_prelude<B: Bundle + ?Sized>(bundle: &mut B) -> Result<String> {
    let mut detached = DetachedState::detach(bundle);
    detached
        .serialize()
        .context("Failed to serialize the bundle prelude")
}

/// Holds the parts of a bundle that do not belong in the prelude.
///
/// While the guard is alive the bundle contains only core builtins, no entries
/// and no aliases. Dropping the guard restores the original state and reloads
/// the bundle, even if serialization returned an error or panicked.
#[must_use = "DetachedState must be held in scope to ensure the bundle is restored"]
struct DetachedState<'a, B: Bundle + ?Sized> {
    bundle: &'a mut B,
    /// The complete original file map, kept whole so iteration order survives
    files: FileMap,
    entries: FileMap,
    aliases: AliasMap,
}

impl<'a, B: Bundle + ?Sized> DetachedState<'a, B> {
    fn detach(bundle: &'a mut B) -> Self {
        let state = bundle.state_mut();

        let files = mem::take(&mut state.files);
        state.files = files
            .iter()
            .filter(|(path, _)| is_core_builtin(path))
            .map(|(path, record)| (path.clone(), record.clone()))
            .collect();
        let entries = mem::take(&mut state.entries);
        let aliases = mem::take(&mut state.aliases);

        debug!(
            "Detached {} non-builtin files, {} entries and {} aliases for prelude extraction",
            files.len() - state.files.len(),
            entries.len(),
            aliases.len()
        );

        Self {
            bundle,
            files,
            entries,
            aliases,
        }
    }

    fn serialize(&mut self) -> Result<String> {
        self.bundle.bundle()
    }
}

impl<B: Bundle + ?Sized> Drop for DetachedState<'_, B> {
    fn drop(&mut self) {
        let state = self.bundle.state_mut();
        state.files = mem::take(&mut self.files);
        state.entries = mem::take(&mut self.entries);
        state.aliases = mem::take(&mut self.aliases);
        trace!("Restored bundle state after prelude extraction");

        // The serialization above may have populated generation caches
        self.bundle.reload();
    }
}
