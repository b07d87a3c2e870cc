//! Bundle splitting
//!
//! Turns one bundle into a set of fragments that, loaded together, behave like
//! the single script the bundle would have produced:
//!
//! 1. `browserify-prelude.js`: the require runtime and the core builtins
//! 2. `browserify-aliases.js`: alias registrations, when there are aliases
//! 3. one fragment per module, keyed by its module id without the leading `/`
//! 4. `browserify-entry.js`: a `require` call per entry point, when there are
//!    entries
//!
//! The prelude must be loaded first and the entry loader last; everything in
//! between can load in any order.

use std::{fmt::Write as _, path::Path};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::{
    builtins::is_core_builtin,
    bundle::Bundle,
    module_id::{get_module_id, key_from_module_id},
    prelude::extract_prelude,
    types::{ALIASES_KEY, ENTRY_KEY, FxIndexMap, PRELUDE_KEY},
};

/// Fragments produced by [`split`], keyed by output file name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SplitResult {
    fragments: FxIndexMap<String, String>,
}

impl SplitResult {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fragments.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fragments.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fragments
            .iter()
            .map(|(key, source)| (key.as_str(), source.as_str()))
    }

    /// Keys in an order that is safe to load: prelude first, then aliases and
    /// module fragments, entry loader last.
    pub fn load_order(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.fragments.len());
        if self.contains_key(PRELUDE_KEY) {
            order.push(PRELUDE_KEY);
        }
        if self.contains_key(ALIASES_KEY) {
            order.push(ALIASES_KEY);
        }
        order.extend(
            self.keys()
                .filter(|key| ![PRELUDE_KEY, ALIASES_KEY, ENTRY_KEY].contains(key)),
        );
        if self.contains_key(ENTRY_KEY) {
            order.push(ENTRY_KEY);
        }
        order
    }

    fn insert(&mut self, key: impl Into<String>, source: String) {
        let key = key.into();
        if self.fragments.insert(key.clone(), source).is_some() {
            debug!("Fragment '{key}' produced more than once, keeping the latest");
        }
    }
}

impl<'a> IntoIterator for &'a SplitResult {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// Split `bundle` into independently loadable fragments.
///
/// Records that carry no target get module ids computed relative to
/// `base_dir`, which defaults to the current working directory. The bundle's files, entries and aliases are
/// unchanged when this returns; `exports` is left enabled, since every
/// fragment needs the shared `require`.
pub fn split<B: Bundle>(bundle: &mut B, base_dir: Option<&Path>) -> Result<SplitResult> {
    let base_dir = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine the working directory")?,
    };
    debug!("Splitting bundle relative to {}", base_dir.display());

    let mut result = SplitResult::default();

    // Fragments after the prelude register modules through the global require
    bundle.state_mut().exports = true;

    let prelude = extract_prelude(bundle)?;
    result.insert(PRELUDE_KEY, prelude);

    add_aliases(bundle, &mut result, &base_dir)?;
    add_files_and_entries(bundle, &mut result, &base_dir)?;
    add_entry_requirer(bundle, &mut result, &base_dir)?;

    info!("Split bundle into {} fragments", result.len());
    Ok(result)
}

/// Emit the alias registrations, plus fragments for any alias targets
fn add_aliases<B: Bundle>(bundle: &B, result: &mut SplitResult, base_dir: &Path) -> Result<()> {
    let aliases = &bundle.state().aliases;
    if aliases.is_empty() {
        return Ok(());
    }

    let mut alias_bundle = bundle
        .fork_with_requires(aliases)
        .context("Failed to build the alias bundle")?;

    // Pulls the un-aliased targets into the result
    add_files_and_entries(&alias_bundle, result, base_dir)?;

    // With no files and no runtime left, serializing yields the alias calls only
    let state = alias_bundle.state_mut();
    state.files.clear();
    state.prepends.clear();

    let registrations = alias_bundle
        .bundle()
        .context("Failed to serialize alias registrations")?;
    debug!("Registered {} aliases", aliases.len());
    result.insert(ALIASES_KEY, registrations);
    Ok(())
}

/// Emit one wrapped fragment per non-builtin module.
///
/// Files and entries are merged, with the entry record winning when a path is
/// in both.
fn add_files_and_entries<B: Bundle + ?Sized>(
    bundle: &B,
    result: &mut SplitResult,
    base_dir: &Path,
) -> Result<()> {
    let state = bundle.state();
    let merged = state
        .files
        .iter()
        .map(|(path, record)| (path, state.entries.get(path).unwrap_or(record)))
        .chain(
            state
                .entries
                .iter()
                .filter(|(path, _)| !state.files.contains_key(*path)),
        );

    for (path, record) in merged {
        if is_core_builtin(path) {
            continue;
        }
        let module_id = get_module_id(record, path, base_dir);
        let wrapped = bundle
            .wrap(&module_id, &record.body)
            .with_context(|| format!("Failed to wrap module {}", path.display()))?;
        result.insert(key_from_module_id(&module_id), wrapped);
    }
    Ok(())
}

/// Emit the fragment that runs every entry point, in entry order
fn add_entry_requirer<B: Bundle + ?Sized>(
    bundle: &B,
    result: &mut SplitResult,
    base_dir: &Path,
) -> Result<()> {
    let entries = &bundle.state().entries;
    if entries.is_empty() {
        return Ok(());
    }

    let mut requires = String::new();
    for (path, record) in entries {
        let module_id = get_module_id(record, path, base_dir);
        writeln!(requires, "require({});", serde_json::to_string(&module_id)?)?;
    }
    result.insert(ENTRY_KEY, requires);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{commonjs::CommonJsBundle, types::FileRecord};

    #[test]
    fn test_single_file_bundle() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle.add_file("a.js", "module.exports=1");

        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();

        assert_eq!(result.keys().collect::<Vec<_>>(), vec![PRELUDE_KEY, "a.js"]);
        let prelude = result.get(PRELUDE_KEY).unwrap();
        assert!(prelude.starts_with("var require = function"));
        assert!(prelude.contains(r#"require.define("path""#));
        assert!(prelude.contains(r#"require.define("__browserify_process""#));
        assert!(!prelude.contains("module.exports=1"));

        let fragment = result.get("a.js").unwrap();
        assert!(fragment.starts_with(r#"require.define("/a.js", "#));
        assert!(fragment.contains("module.exports=1"));
    }

    #[test]
    fn test_entries_override_files() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_file("main.js", "file version")
            .add_entry("main.js", "entry version");

        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();
        let fragment = result.get("main.js").unwrap();
        assert!(fragment.contains("entry version"));
        assert!(!fragment.contains("file version"));
    }

    #[test]
    fn test_entry_requirer_follows_entry_order() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_entry("z.js", "")
            .add_entry("a.js", "")
            .add_entry_record("lib/jq.js", FileRecord::with_target("", "jquery"));

        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();
        insta::assert_snapshot!(result.get(ENTRY_KEY).unwrap(), @r#"
        require("/z.js");
        require("/a.js");
        require("jquery");
        "#);
        assert!(result.contains_key("jquery"));
    }

    #[test]
    fn test_alias_fragment_has_registrations_only() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_file("node_modules/foo-impl/index.js", "module.exports = 'foo'")
            .alias("foo", "foo-impl");

        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();

        insta::assert_snapshot!(result.get(ALIASES_KEY).unwrap(), @r#"
        (function () {
        require.alias("/node_modules/foo-impl/index.js", "foo");
        })();
        "#);
        assert!(result.contains_key("node_modules/foo-impl/index.js"));
        assert!(!result.contains_key(ENTRY_KEY));
    }

    #[test]
    fn test_reserved_keys_only_when_needed() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle.add_file("a.js", "");
        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();
        assert!(result.contains_key(PRELUDE_KEY));
        assert!(!result.contains_key(ALIASES_KEY));
        assert!(!result.contains_key(ENTRY_KEY));

        bundle.add_entry("main.js", "").alias("a", "./a");
        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();
        assert!(result.contains_key(ALIASES_KEY));
        assert!(result.contains_key(ENTRY_KEY));
    }

    #[test]
    fn test_builtins_are_never_split_out() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle.add_file("a.js", "");
        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();

        assert!(!result.contains_key("path"));
        assert!(!result.contains_key("__browserify_process"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_bundle_restored_and_exports_forced() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_file("lib/a.js", "")
            .add_file("node_modules/foo-impl/index.js", "")
            .add_entry("main.js", "require('foo')")
            .alias("foo", "foo-impl");
        let before = bundle.state().clone();

        split(&mut bundle, Some(Path::new("/proj"))).unwrap();

        let after = bundle.state();
        assert_eq!(after.files, before.files);
        assert_eq!(after.entries, before.entries);
        assert_eq!(after.aliases, before.aliases);
        assert!(after.exports);
    }

    #[test]
    fn test_load_order() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_entry("main.js", "")
            .add_file("node_modules/foo-impl/index.js", "")
            .alias("foo", "foo-impl");

        let result = split(&mut bundle, Some(Path::new("/proj"))).unwrap();
        let order = result.load_order();

        assert_eq!(order.first(), Some(&PRELUDE_KEY));
        assert_eq!(order.get(1), Some(&ALIASES_KEY));
        assert_eq!(order.last(), Some(&ENTRY_KEY));
        assert_eq!(order.len(), result.len());
    }

    #[test]
    fn test_alias_ids_match_fragments_when_base_dir_differs() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle
            .add_file("src/node_modules/foo-impl/index.js", "module.exports = 'foo'")
            .alias("foo", "src/node_modules/foo-impl");

        let result = split(&mut bundle, Some(Path::new("/proj/src"))).unwrap();

        let fragment = result.get("src/node_modules/foo-impl/index.js").unwrap();
        assert!(fragment.starts_with(r#"require.define("/src/node_modules/foo-impl/index.js", "#));
        insta::assert_snapshot!(result.get(ALIASES_KEY).unwrap(), @r#"
        (function () {
        require.alias("/src/node_modules/foo-impl/index.js", "foo");
        })();
        "#);
    }

    #[test]
    fn test_untargeted_records_follow_base_dir() {
        let mut bundle = CommonJsBundle::new("/proj");
        bundle.state_mut().files.insert(
            std::path::PathBuf::from("/proj/src/lib/a.js"),
            FileRecord::new(""),
        );

        let result = split(&mut bundle, Some(Path::new("/proj/src"))).unwrap();
        let fragment = result.get("lib/a.js").unwrap();
        assert!(fragment.starts_with(r#"require.define("/lib/a.js", "#));
    }
}
