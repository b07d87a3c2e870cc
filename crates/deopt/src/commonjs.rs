//! In-memory CommonJS bundler
//!
//! `CommonJsBundle` produces browserify-style output: a require runtime, one
//! `require.define` call per module, `require.alias` registrations, and a
//! `require` call per entry point. It is the collaborator the splitter is
//! exercised against and what the command line tool feeds.

pub mod runtime;

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Result, bail};
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    builtins::{BUILTINS_DIR, PATH_BUILTIN, PROCESS_BUILTIN},
    bundle::{AliasMap, Bundle, BundleState},
    module_id::get_module_id,
    types::FileRecord,
};

/// Parameters every module factory receives
const MODULE_PARAMS: &str = "require, module, exports, __dirname, __filename, process, global";

/// A bundle held entirely in memory
#[derive(Debug, Clone)]
pub struct CommonJsBundle {
    /// Directory module ids are computed against
    root: PathBuf,
    state: BundleState,
    /// Wrapped module text by module id, populated only when caching is enabled
    wrapped: FxHashMap<String, String>,
}

/// Where an alias target ended up after following alias chains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Module id the alias registers
    pub id: String,
    /// Path and record of the module, when one exists in the bundle
    pub module: Option<(PathBuf, FileRecord)>,
}

impl CommonJsBundle {
    /// Create a bundle rooted at `root` containing the runtime and the core
    /// builtins.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let builtins_dir = root
            .join("node_modules")
            .join(BUILTINS_DIR[0])
            .join(BUILTINS_DIR[1]);

        let mut state = BundleState {
            prepends: vec![runtime::REQUIRE_RUNTIME.to_owned()],
            ..BundleState::default()
        };
        state.files.insert(
            builtins_dir.join(PATH_BUILTIN),
            FileRecord::with_target(runtime::PATH_BUILTIN_BODY, runtime::PATH_ID),
        );
        state.files.insert(
            builtins_dir.join(PROCESS_BUILTIN),
            FileRecord::with_target(runtime::PROCESS_BUILTIN_BODY, runtime::PROCESS_ID),
        );

        Self {
            root,
            state,
            wrapped: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a module; relative paths are taken relative to the bundle root
    pub fn add_file(&mut self, path: impl AsRef<Path>, body: impl Into<String>) -> &mut Self {
        self.add_file_record(path, FileRecord::new(body))
    }

    pub fn add_file_record(&mut self, path: impl AsRef<Path>, record: FileRecord) -> &mut Self {
        let path = self.root.join(path);
        trace!("Adding file {}", path.display());
        let record = self.with_module_id(&path, record);
        self.state.files.insert(path, record);
        self
    }

    /// Add a module that runs when the bundle loads
    pub fn add_entry(&mut self, path: impl AsRef<Path>, body: impl Into<String>) -> &mut Self {
        self.add_entry_record(path, FileRecord::new(body))
    }

    pub fn add_entry_record(&mut self, path: impl AsRef<Path>, record: FileRecord) -> &mut Self {
        let path = self.root.join(path);
        trace!("Adding entry {}", path.display());
        let record = self.with_module_id(&path, record);
        self.state.entries.insert(path, record);
        self
    }

    /// Pin the root-relative module id on a record that has none, so its id
    /// does not depend on the directory a caller later splits against
    fn with_module_id(&self, path: &Path, mut record: FileRecord) -> FileRecord {
        if record.target.is_none() {
            record.target = Some(get_module_id(&record, path, &self.root));
        }
        record
    }

    /// Register `name` as an alias for `target`
    pub fn alias(&mut self, name: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.state.aliases.insert(name.into(), target.into());
        self
    }

    /// Give the module at `path` an explicit id
    pub fn set_target(&mut self, path: impl AsRef<Path>, id: impl Into<String>) -> Result<()> {
        let path = self.root.join(path);
        let id = id.into();
        let record = if self.state.entries.contains_key(&path) {
            self.state.entries.get_mut(&path)
        } else {
            self.state.files.get_mut(&path)
        };
        let Some(record) = record else {
            bail!("Cannot set id '{}': {} is not in the bundle", id, path.display());
        };
        record.target = Some(id);
        Ok(())
    }

    /// Resolve `name` to a module id, following chains through `aliases`.
    ///
    /// A name that matches a module in the bundle resolves to that module's
    /// id; a name that matches nothing is returned verbatim.
    pub fn resolve_target(&self, name: &str, aliases: &AliasMap) -> Result<ResolvedTarget> {
        let mut current = name;
        let mut chain = vec![name];
        let mut seen = FxHashSet::default();

        loop {
            if !seen.insert(current) {
                bail!("Cyclic alias chain: {}", chain.join(" -> "));
            }

            if let Some((path, record)) = self.find_module(current) {
                let id = get_module_id(record, path, &self.root);
                trace!("Alias target '{}' resolved to {}", name, id);
                return Ok(ResolvedTarget {
                    id,
                    module: Some((path.clone(), record.clone())),
                });
            }

            match aliases.get(current) {
                Some(next) => {
                    current = next.as_str();
                    chain.push(current);
                }
                None => {
                    return Ok(ResolvedTarget {
                        id: current.to_owned(),
                        module: None,
                    });
                }
            }
        }
    }

    /// Find the module a bare or path-like name refers to
    fn find_module(&self, name: &str) -> Option<(&PathBuf, &FileRecord)> {
        let name = name.strip_prefix("./").unwrap_or(name);
        let bare = name.trim_start_matches('/');
        let candidates = [
            format!("/{bare}"),
            format!("/{bare}.js"),
            format!("/{bare}/index.js"),
            format!("/node_modules/{bare}/index.js"),
            format!("/node_modules/{bare}.js"),
        ];

        self.state
            .entries
            .iter()
            .chain(self.state.files.iter())
            .find(|(path, record)| {
                let id = get_module_id(record, path, &self.root);
                id == name || candidates.contains(&id)
            })
    }
}

impl Bundle for CommonJsBundle {
    fn state(&self) -> &BundleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BundleState {
        &mut self.state
    }

    fn wrap(&self, id: &str, body: &str) -> Result<String> {
        wrap_module(id, body)
    }

    fn bundle(&mut self) -> Result<String> {
        // Alias targets are resolved up front, before the wrap cache is borrowed
        let mut alias_calls = String::new();
        for (name, target) in &self.state.aliases {
            let resolved = self.resolve_target(target, &self.state.aliases)?;
            writeln!(
                alias_calls,
                "require.alias({}, {});",
                serde_json::to_string(&resolved.id)?,
                serde_json::to_string(name)?
            )?;
        }

        let Self {
            root,
            state,
            wrapped,
        } = self;

        let mut out = String::new();
        for prepend in &state.prepends {
            out.push_str(prepend);
            if !prepend.ends_with('\n') {
                out.push('\n');
            }
        }

        for (path, record) in &state.files {
            let id = get_module_id(record, path, root);
            out.push_str(&cached_wrap(wrapped, state.cache, &id, &record.body)?);
        }

        out.push_str(&alias_calls);

        for (path, record) in &state.entries {
            let id = get_module_id(record, path, root);
            out.push_str(&cached_wrap(wrapped, state.cache, &id, &record.body)?);
            writeln!(out, "require({});", serde_json::to_string(&id)?)?;
        }

        debug!(
            "Serialized bundle: {} prepends, {} files, {} aliases, {} entries",
            state.prepends.len(),
            state.files.len(),
            state.aliases.len(),
            state.entries.len()
        );

        if state.exports {
            Ok(out)
        } else {
            Ok(format!("(function () {{\n{out}}})();\n"))
        }
    }

    fn reload(&mut self) {
        trace!("Dropping {} cached module wrappers", self.wrapped.len());
        self.wrapped.clear();
    }

    fn fork_with_requires(&self, requires: &AliasMap) -> Result<Self> {
        let mut fork = Self::new(self.root.clone());
        fork.state.cache = true;

        for (name, target) in requires {
            let resolved = self.resolve_target(target, requires)?;
            if let Some((path, record)) = resolved.module {
                fork.state.files.insert(path, record);
            }
            fork.state.aliases.insert(name.clone(), resolved.id);
        }

        Ok(fork)
    }
}

fn wrap_module(id: &str, body: &str) -> Result<String> {
    Ok(format!(
        "require.define({}, function ({MODULE_PARAMS}) {{\n{body}\n}});\n",
        serde_json::to_string(id)?
    ))
}

fn cached_wrap(
    wrapped: &mut FxHashMap<String, String>,
    cache: bool,
    id: &str,
    body: &str,
) -> Result<String> {
    if !cache {
        return wrap_module(id, body);
    }
    if let Some(text) = wrapped.get(id) {
        return Ok(text.clone());
    }
    let text = wrap_module(id, body)?;
    wrapped.insert(id.to_owned(), text.clone());
    Ok(text)
}
