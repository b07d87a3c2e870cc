//! Configuration for the command line tool
//!
//! Settings come from a TOML file and are then overridden by command line
//! flags. The file is looked up in this order:
//! 1. the path given with `--config`
//! 2. `deopt.toml` in the working directory
//! 3. `deopt/deopt.toml` in the user's config directory
//!
//! When none exists the defaults are used.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use etcetera::BaseStrategy;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{commonjs::CommonJsBundle, types::FxIndexMap};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "deopt.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory module ids are computed against; defaults to the working
    /// directory
    pub base_dir: Option<PathBuf>,
    /// Directory fragments are written to
    pub out_dir: PathBuf,
    /// Modules that are part of the bundle, relative to `base_dir`
    pub files: Vec<PathBuf>,
    /// Modules run when the bundle loads, relative to `base_dir`
    pub entries: Vec<PathBuf>,
    /// Alias name to the module it stands for
    pub aliases: FxIndexMap<String, String>,
    /// Explicit module ids, by path relative to `base_dir`
    pub targets: FxIndexMap<PathBuf, String>,
    /// Also write a JSON manifest with the fragment load order
    pub manifest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            out_dir: PathBuf::from("dist"),
            files: Vec::new(),
            entries: Vec::new(),
            aliases: FxIndexMap::default(),
            targets: FxIndexMap::default(),
            manifest: false,
        }
    }
}

impl Config {
    /// Load configuration following the lookup order above
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::from_file(&local);
        }

        if let Some(user) = Self::user_config_path().filter(|path| path.is_file()) {
            return Self::from_file(&user);
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Location of the per-user configuration file, if the platform has one
    pub fn user_config_path() -> Option<PathBuf> {
        let strategy = etcetera::choose_base_strategy().ok()?;
        Some(strategy.config_dir().join("deopt").join(CONFIG_FILE_NAME))
    }

    /// The configured base directory, or the working directory
    pub fn resolve_base_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        Ok(match &self.base_dir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }

    /// Read every configured module from disk into a bundle rooted at
    /// `base_dir`
    pub fn build_bundle(&self, base_dir: &Path) -> Result<CommonJsBundle> {
        let mut bundle = CommonJsBundle::new(base_dir);

        for file in &self.files {
            bundle.add_file(file, read_module(base_dir, file)?);
        }
        for entry in &self.entries {
            bundle.add_entry(entry, read_module(base_dir, entry)?);
        }
        for (name, target) in &self.aliases {
            bundle.alias(name.clone(), target.clone());
        }
        for (path, id) in &self.targets {
            bundle
                .set_target(path, id.clone())
                .context("Invalid `targets` entry")?;
        }

        Ok(bundle)
    }
}

fn read_module(base_dir: &Path, path: &Path) -> Result<String> {
    let full_path = base_dir.join(path);
    trace!("Reading module {}", full_path.display());
    fs::read_to_string(&full_path)
        .with_context(|| format!("Failed to read module {}", full_path.display()))
}
