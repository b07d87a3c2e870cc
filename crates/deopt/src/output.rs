//! Writing fragments to disk

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Serialize;

use crate::{splitter::SplitResult, types::FxIndexMap};

/// File name of the load-order manifest
pub const MANIFEST_FILE: &str = "deopt-manifest.json";

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    /// Fragment keys in a safe load order
    load_order: Vec<&'a str>,
    /// Size in bytes of each fragment
    sizes: FxIndexMap<&'a str, usize>,
}

/// Write every fragment to `out_dir/<key>`, returning the written paths
pub fn write_fragments(result: &SplitResult, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(result.len());

    for (key, source) in result.iter() {
        let path = fragment_path(out_dir, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, source)
            .with_context(|| format!("Failed to write fragment {}", path.display()))?;
        debug!("Wrote {} ({} bytes)", path.display(), source.len());
        written.push(path);
    }

    info!("Wrote {} fragments to {}", written.len(), out_dir.display());
    Ok(written)
}

/// Write the load-order manifest next to the fragments
pub fn write_manifest(result: &SplitResult, out_dir: &Path) -> Result<PathBuf> {
    let manifest = Manifest {
        load_order: result.load_order(),
        sizes: result.iter().map(|(key, source)| (key, source.len())).collect(),
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory {}", out_dir.display()))?;
    let path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write manifest {}", path.display()))?;
    Ok(path)
}

/// Map a fragment key to a path inside `out_dir`.
///
/// Keys come from module ids, which can point outside the base directory;
/// those would escape `out_dir` and are rejected.
fn fragment_path(out_dir: &Path, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    let escapes = relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if key.is_empty() || escapes {
        bail!("Fragment '{key}' would be written outside of {}", out_dir.display());
    }
    Ok(out_dir.join(relative))
}
