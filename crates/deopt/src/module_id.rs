//! Module identity
//!
//! A module id is what `require` resolves against at runtime, so the same file
//! must always map to the same id. Output keys are derived from ids only to give
//! fragments path-like names; they never take part in resolution.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use cow_utils::CowUtils;

use crate::types::FileRecord;

/// Turn a relative filesystem path into a URL-style module id
pub fn urlize(path: &str) -> String {
    format!("/{}", path.cow_replace('\\', "/"))
}

/// Compute the module id for `file` located at `file_path`.
///
/// An explicit `target` on the record always wins. Otherwise the id is the path
/// relative to `base_dir`, with forward slashes and a leading `/`.
pub fn get_module_id(file: &FileRecord, file_path: &Path, base_dir: &Path) -> String {
    if let Some(target) = &file.target {
        return target.clone();
    }

    let relative = relative_path(file_path, base_dir);
    urlize(&relative.to_string_lossy())
}

/// Strip exactly one leading `/` from a module id.
///
/// Ids beginning with `/` behave like absolute paths, which makes them awkward
/// to use as output file names.
pub fn key_from_module_id(module_id: &str) -> &str {
    module_id.strip_prefix('/').unwrap_or(module_id)
}

fn relative_path(file_path: &Path, base_dir: &Path) -> PathBuf {
    let file_path = absolutize(file_path);
    let base_dir = absolutize(base_dir);

    pathdiff::diff_paths(&file_path, &base_dir).unwrap_or_else(|| file_path.into_owned())
}

fn absolutize(path: &Path) -> Cow<'_, Path> {
    if path.is_absolute() {
        return Cow::Borrowed(path);
    }
    std::path::absolute(path).map_or(Cow::Borrowed(path), Cow::Owned)
}
