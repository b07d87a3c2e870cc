//! Core builtin detection
//!
//! The runtime's own `require` implementation depends on two modules: the path
//! helper used during resolution and the process shim handed to every module.
//! Both have to ship inside the prelude, so they are never split out.

use std::path::{MAIN_SEPARATOR, Path};

/// Directory (relative to the bundler package) holding the core builtins
pub const BUILTINS_DIR: [&str; 2] = ["browserify", "builtins"];

/// File name of the path-resolution helper
pub const PATH_BUILTIN: &str = "path.js";

/// File name of the process-environment shim
pub const PROCESS_BUILTIN: &str = "__browserify_process.js";

/// Check whether `file_path` is one of the core builtins.
///
/// Only the last three pieces of the path, split on the separator as written,
/// are compared. They must match one of the two known locations exactly; an
/// empty piece or a `.` is a mismatch, not something to normalize away.
pub fn is_core_builtin(file_path: &Path) -> bool {
    let text = file_path.to_string_lossy();
    let mut pieces = text.rsplit(MAIN_SEPARATOR);
    let (Some(file_name), Some(dir), Some(package)) = (pieces.next(), pieces.next(), pieces.next())
    else {
        return false;
    };

    package == BUILTINS_DIR[0]
        && dir == BUILTINS_DIR[1]
        && (file_name == PATH_BUILTIN || file_name == PROCESS_BUILTIN)
}
