//! Split a single-file CommonJS bundle into independently loadable fragments.
//!
//! [`split`] borrows a [`Bundle`], temporarily strips it down to produce the
//! prelude, and emits one fragment per module plus alias and entry loaders.
//! [`CommonJsBundle`] is an in-memory bundler implementing [`Bundle`].

pub mod builtins;
pub mod bundle;
pub mod commonjs;
pub mod config;
pub mod module_id;
pub mod output;
pub mod prelude;
pub mod splitter;
pub mod types;

pub use bundle::{Bundle, BundleState};
pub use commonjs::CommonJsBundle;
pub use splitter::{SplitResult, split};
pub use types::{ALIASES_KEY, ENTRY_KEY, FileRecord, PRELUDE_KEY};
