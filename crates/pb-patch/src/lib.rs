//! Function-level patching of Lua sources without a parser.
//!
//! Functions are found by classifying whole lines as headers (`function`,
//! `local function`) or terminators (`end`) and counting depth. Sources are
//! expected to keep one such keyword per line.

mod inject;
mod locate;
mod source_tree;

pub use inject::{inject, DEFAULT_AFTER_LINE};
pub use locate::locate;
pub use source_tree::{PatchResult, SourceTree, LUA_EXTENSION};
