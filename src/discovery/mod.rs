//! Source file discovery.
//!
//! Uses the `ignore` crate to walk directories in parallel, optionally
//! honoring .gitignore, and returns files in sorted order.

mod files;

pub use files::find_source_files;
