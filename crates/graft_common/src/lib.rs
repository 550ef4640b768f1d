//! Shared foundational types used across the graft toolchain.
//!
//! This crate provides the content hash that names every generated artifact
//! and the lexical path helpers used to keep logical paths project-relative.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{ContentHash, ParseContentHashError};
pub use path::{escapes_root, normalize, relative_path, to_slash};
