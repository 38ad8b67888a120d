//! Compile-time embedded templates for the generated C files.
//!
//! Paths are relative to this source file and resolve into the crate's own
//! `templates/` directory. A wrong path fails the build.

/// The complete generated header.
pub const HEADER: &str = include_str!("../../templates/header.h.hbs");

/// Marker comment and header include that open the generated source file.
pub const SOURCE_PREAMBLE: &str = include_str!("../../templates/source_preamble.c.hbs");
