//! Core library for docx-embed.
//!
//! Turns a template `.docx` (or any zip-based document) into a pair of C
//! files that embed every member as a string literal, plus a function that
//! re-assembles the archive at runtime through a caller-provided
//! `write_member` collaborator, optionally substituting one designated member.
//!
//! The pipeline ([`pipeline::run`]) is:
//! - [`unpack`] — extract the template into a scratch directory
//! - [`members`] — enumerate the extracted files in a stable order
//! - [`codegen`] — synthesize header and source, using [`escape`] for literals
//! - [`writer`] — persist each file only if its content changed

pub mod archive;
pub mod codegen;
pub mod config;
pub mod error;
pub mod escape;
pub mod members;
pub mod pipeline;
pub mod templates;
pub mod unpack;
pub mod writer;
