//! Templates for the fixed parts of the generated files.
//!
//! The header and the source preamble are embedded at compile time via
//! [`include_str!`] in the [`embedded`] module and rendered with
//! [Handlebars](https://handlebarsjs.com/) by [`renderer::TemplateRenderer`].
//! The per-member body of the source file is not templated; it is assembled
//! by [`crate::codegen`].
//!
//! ## Template variables
//!
//! - `{{include_guard}}`, `{{writer_header}}`, `{{handle_type}}` — from the config
//! - `{{function_name}}` — the re-assembly function (`extract_docx_write`)
//! - `{{designated_member}}` — archive name of the substitutable member
//! - `{{designated_ident}}` / `{{designated_symbol}}` — identifiers derived from it
//! - `{{header_name}}` — file name of the generated header (source preamble only)

pub mod embedded;
pub mod renderer;
