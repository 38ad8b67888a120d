//! Command implementations for docx-embed.

pub mod generate;
