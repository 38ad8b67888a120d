//! Console reporting for `docx-embed`.
//!
//! Everything goes to stdout; `tracing` output stays on stderr.

use std::path::Path;

use console::style;
use docx_embed_core::writer::WriteOutcome;

/// Title line, underlined to its own width.
pub fn print_header(text: &str) {
    println!("\n{}", style(text).bold().cyan());
    println!("{}", style("-".repeat(text.len())).dim());
}

pub fn print_success(text: &str) {
    println!("{} {}", style("[OK]").green().bold(), text);
}

pub fn print_warning(text: &str) {
    println!("{} {}", style("[WARN]").yellow().bold(), text);
}

/// Numbered stage, e.g. `[2/2] Generating embedded sources`.
pub fn print_step(step: u32, total: u32, text: &str) {
    println!("{} {}", style(format!("[{step}/{total}]")).dim(), text);
}

/// Indented `key: value` line with the key dimmed.
pub fn print_key_value(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// One generated file and whether this run touched it.
pub fn print_outcome(path: &Path, outcome: WriteOutcome) {
    let label = match outcome {
        WriteOutcome::Written => style(outcome.as_str()).green(),
        WriteOutcome::Unchanged => style(outcome.as_str()).dim(),
    };
    println!("  {:>9} {}", label, path.display());
}
