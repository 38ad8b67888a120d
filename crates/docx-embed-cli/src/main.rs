//! docx-embed CLI — generate C sources that embed a template `.docx`.
//!
//! Writes `<out-path>.c` and `<out-path>.h`. The source embeds every member of
//! the template as a string literal and defines a function that writes them
//! all into an output archive, optionally replacing `word/document.xml` with
//! caller-supplied content.
//!
//! The generation itself lives in [`docx_embed_core::pipeline`].

mod commands;
mod output;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docx-embed",
    about = "Generate C code that re-creates a template .docx without needing it at runtime",
    version
)]
struct Cli {
    /// Template .docx file to extract from
    #[arg(short = 'i', long = "input", value_name = "DOCX-PATH")]
    input: PathBuf,

    /// Output base path; writes <OUT-PATH>.c and <OUT-PATH>.h
    #[arg(short = 'o', long = "output", value_name = "OUT-PATH")]
    output: PathBuf,

    /// Path to a JSON generator config (defaults match the extract library)
    #[arg(long, env = "DOCX_EMBED_CONFIG")]
    config: Option<PathBuf>,

    /// Check that the embedded data re-creates the template before writing
    #[arg(long)]
    verify: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    commands::generate::run(&cli.input, &cli.output, cli.config.as_deref(), cli.verify)
}
