use std::path::Path;

use anyhow::Result;

use docx_embed_core::config::GeneratorConfig;
use docx_embed_core::pipeline::{self, GenerateOptions};
use docx_embed_core::unpack;

use crate::output;

/// Generate `<output_base>.c` and `<output_base>.h` from a template archive.
///
/// Loads the optional JSON config, picks the configured unpacker and runs the
/// generation pipeline. Unchanged outputs are left untouched.
pub fn run(
    input: &Path,
    output_base: &Path,
    config_path: Option<&Path>,
    verify: bool,
) -> Result<()> {
    output::print_header("docx-embed");

    let config = match config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    output::print_key_value("Template", &input.display().to_string());
    output::print_key_value("Output", &output_base.display().to_string());
    output::print_key_value("Designated member", &config.designated_member);

    output::print_step(1, 2, "Preparing unpacker");
    let unpacker = unpack::create_unpacker(config.unpacker)?;

    output::print_step(2, 2, "Generating embedded sources");
    let options = GenerateOptions {
        template: input.to_path_buf(),
        output_base: output_base.to_path_buf(),
        verify,
    };
    let report = pipeline::run(&options, &config, unpacker.as_ref())?;

    if !report.designated_present {
        output::print_warning(&format!(
            "template has no '{}'; its global is empty and there is no substitution branch",
            config.designated_member
        ));
    }

    output::print_success(&format!(
        "Embedded {} members ({} bytes)",
        report.member_count, report.total_bytes
    ));
    for (path, outcome) in [&report.source, &report.header] {
        output::print_outcome(path, *outcome);
    }

    Ok(())
}
