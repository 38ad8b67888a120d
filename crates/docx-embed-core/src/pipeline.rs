//! The generation pipeline: unpack → enumerate → synthesize → write → cleanup.

use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::archive::{read_archive_members, ZipArchiveWriter};
use crate::codegen::{self, GeneratedArtifact, GenerationContext, ReassemblyPlan};
use crate::config::GeneratorConfig;
use crate::error::{EmbedError, Result};
use crate::members::{self, Member};
use crate::unpack::Unpacker;
use crate::writer::{stage_if_changed, WriteOutcome};

/// Which characters make a path unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPolicy {
    /// Reject quotes, `..` and spaces.
    Strict,
    /// Reject quotes and `..` only.
    Relaxed,
}

impl PathPolicy {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        if config.strict_paths {
            Self::Strict
        } else {
            Self::Relaxed
        }
    }
}

/// Fail with [`EmbedError::UnsafePath`] if `path` violates `policy`.
pub fn check_path(role: &'static str, path: &Path, policy: PathPolicy) -> Result<()> {
    let text = path.to_string_lossy();
    let reason = if text.contains('"') {
        Some("contains a double quote")
    } else if text.contains('\'') {
        Some("contains a single quote")
    } else if text.contains("..") {
        Some("contains '..'")
    } else if policy == PathPolicy::Strict && text.contains(' ') {
        Some("contains a space")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(EmbedError::UnsafePath {
            role,
            path: text.into_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// What to generate.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Template archive to embed.
    pub template: PathBuf,
    /// Outputs go to `<output_base>.c` and `<output_base>.h`.
    pub output_base: PathBuf,
    /// Check that the embedded data reproduces the template before writing.
    pub verify: bool,
}

/// Summary of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub member_count: usize,
    pub total_bytes: usize,
    pub designated_present: bool,
    pub source: (PathBuf, WriteOutcome),
    pub header: (PathBuf, WriteOutcome),
}

/// `path` with `suffix` appended to its last component.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Scratch directory used to unpack `template`.
pub fn scratch_dir_for(template: &Path) -> PathBuf {
    with_suffix(template, ".dir")
}

/// Paths of the generated source and header for `output_base`.
pub fn output_paths(output_base: &Path) -> (PathBuf, PathBuf) {
    (with_suffix(output_base, ".c"), with_suffix(output_base, ".h"))
}

/// Removes the scratch directory when dropped.
struct ScratchDir {
    path: PathBuf,
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

/// Remove a scratch directory left over from an earlier run.
fn remove_stale(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed stale scratch directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove stale scratch directory"
        ),
    }
}

/// Generate `<output_base>.c` and `<output_base>.h` from the template archive.
///
/// Paths are validated before anything else happens. If unpacking fails the
/// run aborts and the scratch directory is left for the next run to clear;
/// after a successful unpack it is removed however the run ends. Both outputs
/// are staged before either is replaced, so a failed run leaves the previous
/// pair in place.
pub fn run(
    options: &GenerateOptions,
    config: &GeneratorConfig,
    unpacker: &dyn Unpacker,
) -> Result<GenerationReport> {
    let policy = PathPolicy::from_config(config);
    check_path("input", &options.template, policy)?;
    check_path("output", &options.output_base, policy)?;
    if options.output_base.file_name().is_none() {
        return Err(EmbedError::Usage(format!(
            "output base {} has no file name",
            options.output_base.display()
        )));
    }

    let scratch = scratch_dir_for(&options.template);
    remove_stale(&scratch);

    tracing::info!(
        template = %options.template.display(),
        scratch = %scratch.display(),
        unpacker = unpacker.name(),
        "unpacking template"
    );
    unpacker.unpack(&options.template, &scratch)?;
    let _scratch = ScratchDir {
        path: scratch.clone(),
    };

    let members = members::enumerate(&scratch)?;
    let total_bytes: usize = members.iter().map(|m| m.content.len()).sum();
    tracing::info!(members = members.len(), bytes = total_bytes, "enumerated members");

    let ctx = GenerationContext::for_output(config, &options.output_base);
    let artifact = codegen::synthesize(&members, &ctx)?;
    let designated_present = members.iter().any(|m| m.name == config.designated_member);

    if options.verify {
        verify_reassembly(&artifact, &members, config)?;
        tracing::info!("generated source reproduces the template");
    }

    let (source_path, header_path) = output_paths(&options.output_base);
    let staged_source = stage_if_changed(&artifact.source, &source_path)?;
    let staged_header = stage_if_changed(&artifact.header, &header_path)?;
    let source_outcome = staged_source.commit()?;
    let header_outcome = staged_header.commit()?;
    tracing::info!(
        source = source_outcome.as_str(),
        header = header_outcome.as_str(),
        "generated files persisted"
    );

    Ok(GenerationReport {
        member_count: members.len(),
        total_bytes,
        designated_present,
        source: (source_path, source_outcome),
        header: (header_path, header_outcome),
    })
}

/// Check that the literals in the generated source reproduce `members`.
///
/// Decodes every member write and the designated global from
/// `artifact.source`, compares them in order with the unpacked members, then
/// replays the decoded writes into a zip and reads that back.
pub fn verify_reassembly(
    artifact: &GeneratedArtifact,
    members: &[Member],
    config: &GeneratorConfig,
) -> Result<()> {
    let embedded = codegen::decode_source(&artifact.source, config)?;

    if embedded.writes.len() != members.len() {
        return Err(EmbedError::VerificationFailed(format!(
            "{} members embedded, {} expected",
            embedded.writes.len(),
            members.len()
        )));
    }
    for (write, member) in embedded.writes.iter().zip(members) {
        if write.name != member.name {
            return Err(EmbedError::VerificationFailed(format!(
                "found '{}' where '{}' was expected",
                write.name, member.name
            )));
        }
        if write.content != member.content {
            return Err(EmbedError::VerificationFailed(format!(
                "content of '{}' differs",
                member.name
            )));
        }
        if write.substitutable != (member.name == config.designated_member) {
            return Err(EmbedError::VerificationFailed(format!(
                "substitution branch misplaced at '{}'",
                member.name
            )));
        }
    }

    let designated = members
        .iter()
        .find(|m| m.name == config.designated_member)
        .map(|m| m.content.as_slice())
        .unwrap_or_default();
    if embedded.designated_global != designated {
        return Err(EmbedError::VerificationFailed(format!(
            "global buffer for '{}' differs",
            config.designated_member
        )));
    }

    let decoded: Vec<Member> = embedded
        .writes
        .into_iter()
        .map(|w| Member::new(w.name, w.content))
        .collect();
    let to_archive_error = |source| EmbedError::Archive {
        path: PathBuf::from("<re-assembled>"),
        source,
    };
    let plan = ReassemblyPlan::new(&decoded, &config.designated_member);
    let mut writer = ZipArchiveWriter::new(Cursor::new(Vec::new()));
    plan.replay(&mut writer, None).map_err(to_archive_error)?;
    let bytes = writer.finish().map_err(to_archive_error)?.into_inner();
    let rebuilt = read_archive_members(Cursor::new(bytes)).map_err(to_archive_error)?;

    if rebuilt != members {
        return Err(EmbedError::VerificationFailed(
            "re-assembled archive differs from the template".into(),
        ));
    }
    Ok(())
}
