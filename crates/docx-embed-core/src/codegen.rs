//! Synthesis of the generated C header and source.
//!
//! The source file has three parts, in order:
//!
//! 1. the preamble (marker comment and header include),
//! 2. the designated member's original content as a global constant buffer
//!    plus its length (empty if the template lacks that member),
//! 3. the re-assembly function, which writes every member in enumeration
//!    order and substitutes the caller's buffer for the designated member
//!    when one is supplied.
//!
//! The function body is derived from a [`ReassemblyPlan`]. The same plan can
//! be [replayed](ReassemblyPlan::replay) against any [`ArchiveWriter`], which
//! is how the generated semantics are verified from Rust. [`decode_source`]
//! reads the literals back out of the generated text.

use std::path::Path;

use crate::archive::ArchiveWriter;
use crate::config::GeneratorConfig;
use crate::error::{EmbedError, Result};
use crate::escape::{escape, unescape};
use crate::members::Member;
use crate::templates::embedded;
use crate::templates::renderer::TemplateRenderer;

/// Indentation of the lines inside the generated function.
const INDENT: &str = "    ";

/// Inputs to [`synthesize`] besides the member list.
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub config: &'a GeneratorConfig,
    /// File name the generated source uses to include the generated header.
    pub header_name: String,
}

impl<'a> GenerationContext<'a> {
    /// Context for outputs written to `<output_base>.c` / `<output_base>.h`.
    pub fn for_output(config: &'a GeneratorConfig, output_base: &Path) -> Self {
        let stem = output_base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            config,
            header_name: format!("{stem}.h"),
        }
    }
}

/// The two generated text buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub source: String,
    pub header: String,
}

/// One member write performed by the generated function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep<'a> {
    /// Always writes the embedded content.
    Fixed { name: &'a str, content: &'a [u8] },
    /// Writes the caller's buffer if supplied, the embedded content otherwise.
    Substitutable { name: &'a str, content: &'a [u8] },
}

impl<'a> WriteStep<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Fixed { name, .. } | Self::Substitutable { name, .. } => *name,
        }
    }

    pub fn content(&self) -> &'a [u8] {
        match self {
            Self::Fixed { content, .. } | Self::Substitutable { content, .. } => *content,
        }
    }
}

/// Ordered member writes of the re-assembly function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassemblyPlan<'a> {
    steps: Vec<WriteStep<'a>>,
}

impl<'a> ReassemblyPlan<'a> {
    /// Build the plan for `members`, marking the one named `designated`.
    pub fn new(members: &'a [Member], designated: &str) -> Self {
        let steps = members
            .iter()
            .map(|m| {
                if m.name == designated {
                    WriteStep::Substitutable {
                        name: m.name.as_str(),
                        content: m.content.as_slice(),
                    }
                } else {
                    WriteStep::Fixed {
                        name: m.name.as_str(),
                        content: m.content.as_slice(),
                    }
                }
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[WriteStep<'a>] {
        &self.steps
    }

    /// Original content of the designated member, if the template has one.
    pub fn designated(&self) -> Option<&'a [u8]> {
        self.steps.iter().find_map(|step| match step {
            WriteStep::Substitutable { content, .. } => Some(*content),
            WriteStep::Fixed { .. } => None,
        })
    }

    /// Perform the writes exactly as the generated function does.
    ///
    /// Stops at the first failing write and returns its error; no later
    /// member is written. On success returns the number of members written.
    pub fn replay<W: ArchiveWriter + ?Sized>(
        &self,
        writer: &mut W,
        substitute: Option<&[u8]>,
    ) -> std::result::Result<usize, W::Error> {
        for step in &self.steps {
            let bytes = match (step, substitute) {
                (WriteStep::Substitutable { .. }, Some(replacement)) => replacement,
                _ => step.content(),
            };
            writer.write_member(step.name(), bytes)?;
        }
        Ok(self.steps.len())
    }
}

/// Ordered text fragments joined once at the end.
#[derive(Debug, Default)]
struct Fragments {
    parts: Vec<String>,
}

impl Fragments {
    fn push(&mut self, text: impl Into<String>) {
        self.parts.push(text.into());
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.parts.push(format!("{}\n", text.as_ref()));
    }

    fn join(self) -> String {
        self.parts.concat()
    }
}

/// Build the generated header and source for `members`.
pub fn synthesize(members: &[Member], ctx: &GenerationContext<'_>) -> Result<GeneratedArtifact> {
    let config = ctx.config;
    config.validate()?;
    let renderer = TemplateRenderer::new();
    let data = serde_json::json!({
        "include_guard": config.include_guard,
        "writer_header": config.writer_header,
        "handle_type": config.handle_type,
        "function_name": config.function_name(),
        "designated_member": config.designated_member,
        "designated_ident": config.designated_ident(),
        "designated_symbol": config.designated_symbol(),
        "header_name": ctx.header_name,
    });

    let header = renderer.render(embedded::HEADER, &data)?;
    let preamble = renderer.render(embedded::SOURCE_PREAMBLE, &data)?;

    let plan = ReassemblyPlan::new(members, &config.designated_member);
    if plan.designated().is_none() {
        tracing::warn!(
            member = %config.designated_member,
            "template has no designated member; global left empty, no substitution branch"
        );
    }

    let mut source = Fragments::default();
    source.push(preamble);
    write_designated_global(&mut source, config, plan.designated().unwrap_or_default());
    write_function(&mut source, config, &plan);

    Ok(GeneratedArtifact {
        source: source.join(),
        header,
    })
}

fn write_designated_global(out: &mut Fragments, config: &GeneratorConfig, content: &[u8]) {
    let symbol = config.designated_symbol();
    out.line(format!("const char {symbol}[] = {};", escape(content)));
    out.line(format!(
        "const int  {symbol}_length = sizeof({symbol}) - 1;"
    ));
    out.line("");
}

fn write_function(out: &mut Fragments, config: &GeneratorConfig, plan: &ReassemblyPlan<'_>) {
    let ident = config.designated_ident();
    out.line(format!(
        "int {}({}* zip, const char* {ident}, int {ident}_length)",
        config.function_name(),
        config.handle_type,
    ));
    out.line("{");
    out.line(format!("{INDENT}int e = -1;"));

    for step in plan.steps() {
        let name = escape(step.name().as_bytes());
        match step {
            WriteStep::Substitutable { .. } => {
                out.line(format!("{INDENT}if ({ident}) {{"));
                out.line(format!(
                    "{INDENT}{INDENT}if ({}(zip, {ident}, {ident}_length, {name})) goto end;",
                    config.writer_function,
                ));
                out.line(format!("{INDENT}}}"));
                out.line(format!("{INDENT}else {{"));
            }
            WriteStep::Fixed { .. } => out.line(format!("{INDENT}{{")),
        }
        out.line(format!(
            "{INDENT}{INDENT}static const char text[] = {}",
            escape(step.content())
        ));
        out.line("                ;");
        out.line(format!(
            "{INDENT}{INDENT}if ({}(zip, text, sizeof(text)-1, {name})) goto end;",
            config.writer_function,
        ));
        out.line(format!("{INDENT}}}"));
        out.line(INDENT);
    }

    out.line(format!("{INDENT}e = 0;"));
    out.line(format!("{INDENT}end:"));
    out.line(format!("{INDENT}return e;"));
    out.line("}");
}

/// One member write recovered from generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedWrite {
    pub name: String,
    pub content: Vec<u8>,
    /// Guarded by the caller-buffer branch.
    pub substitutable: bool,
}

/// Everything the generated source embeds, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedSource {
    pub designated_global: Vec<u8>,
    pub writes: Vec<EmbeddedWrite>,
}

/// Byte length of the run of adjacent string literals `text` starts with.
fn literal_run_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 0;
    loop {
        i += 1;
        loop {
            match *bytes.get(i)? {
                b'\\' => i += 2,
                b'"' => {
                    i += 1;
                    break;
                }
                _ => i += 1,
            }
        }
        let end = i;
        while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'"') {
            return Some(end);
        }
    }
}

/// Decode the literal run at `offset`, returning its bytes and end offset.
fn literal_at(source: &str, offset: usize, what: &'static str) -> Result<(Vec<u8>, usize)> {
    let len = literal_run_len(&source[offset..]).ok_or(EmbedError::MalformedLiteral {
        offset,
        reason: what,
    })?;
    let bytes = unescape(&source[offset..offset + len])?;
    Ok((bytes, offset + len))
}

/// Recover the global buffer and every member write from generated source.
///
/// Reads the text [`synthesize`] produced for `config`; anything that does
/// not have that shape is reported as [`EmbedError::MalformedLiteral`].
pub fn decode_source(source: &str, config: &GeneratorConfig) -> Result<EmbeddedSource> {
    let ident = config.designated_ident();
    let global_marker = format!("\nconst char {}[] = ", config.designated_symbol());
    let text_marker = "static const char text[] = ";
    let text_call = format!("{}(zip, text, sizeof(text)-1, ", config.writer_function);
    let branch = format!("if ({ident}) {{");

    let global_at = source
        .find(&global_marker)
        .ok_or(EmbedError::MalformedLiteral {
            offset: 0,
            reason: "designated global not found",
        })?
        + global_marker.len();
    let (designated_global, global_end) = literal_at(source, global_at, "designated global")?;
    if !source[global_end..].starts_with(';') {
        return Err(EmbedError::MalformedLiteral {
            offset: global_end,
            reason: "designated global not terminated",
        });
    }

    let mut writes = Vec::new();
    let mut pos = global_end;
    while let Some(found) = source[pos..].find(text_marker) {
        let block_start = pos;
        let (content, content_end) =
            literal_at(source, pos + found + text_marker.len(), "member content")?;

        let call_at = source[content_end..]
            .find(&text_call)
            .ok_or(EmbedError::MalformedLiteral {
                offset: content_end,
                reason: "member write call not found",
            })?
            + content_end
            + text_call.len();
        let (name, name_end) = literal_at(source, call_at, "member name")?;
        if !source[name_end..].starts_with(")) goto end;") {
            return Err(EmbedError::MalformedLiteral {
                offset: name_end,
                reason: "member write call not terminated",
            });
        }
        let name = String::from_utf8(name).map_err(|_| EmbedError::MalformedLiteral {
            offset: call_at,
            reason: "member name is not UTF-8",
        })?;

        let preceding = &source[block_start..pos + found];
        let substitute_call = format!(
            "{}(zip, {ident}, {ident}_length, {})) goto end;",
            config.writer_function,
            escape(name.as_bytes())
        );
        let substitutable = preceding.contains(&branch) && preceding.contains(&substitute_call);

        writes.push(EmbeddedWrite {
            name,
            content,
            substitutable,
        });
        pos = name_end;
    }

    Ok(EmbeddedSource {
        designated_global,
        writes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::unescape;

    fn template_members() -> Vec<Member> {
        vec![
            Member::new("[Content_Types].xml", b"<?xml version=\"1.0\"?>\n<Types/>".to_vec()),
            Member::new("_rels/.rels", b"<Relationships/>".to_vec()),
            Member::new("word/document.xml", b"<w:document>\n<w:body/>\n</w:document>".to_vec()),
            Member::new("word/styles.xml", Vec::new()),
        ]
    }

    fn generate(members: &[Member]) -> GeneratedArtifact {
        let config = GeneratorConfig::default();
        let ctx = GenerationContext::for_output(&config, Path::new("src/docx_template"));
        synthesize(members, &ctx).unwrap()
    }

    /// Decode every `static const char text[]` literal in generation order.
    fn embedded_literals(source: &str) -> Vec<Vec<u8>> {
        decode_source(source, &GeneratorConfig::default())
            .unwrap()
            .writes
            .into_iter()
            .map(|w| w.content)
            .collect()
    }

    /// Records every write; optionally fails on the n-th (1-indexed) call.
    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<(String, Vec<u8>)>,
        calls: usize,
        fail_on: Option<usize>,
    }

    impl ArchiveWriter for RecordingWriter {
        type Error = String;

        fn write_member(&mut self, name: &str, bytes: &[u8]) -> std::result::Result<(), String> {
            self.calls += 1;
            if self.fail_on == Some(self.calls) {
                return Err(format!("short write on {name}"));
            }
            self.writes.push((name.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_header_declarations() {
        let artifact = generate(&template_members());
        let header = &artifact.header;
        assert!(header.starts_with("#ifndef EXTRACT_DOCX_TEMPLATE_H\n#define EXTRACT_DOCX_TEMPLATE_H\n"));
        assert!(header.contains("/* THIS IS AUTO-GENERATED CODE, DO NOT EDIT. */"));
        assert!(header.contains("#include \"../zip.h\""));
        assert!(header.contains("extern const char extract_docx_word_document_xml[];"));
        assert!(header.contains("extern const int  extract_docx_word_document_xml_length;"));
        assert!(header.contains(
            "int extract_docx_write(extract_zip_t* zip, const char* word_document_xml, int word_document_xml_length);"
        ));
        assert!(header.trim_end().ends_with("#endif"));
    }

    #[test]
    fn test_source_preamble_and_global() {
        let artifact = generate(&template_members());
        let source = &artifact.source;
        assert!(source.starts_with(
            "/* THIS IS AUTO-GENERATED CODE, DO NOT EDIT. */\n\n#include \"docx_template.h\"\n"
        ));
        assert!(source.contains(
            "const char extract_docx_word_document_xml[] = \"<w:document>\\n\"\n                \"<w:body/>\\n\"\n                \"</w:document>\";\n"
        ));
        assert!(source.contains(
            "const int  extract_docx_word_document_xml_length = sizeof(extract_docx_word_document_xml) - 1;"
        ));
        // Global precedes the function.
        let global = source.find("const char extract_docx_word_document_xml[]").unwrap();
        let function = source.find("int extract_docx_write(").unwrap();
        assert!(global < function);
    }

    #[test]
    fn test_source_substitution_branch() {
        let artifact = generate(&template_members());
        let source = &artifact.source;
        assert!(source.contains(
            "    if (word_document_xml) {\n        if (extract_zip_write_file(zip, word_document_xml, word_document_xml_length, \"word/document.xml\")) goto end;\n    }\n    else {\n"
        ));
        assert_eq!(source.matches("if (word_document_xml)").count(), 1);
        assert!(source.contains(
            "if (extract_zip_write_file(zip, text, sizeof(text)-1, \"_rels/.rels\")) goto end;"
        ));
        assert!(source.trim_end().ends_with("    e = 0;\n    end:\n    return e;\n}"));
    }

    #[test]
    fn test_source_literals_reproduce_members_in_order() {
        let members = template_members();
        let artifact = generate(&members);
        let literals = embedded_literals(&artifact.source);
        let expected: Vec<Vec<u8>> = members.iter().map(|m| m.content.clone()).collect();
        assert_eq!(literals, expected);

        let positions: Vec<usize> = members
            .iter()
            .map(|m| artifact.source.find(&format!("\"{}\")) goto end;", m.name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_without_designated_member() {
        let members = vec![Member::new("xl/workbook.xml", b"<workbook/>".to_vec())];
        let artifact = generate(&members);
        assert!(!artifact.source.contains("if (word_document_xml)"));
        assert_eq!(artifact.source.matches("goto end;").count(), 1);
        // Header surface is unchanged and every extern is still defined.
        assert!(artifact.header.contains("extern const char extract_docx_word_document_xml[];"));
        assert!(artifact.header.contains("extern const int  extract_docx_word_document_xml_length;"));
        assert!(artifact
            .source
            .contains("const char extract_docx_word_document_xml[] = \"\";\n"));
        assert!(artifact.source.contains(
            "const int  extract_docx_word_document_xml_length = sizeof(extract_docx_word_document_xml) - 1;"
        ));
    }

    #[test]
    fn test_no_members_still_returns_success() {
        let artifact = generate(&[]);
        assert!(artifact.source.contains("int e = -1;\n    e = 0;\n    end:\n    return e;\n}"));
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let members = template_members();
        assert_eq!(generate(&members), generate(&members));
    }

    #[test]
    fn test_custom_config_names() {
        let config = GeneratorConfig {
            designated_member: "xl/sharedStrings.xml".into(),
            symbol_prefix: "xlsx_".into(),
            writer_header: "archive.h".into(),
            ..GeneratorConfig::default()
        };
        let members = vec![Member::new("xl/sharedStrings.xml", b"<sst/>".to_vec())];
        let ctx = GenerationContext::for_output(&config, Path::new("gen/xlsx_template"));
        let artifact = synthesize(&members, &ctx).unwrap();
        assert!(artifact.header.contains("int xlsx_write(extract_zip_t* zip, const char* xl_sharedStrings_xml, int xl_sharedStrings_xml_length);"));
        assert!(artifact.source.contains("#include \"xlsx_template.h\""));
        assert!(artifact.source.contains("const char xlsx_xl_sharedStrings_xml[] = \"<sst/>\";"));
    }

    #[test]
    fn test_member_names_are_escaped() {
        let members = vec![Member::new("odd\"name.xml", b"x".to_vec())];
        let artifact = generate(&members);
        assert!(artifact.source.contains("\"odd\\\"name.xml\")) goto end;"));
    }

    #[test]
    fn test_replay_without_substitute_reproduces_template() {
        let members = template_members();
        let plan = ReassemblyPlan::new(&members, "word/document.xml");
        let mut writer = RecordingWriter::default();

        let written = plan.replay(&mut writer, None).unwrap();

        assert_eq!(written, members.len());
        let expected: Vec<(String, Vec<u8>)> =
            members.iter().map(|m| (m.name.clone(), m.content.clone())).collect();
        assert_eq!(writer.writes, expected);
    }

    #[test]
    fn test_replay_with_substitute_replaces_only_designated() {
        let members = template_members();
        let plan = ReassemblyPlan::new(&members, "word/document.xml");
        let mut writer = RecordingWriter::default();
        let replacement = b"<w:document><w:body><w:p/></w:body></w:document>";

        plan.replay(&mut writer, Some(replacement)).unwrap();

        assert_eq!(writer.writes.len(), members.len());
        for ((name, bytes), member) in writer.writes.iter().zip(&members) {
            assert_eq!(name, &member.name);
            if member.name == "word/document.xml" {
                assert_eq!(bytes.as_slice(), replacement);
            } else {
                assert_eq!(bytes, &member.content);
            }
        }
    }

    #[test]
    fn test_replay_stops_at_first_failure() {
        let members = template_members();
        let plan = ReassemblyPlan::new(&members, "word/document.xml");

        for k in 1..=members.len() {
            let mut writer = RecordingWriter {
                fail_on: Some(k),
                ..RecordingWriter::default()
            };
            let result = plan.replay(&mut writer, None);
            assert!(result.is_err());
            assert_eq!(writer.calls, k);
            assert_eq!(writer.writes.len(), k - 1);
        }
    }

    #[test]
    fn test_plan_designated_lookup() {
        let members = template_members();
        let plan = ReassemblyPlan::new(&members, "word/document.xml");
        assert_eq!(plan.designated(), Some(members[2].content.as_slice()));
        assert!(ReassemblyPlan::new(&members, "missing.xml").designated().is_none());
    }

    #[test]
    fn test_decode_source_recovers_every_write() {
        let members = template_members();
        let artifact = generate(&members);

        let embedded = decode_source(&artifact.source, &GeneratorConfig::default()).unwrap();

        assert_eq!(embedded.designated_global, members[2].content);
        let recovered: Vec<(&str, &[u8], bool)> = embedded
            .writes
            .iter()
            .map(|w| (w.name.as_str(), w.content.as_slice(), w.substitutable))
            .collect();
        let expected: Vec<(&str, &[u8], bool)> = members
            .iter()
            .map(|m| (m.name.as_str(), m.content.as_slice(), m.name == "word/document.xml"))
            .collect();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn test_decode_source_handles_awkward_names_and_bytes() {
        let members = vec![
            Member::new("odd\"name\\x.xml", b"goto end;\")) goto end;\n\0??=".to_vec()),
            Member::new("word/document.xml", vec![0, 1, 2, b'\n', 0xff]),
        ];
        let artifact = generate(&members);

        let embedded = decode_source(&artifact.source, &GeneratorConfig::default()).unwrap();

        assert_eq!(embedded.writes.len(), 2);
        assert_eq!(embedded.writes[0].name, members[0].name);
        assert_eq!(embedded.writes[0].content, members[0].content);
        assert!(!embedded.writes[0].substitutable);
        assert_eq!(embedded.writes[1].content, members[1].content);
        assert!(embedded.writes[1].substitutable);
    }

    #[test]
    fn test_decode_source_rejects_truncated_text() {
        let artifact = generate(&template_members());
        let cut = artifact.source.find("static const char text[] = ").unwrap() + 30;
        let result = decode_source(&artifact.source[..cut], &GeneratorConfig::default());
        assert!(matches!(result, Err(EmbedError::MalformedLiteral { .. })));

        let result = decode_source("int x;\n", &GeneratorConfig::default());
        assert!(matches!(result, Err(EmbedError::MalformedLiteral { .. })));
    }

    #[test]
    fn test_colliding_config_is_rejected() {
        let config = GeneratorConfig {
            designated_member: "zip".into(),
            ..GeneratorConfig::default()
        };
        let ctx = GenerationContext::for_output(&config, Path::new("out"));
        let result = synthesize(&template_members(), &ctx);
        assert!(matches!(result, Err(EmbedError::InvalidConfig { .. })));
    }
}
