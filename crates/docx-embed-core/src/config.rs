//! Generator configuration.
//!
//! Every field has a default matching the names the downstream C library
//! expects, so a config file is only needed to retarget the generated code.
//!
//! ```json
//! {
//!   "designated_member": "word/document.xml",
//!   "symbol_prefix": "extract_docx_",
//!   "writer_header": "../zip.h",
//!   "unpacker": "library"
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};

/// Member whose content can be replaced at runtime.
pub const DEFAULT_DESIGNATED_MEMBER: &str = "word/document.xml";

/// Which collaborator extracts the template archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnpackerKind {
    /// In-process extraction with the `zip` crate.
    #[default]
    Library,
    /// The system `unzip` binary.
    Unzip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Archive name of the member that receives the substitution branch.
    pub designated_member: String,
    /// Prefix for every generated C symbol.
    pub symbol_prefix: String,
    /// C type of the archive handle passed to the generated function.
    pub handle_type: String,
    /// Collaborator function that writes one member into the archive.
    pub writer_function: String,
    /// Header declaring `handle_type` and `writer_function`.
    pub writer_header: String,
    /// Include guard of the generated header.
    pub include_guard: String,
    pub unpacker: UnpackerKind,
    /// Also reject spaces in paths, not only quotes and `..`.
    pub strict_paths: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            designated_member: DEFAULT_DESIGNATED_MEMBER.into(),
            symbol_prefix: "extract_docx_".into(),
            handle_type: "extract_zip_t".into(),
            writer_function: "extract_zip_write_file".into(),
            writer_header: "../zip.h".into(),
            include_guard: "EXTRACT_DOCX_TEMPLATE_H".into(),
            unpacker: UnpackerKind::Library,
            strict_paths: true,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| EmbedError::ConfigNotFound {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|source| EmbedError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            anyhow::Error::new(e).context(format!("failed to serialize config for {}", path.display()))
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that the derived C names are usable in the generated code.
    ///
    /// The generated function uses `zip`, `e`, `text` and `end` itself, so
    /// the caller-buffer parameter may not take any of those names, nor the
    /// name of anything it has to call.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: String| -> Result<()> {
            Err(EmbedError::InvalidConfig { field, reason })
        };

        for (field, name) in [
            ("symbol_prefix", self.function_name()),
            ("handle_type", self.handle_type.clone()),
            ("writer_function", self.writer_function.clone()),
        ] {
            if !is_c_identifier(&name) {
                return invalid(field, format!("'{name}' is not a C identifier"));
            }
            if C_KEYWORDS.contains(&name.as_str()) {
                return invalid(field, format!("'{name}' is a C keyword"));
            }
        }

        let ident = self.designated_ident();
        let length = format!("{ident}_length");
        let function = self.function_name();
        let taken = [
            "zip",
            "e",
            "text",
            "end",
            "sizeof",
            function.as_str(),
            self.writer_function.as_str(),
            self.handle_type.as_str(),
        ];
        for name in [&ident, &length] {
            if taken.contains(&name.as_str()) || C_KEYWORDS.contains(&name.as_str()) {
                return invalid(
                    "designated_member",
                    format!("derived parameter '{name}' collides with a name in the generated function"),
                );
            }
        }
        if function == self.writer_function {
            return invalid(
                "symbol_prefix",
                format!("generated function '{function}' would call itself"),
            );
        }
        Ok(())
    }

    /// C identifier derived from the designated member name,
    /// e.g. `word/document.xml` -> `word_document_xml`.
    pub fn designated_ident(&self) -> String {
        c_identifier(&self.designated_member)
    }

    /// Global buffer holding the designated member's original content.
    pub fn designated_symbol(&self) -> String {
        format!("{}{}", self.symbol_prefix, self.designated_ident())
    }

    /// The generated re-assembly function.
    pub fn function_name(&self) -> String {
        format!("{}write", self.symbol_prefix)
    }
}

/// C keywords, which can never be used as generated names.
const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary",
];

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace every byte that cannot appear in a C identifier with `_`.
pub fn c_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
