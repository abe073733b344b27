//! # Rendering
//!
//! Turning a finished [`MetadataRecord`] into the generated header.
//!
//! Rendering is the second of two stages: the builder produces an immutable
//! record, and a [`TemplateRenderer`] substitutes it into a [`Template`]. The
//! whole output is produced in memory, so a failing render never leaves a
//! partially written file behind.

mod placeholder;

use std::fs;
use std::path::Path;

pub use placeholder::PlaceholderRenderer;
use tracing::debug;

use crate::error::{KmetaError, KmetaResult};
use crate::record::MetadataRecord;

/// Name of the built-in introspection driver header template
pub const GENDRIVER: &str = "gendriver";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(GENDRIVER, include_str!("../../templates/gendriver.tpl"))];

/// Substitutes a record into a template
pub trait TemplateRenderer
{
    /// Render `template` with the values of `record`
    ///
    /// ## Errors
    ///
    /// [`KmetaError::TemplateKeyMissing`] when the template references a key
    /// the record lacks, [`KmetaError::TemplateSyntax`] for malformed templates.
    fn render(&self, template: &Template, record: &MetadataRecord) -> KmetaResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template
{
    name: String,
    source: String,
}

impl Template
{
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// A template compiled into the binary, by name
    pub fn builtin(name: &str) -> Option<Self>
    {
        BUILTIN_TEMPLATES
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(builtin, source)| Self::new(*builtin, *source))
    }

    /// Names of the built-in templates
    pub fn builtin_names() -> impl Iterator<Item = &'static str>
    {
        BUILTIN_TEMPLATES.iter().map(|(name, _)| *name)
    }

    /// Resolve a template identifier: a built-in name first, then a file path
    ///
    /// ## Errors
    ///
    /// [`KmetaError::UnknownTemplate`] if `id` is neither built in nor an
    /// existing file, [`KmetaError::Io`] if the file exists but cannot be read.
    pub fn load(id: &str) -> KmetaResult<Self>
    {
        if let Some(template) = Self::builtin(id) {
            debug!(template = id, "Using built-in template");
            return Ok(template);
        }

        let path = Path::new(id);
        if !path.is_file() {
            return Err(KmetaError::UnknownTemplate {
                name: id.to_string(),
                builtins: Self::builtin_names().collect::<Vec<_>>().join(", "),
            });
        }
        debug!(path = %path.display(), "Loading template file");
        Ok(Self::new(id, fs::read_to_string(path)?))
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn source(&self) -> &str
    {
        &self.source
    }
}
