//! # Error Types
//!
//! Error handling for metadata resolution and header rendering.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for kmeta operations
///
/// Every variant is fatal: the build aborts on the first error and no output
/// is written. Nothing is retried, since the symbol dump does not change
/// between attempts.
///
/// ## Error Categories
///
/// 1. **Resolution errors**: MissingRequiredSymbol, MissingRequiredField, ProcessFieldNotFound
/// 2. **Record errors**: DuplicateKey
/// 3. **Template errors**: TemplateKeyMissing, TemplateSyntax, UnknownTemplate
/// 4. **Input errors**: InvalidDump, Json
/// 5. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum KmetaError
{
    /// A required function-address query found nothing
    ///
    /// Usually means the symbol dump belongs to a kernel build that does not
    /// export (or no longer contains) the routine.
    #[error("Required symbol not found: {0}")]
    MissingRequiredSymbol(String),

    /// A required field-offset query found nothing
    #[error("Required field not found: {struct_name}.{field_name}")]
    MissingRequiredField
    {
        /// Kernel structure that was searched (without the leading underscore)
        struct_name: String,
        /// Field that is missing from the structure
        field_name: String,
    },

    /// Neither `KTHREAD.Process` nor `ETHREAD.ThreadsProcess` exists
    #[error("Could not find process field (tried KTHREAD.Process and ETHREAD.ThreadsProcess)")]
    ProcessFieldNotFound,

    /// The same key was inserted into a metadata record twice
    #[error("Duplicate metadata key: {0}")]
    DuplicateKey(String),

    /// A template referenced a key the record does not contain
    ///
    /// This points at a mismatch between the template and the schedule, not at
    /// a problem with the symbol dump. Conditional keys must be referenced
    /// through the `default(..)` or `defined` filters.
    #[error("Template references missing key: {0}")]
    TemplateKeyMissing(String),

    /// The template text could not be parsed
    #[error("Template syntax error on line {line}: {message}")]
    TemplateSyntax
    {
        /// 1-based line of the offending placeholder
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The template identifier is neither built in nor a readable file
    #[error("Unknown template: {name} (built-in templates: {builtins})")]
    UnknownTemplate
    {
        /// The identifier that was asked for
        name: String,
        /// Comma-separated names of the built-in templates
        builtins: String,
    },

    /// The symbol dump is structurally valid JSON but semantically wrong
    #[error("Invalid symbol dump: {0}")]
    InvalidDump(String),

    /// The symbol dump is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (reading dumps and templates)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, KmetaError>`
///
/// ```rust
/// use kmeta_core::error::KmetaResult;
/// fn foo() -> KmetaResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type KmetaResult<T> = std::result::Result<T, KmetaError>;
