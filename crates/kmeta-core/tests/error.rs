//! Tests for error handling

use kmeta_core::error::{KmetaError, KmetaResult};

#[test]
fn test_missing_symbol_display()
{
    let error = KmetaError::MissingRequiredSymbol("IopDeleteDriver".to_string());
    let message = format!("{}", error);
    assert!(message.contains("IopDeleteDriver"));
    assert!(message.contains("not found"));
}

#[test]
fn test_missing_field_display()
{
    let error = KmetaError::MissingRequiredField {
        struct_name: "ETHREAD".to_string(),
        field_name: "Cid".to_string(),
    };
    assert_eq!(error.to_string(), "Required field not found: ETHREAD.Cid");
}

#[test]
fn test_process_field_display()
{
    let message = KmetaError::ProcessFieldNotFound.to_string();
    assert!(message.contains("KTHREAD.Process"));
    assert!(message.contains("ETHREAD.ThreadsProcess"));
}

#[test]
fn test_template_errors_display()
{
    let missing = KmetaError::TemplateKeyMissing("KPCR_PrcbData".to_string());
    assert!(missing.to_string().contains("KPCR_PrcbData"));

    let syntax = KmetaError::TemplateSyntax {
        line: 12,
        message: "unterminated placeholder".to_string(),
    };
    assert_eq!(syntax.to_string(), "Template syntax error on line 12: unterminated placeholder");
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: KmetaError = io.into();
    assert!(matches!(error, KmetaError::Io(_)));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: KmetaResult<()> = Ok(());
    let _error_result: KmetaResult<()> = Err(KmetaError::ProcessFieldNotFound);
}
