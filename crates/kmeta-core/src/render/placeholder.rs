//! `{{ key | filter }}` placeholder renderer.
//!
//! Everything outside `{{ ... }}` is copied verbatim. Inside, a placeholder
//! names a record key or one of the basic info keys, optionally followed by a
//! single filter:
//!
//! | Placeholder                    | Output                                   |
//! |--------------------------------|------------------------------------------|
//! | `{{ KeBugCheck2 }}`            | `0xfffff80002a7e000` (`0` when absent)   |
//! | `{{ KTHREAD_Process \| dec }}` | `544`                                    |
//! | `{{ KdCopyDataBlock \| defined }}` | `1` or `0`                           |
//! | `{{ KPCR_PrcbData \| default(0) }}` | value, or `0` if missing or absent  |
//! | `{{ version }}`                | `6.1.7601`                               |
//! | `{{ version.major }}`          | `6`                                      |
//! | `{{ checksum }}`               | `0x5a3c1b2f`                             |
//! | `{{ bits }}`                   | `64`                                     |
//! | `{{ "{{" }}`                   | `{{`                                     |
//!
//! A quoted string is copied as-is, which is how a template spells a literal
//! `{{` (for example `= {{ "{{" }}0}};` renders `= {{0}};`). The string runs
//! to the next `"` and has no escape sequences.

use super::{Template, TemplateRenderer};
use crate::error::{KmetaError, KmetaResult};
use crate::record::MetadataRecord;
use crate::types::{KernelVersion, ResolvedValue};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer
{
    pub fn new() -> Self
    {
        Self
    }
}

impl TemplateRenderer for PlaceholderRenderer
{
    fn render(&self, template: &Template, record: &MetadataRecord) -> KmetaResult<String>
    {
        let mut out = String::with_capacity(template.source().len());
        let mut rest = template.source();
        let mut line = 1;

        while let Some(start) = rest.find("{{") {
            let (text, tail) = rest.split_at(start);
            out.push_str(text);
            line += text.matches('\n').count();

            let tail = &tail[2..];
            if let Some((text, consumed)) = string_literal(tail, line)? {
                out.push_str(text);
                line += tail[..consumed].matches('\n').count();
                rest = &tail[consumed..];
                continue;
            }

            let end = tail.find("}}").ok_or_else(|| syntax(line, "unterminated placeholder"))?;
            let expr = &tail[..end];
            out.push_str(&evaluate(expr.trim(), record, line)?);
            line += expr.matches('\n').count();
            rest = &tail[end + 2..];
        }
        out.push_str(rest);

        tracing::debug!(template = template.name(), bytes = out.len(), "Rendered template");
        Ok(out)
    }
}

/// What a placeholder name refers to
#[derive(Debug, Clone, Copy)]
enum Lookup
{
    Version(KernelVersion),
    VersionPart(u32),
    Checksum(u32),
    Bits(u8),
    Entry(ResolvedValue),
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter<'a>
{
    None,
    Hex,
    Dec,
    Defined,
    Default(&'a str),
}

fn syntax(line: usize, message: impl Into<String>) -> KmetaError
{
    KmetaError::TemplateSyntax {
        line,
        message: message.into(),
    }
}

/// A `"..."` placeholder body: the quoted text and the bytes consumed through the closing `}}`
fn string_literal(tail: &str, line: usize) -> KmetaResult<Option<(&str, usize)>>
{
    let Some(body) = tail.trim_start().strip_prefix('"') else {
        return Ok(None);
    };
    let close = body.find('"').ok_or_else(|| syntax(line, "unterminated string literal"))?;
    let after = body[close + 1..].trim_start();
    if !after.starts_with("}}") {
        return Err(syntax(line, "expected `}}` after string literal"));
    }
    Ok(Some((&body[..close], tail.len() - after.len() + 2)))
}

fn lookup(name: &str, record: &MetadataRecord) -> Lookup
{
    let info = record.info();
    match name {
        "version" => Lookup::Version(info.version),
        "version.major" => Lookup::VersionPart(info.version.major),
        "version.minor" => Lookup::VersionPart(info.version.minor),
        "version.build" => Lookup::VersionPart(info.version.build),
        "checksum" => Lookup::Checksum(info.checksum),
        "bits" => Lookup::Bits(info.bits.bits()),
        key => record.get(key).map_or(Lookup::Missing, Lookup::Entry),
    }
}

fn parse_filter(text: &str, line: usize) -> KmetaResult<Filter<'_>>
{
    match text {
        "hex" => Ok(Filter::Hex),
        "dec" => Ok(Filter::Dec),
        "defined" => Ok(Filter::Defined),
        _ => {
            let Some(argument) = text.strip_prefix("default(").and_then(|s| s.strip_suffix(')')) else {
                return Err(syntax(line, format!("unknown filter `{text}`")));
            };
            let argument = argument.trim();
            let valid = match argument.strip_prefix("0x") {
                Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
                None => !argument.is_empty() && argument.chars().all(|c| c.is_ascii_digit()),
            };
            if !valid {
                return Err(syntax(line, format!("default() needs a numeric literal, got `{argument}`")));
            }
            Ok(Filter::Default(argument))
        }
    }
}

fn evaluate(expr: &str, record: &MetadataRecord, line: usize) -> KmetaResult<String>
{
    let mut parts = expr.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default();
    if name.is_empty() {
        return Err(syntax(line, "empty placeholder"));
    }
    let filter = match parts.next() {
        Some(text) => parse_filter(text, line)?,
        None => Filter::None,
    };
    if parts.next().is_some() {
        return Err(syntax(line, format!("only one filter is allowed in `{expr}`")));
    }

    let value = lookup(name, record);
    let rendered = match (filter, value) {
        (Filter::Defined, Lookup::Entry(ResolvedValue::Absent) | Lookup::Missing) => "0".to_string(),
        (Filter::Defined, _) => "1".to_string(),

        (Filter::Default(fallback), Lookup::Entry(ResolvedValue::Absent) | Lookup::Missing) => fallback.to_string(),

        (_, Lookup::Missing) => return Err(KmetaError::TemplateKeyMissing(name.to_string())),
        (_, Lookup::Entry(ResolvedValue::Absent)) => "0".to_string(),

        (Filter::Dec, Lookup::Entry(ResolvedValue::Present(v))) => v.to_string(),
        (_, Lookup::Entry(ResolvedValue::Present(v))) => format!("{v:#x}"),

        (Filter::Hex, Lookup::Version(_)) | (Filter::Dec, Lookup::Version(_)) => {
            return Err(syntax(line, format!("`{name}` is not a number; use version.major/minor/build")));
        }
        (_, Lookup::Version(version)) => version.to_string(),

        (Filter::Hex, Lookup::VersionPart(v)) => format!("{v:#x}"),
        (_, Lookup::VersionPart(v)) => v.to_string(),

        (Filter::Dec, Lookup::Checksum(v)) => v.to_string(),
        (_, Lookup::Checksum(v)) => format!("{v:#010x}"),

        (Filter::Hex, Lookup::Bits(v)) => format!("{v:#x}"),
        (_, Lookup::Bits(v)) => v.to_string(),
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::builder::MetadataBuilder;
    use crate::provider::SymbolDump;
    use crate::schedule::{Query, ScheduleEntry};
    use crate::types::{BasicInfo, PointerWidth};

    const SCHEDULE: &[ScheduleEntry] = &[
        ScheduleEntry {
            key: "MmAccessFault",
            query: Query::Function {
                name: "MmAccessFault",
                required: true,
            },
        },
        ScheduleEntry {
            key: "KdCopyDataBlock",
            query: Query::Function {
                name: "KdCopyDataBlock",
                required: false,
            },
        },
        ScheduleEntry {
            key: "ETHREAD_Cid",
            query: Query::Field {
                struct_name: "ETHREAD",
                field_name: "Cid",
                required: true,
            },
        },
    ];

    fn record() -> MetadataRecord
    {
        let dump = SymbolDump::new(BasicInfo {
            version: KernelVersion::new(6, 1, 7601),
            checksum: 0x5a3c_1b2f,
            bits: PointerWidth::Bits64,
        })
        .with_function("MmAccessFault", 0xfffff800_02a7e000)
        .with_field("ETHREAD", "Cid", 0)
        .with_field("KTHREAD", "Process", 0x220);
        MetadataBuilder::new(&dump).with_schedule(SCHEDULE).build().unwrap()
    }

    fn render(source: &str) -> KmetaResult<String>
    {
        PlaceholderRenderer::new().render(&Template::new("test", source), &record())
    }

    #[test]
    fn test_plain_text_passthrough()
    {
        assert_eq!(render("no placeholders\n").unwrap(), "no placeholders\n");
    }

    #[test]
    fn test_default_formats()
    {
        let out = render("{{ MmAccessFault }} {{ ETHREAD_Cid }} {{ KTHREAD_Process }}").unwrap();
        assert_eq!(out, "0xfffff80002a7e000 0x0 0x220");
    }

    #[test]
    fn test_basic_info_keys()
    {
        let out = render("{{version}} {{ version.major }}.{{ version.minor }} {{ checksum }} {{ bits }}").unwrap();
        assert_eq!(out, "6.1.7601 6.1 0x5a3c1b2f 64");
    }

    #[test]
    fn test_filters()
    {
        assert_eq!(render("{{ KTHREAD_Process | dec }}").unwrap(), "544");
        assert_eq!(render("{{ bits | hex }}").unwrap(), "0x40");
        assert_eq!(render("{{ checksum | dec }}").unwrap(), "1513888559");
        assert_eq!(render("{{ KdCopyDataBlock | defined }}").unwrap(), "0");
        assert_eq!(render("{{ MmAccessFault | defined }}").unwrap(), "1");
    }

    #[test]
    fn test_absent_renders_as_zero()
    {
        assert_eq!(render("{{ KdCopyDataBlock }}").unwrap(), "0");
    }

    #[test]
    fn test_conditional_key_needs_default()
    {
        let err = render("{{ KPCR_PrcbData }}").unwrap_err();
        assert!(matches!(err, KmetaError::TemplateKeyMissing(key) if key == "KPCR_PrcbData"));
        assert_eq!(render("{{ KPCR_PrcbData | default(0x0) }}").unwrap(), "0x0");
        assert_eq!(render("{{ KPCR_PrcbData | defined }}").unwrap(), "0");
        assert_eq!(render("{{ ETHREAD_Cid | default(7) }}").unwrap(), "0x0");
    }

    #[test]
    fn test_string_literal_emits_braces()
    {
        let out = render("static KSPIN_LOCK g_Lock = {{ \"{{\" }}0}};\n#define P {{ KTHREAD_Process }}\n").unwrap();
        assert_eq!(out, "static KSPIN_LOCK g_Lock = {{0}};\n#define P 0x220\n");
        assert_eq!(render("{{\"}}\"}}").unwrap(), "}}");
        assert_eq!(render("{{ \"\" }}x").unwrap(), "x");
    }

    #[test]
    fn test_string_literal_errors()
    {
        let err = render("\n{{ \"{{ }}").unwrap_err();
        assert!(matches!(err, KmetaError::TemplateSyntax { line: 2, ref message } if message.contains("string")));
        let err = render("{{ \"a\" | hex }}").unwrap_err();
        assert!(matches!(err, KmetaError::TemplateSyntax { line: 1, .. }));
    }

    #[test]
    fn test_syntax_errors_report_line()
    {
        let err = render("line one\nline two {{ MmAccessFault").unwrap_err();
        assert!(matches!(err, KmetaError::TemplateSyntax { line: 2, .. }));

        let err = render("\n\n{{ MmAccessFault | upper }}").unwrap_err();
        assert!(matches!(err, KmetaError::TemplateSyntax { line: 3, ref message } if message.contains("upper")));

        assert!(matches!(render("{{ }}"), Err(KmetaError::TemplateSyntax { .. })));
        assert!(matches!(render("{{ bits | dec | hex }}"), Err(KmetaError::TemplateSyntax { .. })));
        assert!(matches!(render("{{ x | default(abc) }}"), Err(KmetaError::TemplateSyntax { .. })));
        assert!(matches!(render("{{ version | hex }}"), Err(KmetaError::TemplateSyntax { .. })));
    }
}
