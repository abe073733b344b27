//! Tests for rendering the built-in header template

mod common;

use common::{complete_dump, WIN7_SP1, XP_SP3};
use kmeta_core::render::{PlaceholderRenderer, Template, TemplateRenderer, GENDRIVER};
use kmeta_core::schema::{schema, KeyPresence};
use kmeta_core::{KmetaError, MetadataBuilder};

fn render_gendriver(dump: &kmeta_core::SymbolDump) -> String
{
    let record = MetadataBuilder::new(dump).build().unwrap();
    let template = Template::load(GENDRIVER).unwrap();
    PlaceholderRenderer::new().render(&template, &record).unwrap()
}

#[test]
fn test_gendriver_renders_for_nt6()
{
    let header = render_gendriver(&complete_dump(WIN7_SP1));
    assert!(header.contains("Kernel 6.1.7601 (32-bit), checksum 0x00203f2a"));
    assert!(header.contains("g_KernelInfo_0x00203f2a"));
    assert!(header.contains(".Version = { 6, 1, 7601 },"));
    assert!(header.contains(".KTHREAD_Process = 0x20,"));
    assert!(header.contains(".KPCR_PrcbData = 0,"));
    assert!(header.contains(".PointerSize = 32 / 8,"));
    assert!(!header.contains("{{"));
}

#[test]
fn test_gendriver_renders_prcb_data_for_nt5()
{
    let header = render_gendriver(&complete_dump(XP_SP3));
    assert!(header.contains(".KPCR_PrcbData = 0x120,"));
}

#[test]
fn test_gendriver_renders_absent_optionals_as_null()
{
    let mut dump = complete_dump(WIN7_SP1);
    dump.remove_function("KdpDataBlockEncoded");
    let header = render_gendriver(&dump);
    assert!(header.contains(".KdpDataBlockEncoded = 0,"));
    assert!(header.contains(".HasEncodedDataBlock = 0,"));
}

#[test]
fn test_render_is_byte_identical()
{
    let dump = complete_dump(XP_SP3);
    assert_eq!(render_gendriver(&dump), render_gendriver(&dump));
}

#[test]
fn test_gendriver_uses_conditional_keys_safely()
{
    // Every conditional key must go through default() or defined in the built-in template.
    let source = Template::builtin(GENDRIVER).unwrap().source().to_string();
    for entry in schema() {
        if let KeyPresence::Conditional(_) = entry.presence {
            let bare = format!("{{{{ {} }}}}", entry.key);
            assert!(!source.contains(&bare), "{} referenced without a filter", entry.key);
        }
    }
}

#[test]
fn test_custom_template_missing_key()
{
    let record = MetadataBuilder::new(&complete_dump(WIN7_SP1)).build().unwrap();
    let template = Template::new("custom", "#define PRCB_DATA {{ KPCR_PrcbData }}\n");
    let err = PlaceholderRenderer::new().render(&template, &record).unwrap_err();
    assert!(matches!(err, KmetaError::TemplateKeyMissing(key) if key == "KPCR_PrcbData"));
}
