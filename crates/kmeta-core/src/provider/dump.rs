//! JSON symbol dump provider.
//!
//! A symbol dump is what an external PDB dumper emits for a kernel image:
//!
//! ```json
//! {
//!   "version": [6, 1, 7601],
//!   "checksum": "0x5a3c1b2f",
//!   "bits": 64,
//!   "functions": { "KeBugCheck2": "0xfffff80002a7e000" },
//!   "types": { "_KTHREAD": { "Process": 544 } }
//! }
//! ```
//!
//! Numbers are either JSON integers or `0x`-prefixed hex strings, since
//! 64-bit kernel addresses do not survive every JSON toolchain as integers.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::DebugInfoProvider;
use crate::error::{KmetaError, KmetaResult};
use crate::types::{BasicInfo, KernelVersion, PointerWidth};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DumpNumber
{
    Int(u64),
    Text(String),
}

impl DumpNumber
{
    fn parse(&self, what: &str) -> KmetaResult<u64>
    {
        match self {
            DumpNumber::Int(value) => Ok(*value),
            DumpNumber::Text(text) => {
                let trimmed = text.trim();
                let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => trimmed.parse::<u64>(),
                };
                parsed.map_err(|err| KmetaError::InvalidDump(format!("{what}: cannot parse {text:?}: {err}")))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDump
{
    version: KernelVersion,
    checksum: DumpNumber,
    bits: u32,
    #[serde(default)]
    functions: BTreeMap<String, DumpNumber>,
    #[serde(default)]
    types: BTreeMap<String, BTreeMap<String, DumpNumber>>,
}

/// In-memory symbol table for one kernel image
///
/// Built either from a JSON dump ([`SymbolDump::from_path`],
/// [`SymbolDump::from_json_str`]) or programmatically, which is how the
/// tests describe fake kernels.
///
/// ## Example
///
/// ```rust
/// use kmeta_core::provider::{DebugInfoProvider, SymbolDump};
/// use kmeta_core::types::{BasicInfo, KernelVersion, PointerWidth};
///
/// let dump = SymbolDump::new(BasicInfo {
///     version: KernelVersion::new(6, 1, 7601),
///     checksum: 0x5a3c_1b2f,
///     bits: PointerWidth::Bits64,
/// })
/// .with_function("KeBugCheck2", 0xfffff800_02a7e000)
/// .with_field("_KTHREAD", "Process", 0x220);
///
/// assert_eq!(dump.field_offset("KTHREAD", "Process"), Some(0x220));
/// assert_eq!(dump.function_address("MmAccessFault"), None);
/// ```
#[derive(Debug, Clone)]
pub struct SymbolDump
{
    info: BasicInfo,
    functions: HashMap<String, u64>,
    types: HashMap<String, HashMap<String, u64>>,
}

impl SymbolDump
{
    /// Empty dump carrying only file metadata
    pub fn new(info: BasicInfo) -> Self
    {
        Self {
            info,
            functions: HashMap::new(),
            types: HashMap::new(),
        }
    }

    /// Add (or replace) a function address
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>, address: u64) -> Self
    {
        self.functions.insert(name.into(), address);
        self
    }

    /// Add (or replace) a field offset; a leading underscore on the structure name is dropped
    #[must_use]
    pub fn with_field(mut self, struct_name: &str, field_name: impl Into<String>, offset: u64) -> Self
    {
        self.types
            .entry(normalize_struct_name(struct_name).to_string())
            .or_default()
            .insert(field_name.into(), offset);
        self
    }

    /// Remove a function, returning whether it was present
    pub fn remove_function(&mut self, name: &str) -> bool
    {
        self.functions.remove(name).is_some()
    }

    /// Remove a field, returning whether it was present
    pub fn remove_field(&mut self, struct_name: &str, field_name: &str) -> bool
    {
        self.types
            .get_mut(normalize_struct_name(struct_name))
            .is_some_and(|fields| fields.remove(field_name).is_some())
    }

    /// Parse a dump from JSON text
    ///
    /// ## Errors
    ///
    /// - [`KmetaError::Json`] if the text is not a dump document
    /// - [`KmetaError::InvalidDump`] for bad numbers, a pointer width other
    ///   than 32 or 64, a checksum wider than 32 bits, or a field listed twice
    ///   with different offsets
    pub fn from_json_str(text: &str) -> KmetaResult<Self>
    {
        let raw: RawDump = serde_json::from_str(text)?;

        let bits = PointerWidth::try_from(raw.bits)
            .map_err(|bits| KmetaError::InvalidDump(format!("bits must be 32 or 64, got {bits}")))?;
        let checksum = raw.checksum.parse("checksum")?;
        let checksum = u32::try_from(checksum)
            .map_err(|_| KmetaError::InvalidDump(format!("checksum {checksum:#x} does not fit in 32 bits")))?;

        let mut dump = Self::new(BasicInfo {
            version: raw.version,
            checksum,
            bits,
        });

        for (name, address) in &raw.functions {
            let address = address.parse(name)?;
            dump.functions.insert(name.clone(), address);
        }

        for (struct_name, fields) in &raw.types {
            let normalized = normalize_struct_name(struct_name).to_string();
            for (field_name, offset) in fields {
                let offset = offset.parse(&format!("{struct_name}.{field_name}"))?;
                let slot = dump.types.entry(normalized.clone()).or_default();
                match slot.insert(field_name.clone(), offset) {
                    Some(previous) if previous != offset => {
                        return Err(KmetaError::InvalidDump(format!(
                            "{normalized}.{field_name} listed with conflicting offsets {previous:#x} and {offset:#x}"
                        )));
                    }
                    _ => {}
                }
            }
        }

        debug!(
            version = %dump.info.version,
            functions = dump.functions.len(),
            types = dump.types.len(),
            "Loaded symbol dump"
        );
        Ok(dump)
    }

    /// Read and parse a dump file
    ///
    /// ## Errors
    ///
    /// [`KmetaError::Io`] if the file cannot be read, otherwise the same
    /// errors as [`SymbolDump::from_json_str`].
    pub fn from_path(path: &Path) -> KmetaResult<Self>
    {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

impl DebugInfoProvider for SymbolDump
{
    fn basic_info(&self) -> BasicInfo
    {
        self.info
    }

    fn function_address(&self, name: &str) -> Option<u64>
    {
        self.functions.get(name).copied()
    }

    fn field_offset(&self, struct_name: &str, field_name: &str) -> Option<u64>
    {
        self.types
            .get(normalize_struct_name(struct_name))
            .and_then(|fields| fields.get(field_name))
            .copied()
    }
}

fn normalize_struct_name(name: &str) -> &str
{
    name.strip_prefix('_').unwrap_or(name)
}
