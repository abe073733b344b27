//! Shared fixtures: fake kernels described as in-memory symbol dumps

#![allow(dead_code)]

use std::cell::RefCell;

use kmeta_core::provider::DebugInfoProvider;
use kmeta_core::schedule::{Query, BASE_SCHEDULE};
use kmeta_core::types::{BasicInfo, KernelVersion, PointerWidth};
use kmeta_core::SymbolDump;

pub const XP_SP3: KernelVersion = KernelVersion::new(5, 1, 2600);
pub const WIN7_SP1: KernelVersion = KernelVersion::new(6, 1, 7601);

/// A dump answering every scheduled query, both process field candidates and `KPCR.PrcbData`
///
/// Function `i` of the schedule lives at `0x8040_0000 + i * 0x100`, field `i`
/// sits at offset `i * 8`.
pub fn complete_dump(version: KernelVersion) -> SymbolDump
{
    let mut dump = SymbolDump::new(BasicInfo {
        version,
        checksum: 0x0020_3f2a,
        bits: PointerWidth::Bits32,
    });

    for (index, entry) in BASE_SCHEDULE.iter().enumerate() {
        let index = index as u64;
        dump = match entry.query {
            Query::Function { name, .. } => dump.with_function(name, 0x8040_0000 + index * 0x100),
            Query::Field {
                struct_name,
                field_name,
                ..
            } => dump.with_field(struct_name, field_name, index * 8),
        };
    }

    dump.with_field("_KTHREAD", "Process", 0x20)
        .with_field("_ETHREAD", "ThreadsProcess", 0x50)
        .with_field("_KPCR", "PrcbData", 0x120)
}

/// Number of required entries in the base schedule
pub fn required_count() -> usize
{
    BASE_SCHEDULE.iter().filter(|e| e.query.required()).count()
}

/// Wraps a provider and remembers every field lookup, in order
pub struct RecordingProvider<P>
{
    inner: P,
    fields: RefCell<Vec<(String, String)>>,
}

impl<P: DebugInfoProvider> RecordingProvider<P>
{
    pub fn new(inner: P) -> Self
    {
        Self {
            inner,
            fields: RefCell::new(Vec::new()),
        }
    }

    /// How many times `struct_name.field_name` was looked up
    pub fn field_queries(&self, struct_name: &str, field_name: &str) -> usize
    {
        self.fields
            .borrow()
            .iter()
            .filter(|(s, f)| s == struct_name && f == field_name)
            .count()
    }
}

impl<P: DebugInfoProvider> DebugInfoProvider for RecordingProvider<P>
{
    fn basic_info(&self) -> BasicInfo
    {
        self.inner.basic_info()
    }

    fn function_address(&self, name: &str) -> Option<u64>
    {
        self.inner.function_address(name)
    }

    fn field_offset(&self, struct_name: &str, field_name: &str) -> Option<u64>
    {
        self.fields
            .borrow_mut()
            .push((struct_name.to_string(), field_name.to_string()));
        self.inner.field_offset(struct_name, field_name)
    }
}
