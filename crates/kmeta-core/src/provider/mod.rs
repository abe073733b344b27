//! # Debug Information Provider
//!
//! The interface the resolver uses to query a kernel's debug information.
//!
//! Opening a PDB, walking its symbol streams and computing checksums are not
//! done here. A provider only answers three questions about an artifact that
//! somebody else has already opened:
//!
//! - What are the kernel version, checksum and pointer width?
//! - At which address does a named function or global live?
//! - At which byte offset does a field live inside a named structure?
//!
//! ## Why use a trait?
//!
//! The builder is written against the trait so that tests can feed it an
//! in-memory [`SymbolDump`] and the CLI can feed it one loaded from disk. A
//! native PDB reader can be plugged in later without touching the builder.

mod dump;

pub use dump::SymbolDump;

use crate::types::BasicInfo;

/// Answers symbol-address and field-offset queries for one kernel image
///
/// Implementations must be deterministic: asking the same question twice
/// returns the same answer. "Not found" is `None`, never an error; whether a
/// miss is fatal is decided by the caller.
pub trait DebugInfoProvider
{
    /// Version, checksum and pointer width of the artifact
    fn basic_info(&self) -> BasicInfo;

    /// Address of a function or global data symbol
    fn function_address(&self, name: &str) -> Option<u64>;

    /// Byte offset of `field_name` inside `struct_name`
    ///
    /// Structure names are given without the leading underscore that PDB
    /// type names carry (`KTHREAD`, not `_KTHREAD`).
    fn field_offset(&self, struct_name: &str, field_name: &str) -> Option<u64>;
}

impl<P: DebugInfoProvider + ?Sized> DebugInfoProvider for &P
{
    fn basic_info(&self) -> BasicInfo
    {
        (**self).basic_info()
    }

    fn function_address(&self, name: &str) -> Option<u64>
    {
        (**self).function_address(name)
    }

    fn field_offset(&self, struct_name: &str, field_name: &str) -> Option<u64>
    {
        (**self).field_offset(struct_name, field_name)
    }
}
