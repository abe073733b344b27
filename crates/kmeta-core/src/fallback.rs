//! # Fallback Policy
//!
//! Version-dependent rules layered on top of the base schedule.
//!
//! Kernel structure layouts are not ABI-stable across Windows releases. Two
//! kinds of drift are handled here, both expressed as tables so that adding a
//! release-specific rule means adding a row:
//!
//! - [`FallbackChain`]: a key whose field moved between structures. The
//!   candidates are tried in order and the first hit wins.
//! - [`VersionExtension`]: a key that only exists on some kernel versions.
//!
//! ## Process back-reference
//!
//! The thread → owning process pointer is `KTHREAD.Process` on most kernels
//! and `ETHREAD.ThreadsProcess` on older ones. Both are stored under
//! `KTHREAD_Process`; if neither exists the build fails with
//! [`KmetaError::ProcessFieldNotFound`].
//!
//! ## NT 5.x
//!
//! Major version 5 kernels embed the PRCB in the PCR, so `KPCR.PrcbData` is
//! additionally required and stored under `KPCR_PrcbData`.

use tracing::debug;

use crate::error::{KmetaError, KmetaResult};
use crate::provider::DebugInfoProvider;
use crate::record::MetadataRecord;
use crate::resolver::SymbolResolver;
use crate::schedule::{Query, ScheduleEntry};
use crate::types::{KernelVersion, ResolvedValue};

/// A structure field named by a fallback candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef
{
    pub struct_name: &'static str,
    pub field_name: &'static str,
}

/// Ordered candidates for a field that moved between structures
///
/// Every candidate except the last is queried as optional. The last one is
/// required; when it is missing too, `exhausted` builds the error.
#[derive(Debug, Clone, Copy)]
pub struct FallbackChain
{
    pub key: &'static str,
    pub candidates: &'static [FieldRef],
    pub exhausted: fn() -> KmetaError,
}

impl FallbackChain
{
    /// Resolve the first candidate that exists
    ///
    /// Candidates after the first hit are never queried.
    ///
    /// ## Errors
    ///
    /// The chain's `exhausted` error when no candidate exists.
    pub fn resolve<P: DebugInfoProvider + ?Sized>(&self, resolver: &SymbolResolver<'_, P>) -> KmetaResult<u64>
    {
        let Some((last, rest)) = self.candidates.split_last() else {
            return Err((self.exhausted)());
        };

        for candidate in rest {
            if let ResolvedValue::Present(offset) =
                resolver.resolve_field_offset(candidate.struct_name, candidate.field_name, false)?
            {
                debug!(key = self.key, structure = candidate.struct_name, field = candidate.field_name, "Fallback hit");
                return Ok(offset);
            }
        }

        match resolver.resolve_field_offset(last.struct_name, last.field_name, true) {
            Ok(ResolvedValue::Present(offset)) => {
                debug!(key = self.key, structure = last.struct_name, field = last.field_name, "Fallback hit");
                Ok(offset)
            }
            Ok(ResolvedValue::Absent) | Err(KmetaError::MissingRequiredField { .. }) => Err((self.exhausted)()),
            Err(other) => Err(other),
        }
    }
}

/// An extra query that only runs when `applies` accepts the kernel version
#[derive(Debug, Clone, Copy)]
pub struct VersionExtension
{
    /// Human-readable condition, shown by the schema
    pub condition: &'static str,
    pub applies: fn(KernelVersion) -> bool,
    pub entry: ScheduleEntry,
}

fn process_field_not_found() -> KmetaError
{
    KmetaError::ProcessFieldNotFound
}

fn is_nt5(version: KernelVersion) -> bool
{
    version.major == 5
}

/// Thread → owning process back-reference
pub const PROCESS_FIELD_FALLBACK: FallbackChain = FallbackChain {
    key: "KTHREAD_Process",
    candidates: &[
        FieldRef {
            struct_name: "KTHREAD",
            field_name: "Process",
        },
        FieldRef {
            struct_name: "ETHREAD",
            field_name: "ThreadsProcess",
        },
    ],
    exhausted: process_field_not_found,
};

pub const FALLBACK_CHAINS: &[FallbackChain] = &[PROCESS_FIELD_FALLBACK];

pub const VERSION_EXTENSIONS: &[VersionExtension] = &[VersionExtension {
    condition: "version.major == 5",
    applies: is_nt5,
    entry: ScheduleEntry {
        key: "KPCR_PrcbData",
        query: Query::Field {
            struct_name: "KPCR",
            field_name: "PrcbData",
            required: true,
        },
    },
}];

/// The full set of rules applied after the base schedule
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy
{
    pub chains: &'static [FallbackChain],
    pub extensions: &'static [VersionExtension],
}

impl Default for FallbackPolicy
{
    fn default() -> Self
    {
        Self {
            chains: FALLBACK_CHAINS,
            extensions: VERSION_EXTENSIONS,
        }
    }
}

impl FallbackPolicy
{
    /// Run every chain, then every extension whose predicate accepts the version
    ///
    /// ## Errors
    ///
    /// The first resolution error, or [`KmetaError::DuplicateKey`] if a rule
    /// targets a key the record already has.
    pub fn apply<P: DebugInfoProvider + ?Sized>(
        &self,
        resolver: &SymbolResolver<'_, P>,
        record: &mut MetadataRecord,
    ) -> KmetaResult<()>
    {
        for chain in self.chains {
            let offset = chain.resolve(resolver)?;
            record.insert(chain.key, ResolvedValue::Present(offset))?;
        }

        let version = record.info().version;
        for extension in self.extensions.iter().filter(|ext| (ext.applies)(version)) {
            debug!(key = extension.entry.key, condition = extension.condition, %version, "Applying version extension");
            let value = resolver.resolve(extension.entry.query)?;
            record.insert(extension.entry.key, value)?;
        }

        Ok(())
    }
}
