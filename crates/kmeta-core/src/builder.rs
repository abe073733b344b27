//! # Metadata Builder
//!
//! Runs the query schedule against a provider and assembles the
//! [`MetadataRecord`].
//!
//! ## Build steps
//!
//! 1. Read the basic info (version, checksum, pointer width).
//! 2. Run every [`BASE_SCHEDULE`] entry in order. The first required miss
//!    aborts the build.
//! 3. Apply the [`FallbackPolicy`] (process back-reference, then version
//!    extensions).
//!
//! All three steps run inside [`MetadataBuilder::build`], so a caller either
//! gets a complete record or an error; there is no half-filled record.
//! [`MetadataBuilder::build_base`] stops after step 2 and exists purely for
//! inspection.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use kmeta_core::builder::MetadataBuilder;
//! use kmeta_core::provider::SymbolDump;
//!
//! # fn example() -> kmeta_core::KmetaResult<()> {
//! let dump = SymbolDump::from_path(Path::new("ntkrnlmp.json"))?;
//! let record = MetadataBuilder::new(&dump).build()?;
//! println!("{record}");
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info, info_span};

use crate::error::KmetaResult;
use crate::fallback::FallbackPolicy;
use crate::provider::DebugInfoProvider;
use crate::record::MetadataRecord;
use crate::resolver::SymbolResolver;
use crate::schedule::{ScheduleEntry, BASE_SCHEDULE};

pub struct MetadataBuilder<'a, P: DebugInfoProvider + ?Sized>
{
    resolver: SymbolResolver<'a, P>,
    schedule: &'static [ScheduleEntry],
    policy: FallbackPolicy,
}

impl<'a, P: DebugInfoProvider + ?Sized> MetadataBuilder<'a, P>
{
    /// Builder using the standard schedule and fallback policy
    pub fn new(provider: &'a P) -> Self
    {
        Self {
            resolver: SymbolResolver::new(provider),
            schedule: BASE_SCHEDULE,
            policy: FallbackPolicy::default(),
        }
    }

    /// Replace the base schedule
    #[must_use]
    pub fn with_schedule(mut self, schedule: &'static [ScheduleEntry]) -> Self
    {
        self.schedule = schedule;
        self
    }

    /// Replace the fallback policy
    #[must_use]
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self
    {
        self.policy = policy;
        self
    }

    /// Run the basic info step and the base schedule only
    ///
    /// The result has no `KTHREAD_Process` and no version extensions. It is a
    /// debugging aid for looking at what the dump answers before fallback
    /// rules run; do not render it.
    ///
    /// ## Errors
    ///
    /// The first required query that misses.
    pub fn build_base(&self) -> KmetaResult<MetadataRecord>
    {
        let info = self.resolver.basic_info();
        let mut record = MetadataRecord::new(info);

        for entry in self.schedule {
            let value = self.resolver.resolve(entry.query)?;
            record.insert(entry.key, value)?;
        }

        Ok(record)
    }

    /// Build the complete record
    ///
    /// ## Errors
    ///
    /// - [`crate::KmetaError::MissingRequiredSymbol`] / [`crate::KmetaError::MissingRequiredField`]
    ///   for the first required query that misses
    /// - [`crate::KmetaError::ProcessFieldNotFound`] when no process back-reference exists
    pub fn build(&self) -> KmetaResult<MetadataRecord>
    {
        let info = self.resolver.basic_info();
        let span = info_span!("build", version = %info.version, checksum = info.checksum, bits = %info.bits);
        let _guard = span.enter();

        let mut record = self.build_base()?;
        debug!("Base metadata before fallback rules:\n{record}");

        self.policy.apply(&self.resolver, &mut record)?;

        let absent = record.iter().filter(|(_, value)| !value.is_present()).count();
        info!(keys = record.len(), absent, "Metadata record complete");
        Ok(record)
    }
}
