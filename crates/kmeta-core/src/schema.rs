//! # Record Schema
//!
//! Which keys a record can contain and under which conditions.
//!
//! Templates may only reference [`KeyPresence::Always`] and
//! [`KeyPresence::Optional`] keys directly. [`KeyPresence::Conditional`] keys
//! can be missing from the record entirely, so templates must go through the
//! `default(..)` or `defined` filters to use them.

use std::fmt;

use crate::fallback::FallbackPolicy;
use crate::schedule::{ScheduleEntry, BASE_SCHEDULE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPresence
{
    /// Always in the record with a present value
    Always,
    /// Always in the record, but may hold the absence marker
    Optional,
    /// Only in the record when the condition holds
    Conditional(&'static str),
}

impl fmt::Display for KeyPresence
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            KeyPresence::Always => write!(f, "always"),
            KeyPresence::Optional => write!(f, "optional"),
            KeyPresence::Conditional(condition) => write!(f, "if {condition}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry
{
    pub key: &'static str,
    /// Where the value comes from (`KeBugCheck2`, `EPROCESS.VadRoot`, ...)
    pub source: String,
    pub presence: KeyPresence,
}

/// Schema of the keys produced by `schedule` plus `policy`, in production order
///
/// The first three entries are the basic info keys every template can use.
pub fn schema_for(schedule: &[ScheduleEntry], policy: &FallbackPolicy) -> Vec<SchemaEntry>
{
    let mut entries = vec![
        SchemaEntry {
            key: "version",
            source: "basic info".to_string(),
            presence: KeyPresence::Always,
        },
        SchemaEntry {
            key: "checksum",
            source: "basic info".to_string(),
            presence: KeyPresence::Always,
        },
        SchemaEntry {
            key: "bits",
            source: "basic info".to_string(),
            presence: KeyPresence::Always,
        },
    ];

    entries.extend(schedule.iter().map(|entry| SchemaEntry {
        key: entry.key,
        source: entry.query.to_string(),
        presence: if entry.query.required() {
            KeyPresence::Always
        } else {
            KeyPresence::Optional
        },
    }));

    entries.extend(policy.chains.iter().map(|chain| SchemaEntry {
        key: chain.key,
        source: chain
            .candidates
            .iter()
            .map(|c| format!("{}.{}", c.struct_name, c.field_name))
            .collect::<Vec<_>>()
            .join(" | "),
        presence: KeyPresence::Always,
    }));

    entries.extend(policy.extensions.iter().map(|ext| SchemaEntry {
        key: ext.entry.key,
        source: ext.entry.query.to_string(),
        presence: KeyPresence::Conditional(ext.condition),
    }));

    entries
}

/// Schema of the standard schedule and policy
pub fn schema() -> Vec<SchemaEntry>
{
    schema_for(BASE_SCHEDULE, &FallbackPolicy::default())
}
