//! # Query Schedule
//!
//! The fixed, ordered list of symbols and structure fields the introspection
//! driver needs.
//!
//! The schedule is data rather than control flow: [`BASE_SCHEDULE`] is a
//! static slice of `(key, query)` pairs that the builder walks in order. The
//! order is the order keys appear in the generated header, so it must never
//! depend on anything but this slice.
//!
//! The process back-reference (`KTHREAD_Process`) and `KPCR_PrcbData` are not
//! listed here; they are produced by [`crate::fallback`].

use std::fmt;

/// A single debug-information query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query
{
    /// Address of a function or global data symbol
    Function
    {
        name: &'static str,
        required: bool,
    },
    /// Byte offset of a field inside a kernel structure
    Field
    {
        struct_name: &'static str,
        field_name: &'static str,
        required: bool,
    },
}

impl Query
{
    pub const fn required(self) -> bool
    {
        match self {
            Query::Function { required, .. } | Query::Field { required, .. } => required,
        }
    }
}

impl fmt::Display for Query
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Query::Function { name, .. } => write!(f, "{name}"),
            Query::Field {
                struct_name,
                field_name,
                ..
            } => write!(f, "{struct_name}.{field_name}"),
        }
    }
}

/// One row of the schedule: where a query's result is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry
{
    /// Record key the result is stored under
    pub key: &'static str,
    pub query: Query,
}

const fn function(name: &'static str) -> ScheduleEntry
{
    ScheduleEntry {
        key: name,
        query: Query::Function { name, required: true },
    }
}

const fn optional_function(name: &'static str) -> ScheduleEntry
{
    ScheduleEntry {
        key: name,
        query: Query::Function { name, required: false },
    }
}

const fn field(key: &'static str, struct_name: &'static str, field_name: &'static str) -> ScheduleEntry
{
    ScheduleEntry {
        key,
        query: Query::Field {
            struct_name,
            field_name,
            required: true,
        },
    }
}

/// Queries every kernel is expected to answer (optional entries excepted)
pub const BASE_SCHEDULE: &[ScheduleEntry] = &[
    // Driver unload and bugcheck hooks, debugger data block
    function("IopDeleteDriver"),
    function("KeBugCheck2"),
    function("KdDebuggerDataBlock"),
    optional_function("KdCopyDataBlock"),
    optional_function("KdpDataBlockEncoded"),
    // Process and module lists
    function("PsActiveProcessHead"),
    function("PsLoadedModuleList"),
    optional_function("PerfLogImageUnload"),
    function("ObpCreateHandle"),
    function("MmAccessFault"),
    field("EPROCESS_VadRoot", "EPROCESS", "VadRoot"),
    // Virtual memory syscalls
    function("NtAllocateVirtualMemory"),
    function("NtFreeVirtualMemory"),
    function("NtProtectVirtualMemory"),
    function("NtMapViewOfSection"),
    function("NtUnmapViewOfSection"),
    function("MiUnmapViewOfSection"),
    optional_function("KiInitialPCR"),
    field("KPRCB_ProcessorState", "KPRCB", "ProcessorState"),
    // Process list walking and accounting
    field("EPROCESS_ActiveProcessLinks", "EPROCESS", "ActiveProcessLinks"),
    field("EPROCESS_ThreadListHead", "EPROCESS", "ThreadListHead"),
    field("EPROCESS_UniqueProcessId", "EPROCESS", "UniqueProcessId"),
    field("EPROCESS_CommitCharge", "EPROCESS", "CommitCharge"),
    field("EPROCESS_VirtualSize", "EPROCESS", "VirtualSize"),
    field("EPROCESS_PeakVirtualSize", "EPROCESS", "PeakVirtualSize"),
    field("EPROCESS_CommitChargePeak", "EPROCESS", "CommitChargePeak"),
    field("EPROCESS_ExitStatus", "EPROCESS", "ExitStatus"),
    field("ETHREAD_ThreadListEntry", "ETHREAD", "ThreadListEntry"),
    field("ETHREAD_Cid", "ETHREAD", "Cid"),
    // Per-CPU and per-thread state
    field("KPRCB_CurrentThread", "KPRCB", "CurrentThread"),
    field("KPCR_Prcb", "KPCR", "Prcb"),
    field("KPCR_KdVersionBlock", "KPCR", "KdVersionBlock"),
    field("KTHREAD_StackBase", "KTHREAD", "StackBase"),
    field("KTHREAD_StackLimit", "KTHREAD", "StackLimit"),
    field("KPRCB_DpcStack", "KPRCB", "DpcStack"),
];

#[cfg(test)]
mod tests
{
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_schedule_keys_are_unique()
    {
        let mut seen = HashSet::new();
        for entry in BASE_SCHEDULE {
            assert!(seen.insert(entry.key), "duplicate key {}", entry.key);
        }
    }

    #[test]
    fn test_field_keys_follow_struct_field_naming()
    {
        for entry in BASE_SCHEDULE {
            if let Query::Field {
                struct_name,
                field_name,
                ..
            } = entry.query
            {
                assert_eq!(entry.key, format!("{struct_name}_{field_name}"));
            }
        }
    }

    #[test]
    fn test_schedule_leaves_fallback_keys_out()
    {
        assert!(BASE_SCHEDULE.iter().all(|e| e.key != "KTHREAD_Process"));
        assert!(BASE_SCHEDULE.iter().all(|e| e.key != "KPCR_PrcbData"));
    }

    #[test]
    fn test_optional_entries()
    {
        let optional: Vec<_> = BASE_SCHEDULE
            .iter()
            .filter(|e| !e.query.required())
            .map(|e| e.key)
            .collect();
        assert_eq!(
            optional,
            ["KdCopyDataBlock", "KdpDataBlockEncoded", "PerfLogImageUnload", "KiInitialPCR"]
        );
    }

    #[test]
    fn test_query_display()
    {
        assert_eq!(BASE_SCHEDULE[1].query.to_string(), "KeBugCheck2");
        assert_eq!(
            Query::Field {
                struct_name: "ETHREAD",
                field_name: "Cid",
                required: true
            }
            .to_string(),
            "ETHREAD.Cid"
        );
    }
}
