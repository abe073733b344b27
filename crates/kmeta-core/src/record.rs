//! # Metadata Record
//!
//! The ordered key/value table produced by the builder and consumed by the
//! renderer.
//!
//! Keys are unique and keep their insertion order, which is the order the
//! header lists them in. Records are only filled inside this crate; once a
//! builder returns one it is read-only.

use std::fmt;

use serde::ser::SerializeMap;
use serde::Serialize;

use crate::error::{KmetaError, KmetaResult};
use crate::types::{BasicInfo, ResolvedValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord
{
    info: BasicInfo,
    entries: Vec<(String, ResolvedValue)>,
}

impl MetadataRecord
{
    pub(crate) fn new(info: BasicInfo) -> Self
    {
        Self {
            info,
            entries: Vec::new(),
        }
    }

    /// Append `key`, rejecting duplicates
    pub(crate) fn insert(&mut self, key: &str, value: ResolvedValue) -> KmetaResult<()>
    {
        if self.contains_key(key) {
            return Err(KmetaError::DuplicateKey(key.to_string()));
        }
        self.entries.push((key.to_string(), value));
        Ok(())
    }

    /// Version, checksum and pointer width captured before any query ran
    pub fn info(&self) -> BasicInfo
    {
        self.info
    }

    pub fn get(&self, key: &str) -> Option<ResolvedValue>
    {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, value)| *value)
    }

    pub fn contains_key(&self, key: &str) -> bool
    {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of resolved keys (version, checksum and bits are not counted)
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ResolvedValue)>
    {
        self.entries.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str>
    {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

/// Human-readable table, one `key = value` line per entry
impl fmt::Display for MetadataRecord
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let width = self
            .keys()
            .map(str::len)
            .chain(["checksum".len()])
            .max()
            .unwrap_or_default();

        writeln!(f, "{:<width$} = {}", "version", self.info.version)?;
        writeln!(f, "{:<width$} = {:#010x}", "checksum", self.info.checksum)?;
        writeln!(f, "{:<width$} = {}", "bits", self.info.bits)?;
        for (key, value) in self.iter() {
            writeln!(f, "{key:<width$} = {value}")?;
        }
        Ok(())
    }
}

/// JSON object in record order; absent values serialize as `null`
impl Serialize for MetadataRecord
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len() + 3))?;
        map.serialize_entry("version", &self.info.version)?;
        map.serialize_entry("checksum", &self.info.checksum)?;
        map.serialize_entry("bits", &self.info.bits.bits())?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
