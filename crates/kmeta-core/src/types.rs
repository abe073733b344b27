//! # Types
//!
//! Plain data shared by the provider, resolver, builder and renderer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kernel product version as an ordered `(major, minor, build)` triple
///
/// Ordering is lexicographic, so `5.2.3790 < 6.0.6000 < 6.1.7601`.
///
/// ## Example
///
/// ```rust
/// use kmeta_core::types::KernelVersion;
///
/// let xp = KernelVersion::new(5, 1, 2600);
/// let win7 = KernelVersion::new(6, 1, 7601);
/// assert!(xp < win7);
/// assert_eq!(xp.to_string(), "5.1.2600");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32, u32)", into = "(u32, u32, u32)")]
pub struct KernelVersion
{
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl KernelVersion
{
    pub const fn new(major: u32, minor: u32, build: u32) -> Self
    {
        Self { major, minor, build }
    }
}

impl From<(u32, u32, u32)> for KernelVersion
{
    fn from((major, minor, build): (u32, u32, u32)) -> Self
    {
        Self::new(major, minor, build)
    }
}

impl From<KernelVersion> for (u32, u32, u32)
{
    fn from(version: KernelVersion) -> Self
    {
        (version.major, version.minor, version.build)
    }
}

impl fmt::Display for KernelVersion
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Pointer width of the kernel image the debug information describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth
{
    /// 32-bit (x86) kernel
    Bits32,
    /// 64-bit (x64) kernel
    Bits64,
}

impl PointerWidth
{
    /// Number of bits in a pointer (32 or 64)
    pub const fn bits(self) -> u8
    {
        match self {
            PointerWidth::Bits32 => 32,
            PointerWidth::Bits64 => 64,
        }
    }
}

impl TryFrom<u32> for PointerWidth
{
    type Error = u32;

    fn try_from(bits: u32) -> Result<Self, Self::Error>
    {
        match bits {
            32 => Ok(PointerWidth::Bits32),
            64 => Ok(PointerWidth::Bits64),
            other => Err(other),
        }
    }
}

impl fmt::Display for PointerWidth
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.bits())
    }
}

/// File-level metadata of an opened debug-information artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicInfo
{
    /// Kernel product version
    pub version: KernelVersion,
    /// Checksum of the kernel image the PDB was built for
    pub checksum: u32,
    /// Pointer width of the kernel image
    pub bits: PointerWidth,
}

/// Result of a single symbol or field query
///
/// `Absent` is only ever produced by optional queries. It is a distinct
/// state, so a field at offset `0` (`Present(0)`) is never confused with a
/// field that does not exist.
///
/// ## Example
///
/// ```rust
/// use kmeta_core::types::ResolvedValue;
///
/// let zero = ResolvedValue::Present(0);
/// assert!(zero.is_present());
/// assert_ne!(zero, ResolvedValue::Absent);
/// assert_eq!(ResolvedValue::Absent.value(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedValue
{
    /// Address or byte offset found in the debug information
    Present(u64),
    /// Optional query that found nothing
    Absent,
}

impl ResolvedValue
{
    pub const fn is_present(self) -> bool
    {
        matches!(self, ResolvedValue::Present(_))
    }

    /// The resolved number, or `None` for the absence marker
    pub const fn value(self) -> Option<u64>
    {
        match self {
            ResolvedValue::Present(value) => Some(value),
            ResolvedValue::Absent => None,
        }
    }
}

impl From<Option<u64>> for ResolvedValue
{
    fn from(value: Option<u64>) -> Self
    {
        value.map_or(ResolvedValue::Absent, ResolvedValue::Present)
    }
}

impl fmt::Display for ResolvedValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ResolvedValue::Present(value) => write!(f, "{value:#x}"),
            ResolvedValue::Absent => write!(f, "<absent>"),
        }
    }
}

impl Serialize for ResolvedValue
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ResolvedValue::Present(value) => serializer.serialize_u64(*value),
            ResolvedValue::Absent => serializer.serialize_none(),
        }
    }
}
