//! # kmeta-core
//!
//! Resolves Windows kernel symbols and structure-field offsets from a kernel
//! symbol dump and assembles them into the ordered metadata table used to
//! generate the introspection driver header.
//!
//! The crate is organised along the data flow:
//!
//! - [`provider`]: the [`DebugInfoProvider`] trait and the JSON-backed [`SymbolDump`]
//! - [`resolver`]: required / optional query semantics
//! - [`schedule`]: the fixed, ordered list of queries
//! - [`fallback`]: version-dependent rules (process back-reference, NT 5.x)
//! - [`builder`]: runs everything and produces a [`MetadataRecord`]
//! - [`render`]: substitutes a record into a header template
//!
//! Building and rendering are separate stages connected by the immutable
//! record, so a failed build never reaches the renderer.

pub mod builder;
pub mod error;
pub mod fallback;
pub mod prelude;
pub mod provider;
pub mod record;
pub mod render;
pub mod resolver;
pub mod schedule;
pub mod schema;
pub mod types;

pub use builder::MetadataBuilder;
// Re-export commonly used types
pub use error::{KmetaError, KmetaResult};
pub use provider::{DebugInfoProvider, SymbolDump};
pub use record::MetadataRecord;
pub use types::{BasicInfo, KernelVersion, PointerWidth, ResolvedValue};
