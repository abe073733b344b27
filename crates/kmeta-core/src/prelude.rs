//! Common module for library exports

pub use crate::builder::MetadataBuilder;
pub use crate::error::{KmetaError, KmetaResult};
pub use crate::provider::{DebugInfoProvider, SymbolDump};
pub use crate::record::MetadataRecord;
pub use crate::render::{PlaceholderRenderer, Template, TemplateRenderer};
pub use crate::types::{BasicInfo, KernelVersion, PointerWidth, ResolvedValue};
