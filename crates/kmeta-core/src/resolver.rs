//! # Symbol Resolver
//!
//! Typed facade over a [`DebugInfoProvider`] that applies the required /
//! optional distinction.
//!
//! A miss on an optional query becomes [`ResolvedValue::Absent`]; a miss on a
//! required query becomes an error naming the symbol or field. The resolver
//! never retries and keeps no state, so resolving the same query twice always
//! gives the same answer.

use tracing::trace;

use crate::error::{KmetaError, KmetaResult};
use crate::provider::DebugInfoProvider;
use crate::schedule::Query;
use crate::types::{BasicInfo, ResolvedValue};

pub struct SymbolResolver<'a, P: DebugInfoProvider + ?Sized>
{
    provider: &'a P,
}

impl<'a, P: DebugInfoProvider + ?Sized> SymbolResolver<'a, P>
{
    pub fn new(provider: &'a P) -> Self
    {
        Self { provider }
    }

    /// Version, checksum and pointer width; never fails
    pub fn basic_info(&self) -> BasicInfo
    {
        self.provider.basic_info()
    }

    /// Resolve the address of `name`
    ///
    /// ## Errors
    ///
    /// [`KmetaError::MissingRequiredSymbol`] if `required` and the symbol does not exist.
    pub fn resolve_function_address(&self, name: &str, required: bool) -> KmetaResult<ResolvedValue>
    {
        let found = self.provider.function_address(name);
        trace!(symbol = name, required, address = ?found, "Resolved function");
        match ResolvedValue::from(found) {
            ResolvedValue::Absent if required => Err(KmetaError::MissingRequiredSymbol(name.to_string())),
            value => Ok(value),
        }
    }

    /// Resolve the byte offset of `struct_name.field_name`
    ///
    /// ## Errors
    ///
    /// [`KmetaError::MissingRequiredField`] if `required` and the field does not exist.
    pub fn resolve_field_offset(
        &self,
        struct_name: &str,
        field_name: &str,
        required: bool,
    ) -> KmetaResult<ResolvedValue>
    {
        let found = self.provider.field_offset(struct_name, field_name);
        trace!(
            structure = struct_name,
            field = field_name,
            required,
            offset = ?found,
            "Resolved field"
        );
        match ResolvedValue::from(found) {
            ResolvedValue::Absent if required => Err(KmetaError::MissingRequiredField {
                struct_name: struct_name.to_string(),
                field_name: field_name.to_string(),
            }),
            value => Ok(value),
        }
    }

    /// Dispatch a scheduled query to the matching resolve operation
    ///
    /// ## Errors
    ///
    /// Same as [`Self::resolve_function_address`] and [`Self::resolve_field_offset`].
    pub fn resolve(&self, query: Query) -> KmetaResult<ResolvedValue>
    {
        match query {
            Query::Function { name, required } => self.resolve_function_address(name, required),
            Query::Field {
                struct_name,
                field_name,
                required,
            } => self.resolve_field_offset(struct_name, field_name, required),
        }
    }
}
