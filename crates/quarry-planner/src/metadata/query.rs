//! Typed facade over a metadata provider

use crate::metadata::provider::{
    MetadataArg, MetadataValue, RelMetadataProvider, COLUMNS_UNIQUE, UNIQUE_KEYS,
};
use quarry_common::{QuarryError, Result};
use quarry_sql::{ColumnMask, LogicalPlan};
use std::collections::HashSet;

/// Entry point for asking metadata questions about a plan.
///
/// Every method returns `Ok(None)` when nothing is known, which is distinct
/// from a negative answer such as an empty key set or `Some(false)`.
#[derive(Clone, Copy)]
pub struct RelMetadataQuery<'a> {
    provider: &'a dyn RelMetadataProvider,
}

impl<'a> RelMetadataQuery<'a> {
    pub fn new(provider: &'a dyn RelMetadataProvider) -> Self {
        Self { provider }
    }

    /// Untyped access to any query the provider understands.
    pub fn metadata(
        &self,
        rel: &LogicalPlan,
        query: &str,
        args: &[MetadataArg],
    ) -> Result<Option<MetadataValue>> {
        self.provider.relational_metadata(self, rel, query, args)
    }

    /// Sets of output columns on which no two rows of `rel` agree.
    ///
    /// With `ignore_nulls` a key column may hold repeated nulls without
    /// breaking uniqueness.
    pub fn get_unique_keys(
        &self,
        rel: &LogicalPlan,
        ignore_nulls: bool,
    ) -> Result<Option<HashSet<ColumnMask>>> {
        match self.metadata(rel, UNIQUE_KEYS, &[MetadataArg::Bool(ignore_nulls)])? {
            None => Ok(None),
            Some(MetadataValue::ColumnMasks(keys)) => Ok(Some(keys)),
            Some(other) => Err(unexpected_value(UNIQUE_KEYS, &other)),
        }
    }

    /// Whether `columns` is provably unique in the output of `rel`.
    pub fn are_columns_unique(
        &self,
        rel: &LogicalPlan,
        columns: &ColumnMask,
        ignore_nulls: bool,
    ) -> Result<Option<bool>> {
        let args = [
            MetadataArg::ColumnMask(columns.clone()),
            MetadataArg::Bool(ignore_nulls),
        ];
        match self.metadata(rel, COLUMNS_UNIQUE, &args)? {
            None => Ok(None),
            Some(MetadataValue::Bool(unique)) => Ok(Some(unique)),
            Some(other) => Err(unexpected_value(COLUMNS_UNIQUE, &other)),
        }
    }
}

fn unexpected_value(query: &str, value: &MetadataValue) -> QuarryError {
    QuarryError::Metadata(format!(
        "query '{}' produced a value of the wrong kind: {:?}",
        query, value
    ))
}

/// Reads argument `index` as a boolean.
pub(crate) fn bool_arg(args: &[MetadataArg], index: usize) -> Result<bool> {
    match args.get(index) {
        Some(MetadataArg::Bool(value)) => Ok(*value),
        other => Err(QuarryError::Metadata(format!(
            "expected boolean argument at position {}, got {:?}",
            index, other
        ))),
    }
}

/// Reads argument `index` as a column mask.
pub(crate) fn mask_arg(args: &[MetadataArg], index: usize) -> Result<&ColumnMask> {
    match args.get(index) {
        Some(MetadataArg::ColumnMask(mask)) => Ok(mask),
        other => Err(QuarryError::Metadata(format!(
            "expected column mask argument at position {}, got {:?}",
            index, other
        ))),
    }
}
