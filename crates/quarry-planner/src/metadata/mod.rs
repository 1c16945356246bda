//! Relational metadata
//!
//! Derived facts about operators (unique keys, column uniqueness) computed on
//! demand by rules registered in [`HandlerTable`]s and reached through the
//! [`RelMetadataQuery`] facade.

pub mod column_uniqueness;
pub mod provider;
pub mod query;
pub mod unique_keys;
pub mod util;

pub use provider::{
    ArgType, ChainedProvider, HandlerTable, HandlerTableBuilder, MetadataArg, MetadataHandler,
    MetadataValue, RelMetadataProvider, COLUMNS_UNIQUE, UNIQUE_KEYS,
};
pub use query::RelMetadataQuery;
pub use util::find_equi_join_cols;

use quarry_common::{MetadataConfig, Result};
use std::sync::Arc;

/// Provider with every built-in rule set, ready to be extended with
/// [`ChainedProvider::push`] for operators defined elsewhere.
pub fn default_provider(config: &MetadataConfig) -> Result<ChainedProvider> {
    config.validate()?;
    let unique_keys = unique_keys::provider(config)?;
    let columns_unique = column_uniqueness::provider()?;
    tracing::info!(
        "Metadata provider ready (max unique key combinations: {})",
        config.max_unique_key_combinations
    );
    Ok(ChainedProvider::new(vec![
        Arc::new(unique_keys),
        Arc::new(columns_unique),
    ]))
}
