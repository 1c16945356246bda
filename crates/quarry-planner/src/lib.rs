//! Quarry Planner - Relational metadata derivation and sargable range analysis

pub mod metadata;
pub mod sarg;

pub use metadata::{
    default_provider, ArgType, ChainedProvider, HandlerTable, HandlerTableBuilder, MetadataArg,
    MetadataHandler, MetadataValue, RelMetadataProvider, RelMetadataQuery,
};
pub use sarg::{
    BoundRole, Coordinate, Endpoint, Interval, SargAnalyzer, SargDomain, SargExpr, SargFactory,
    SargIntervalBuilder, SargIntervalExpr, SargIntervalSequence, Strictness,
};
