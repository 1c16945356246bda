//! Sargable predicates
//!
//! Range representations of scalar predicates, used to decide which index
//! ranges a scan has to visit.

pub mod analyzer;
pub mod endpoint;
pub mod factory;
pub mod interval;
pub mod interval_expr;

pub use analyzer::{RangeCondition, SargAnalyzer};
pub use endpoint::{BoundRole, Coordinate, Endpoint, SargDomain, Strictness};
pub use factory::SargFactory;
pub use interval::{Interval, SargIntervalSequence};
pub use interval_expr::{SargExpr, SargIntervalBuilder, SargIntervalExpr};
