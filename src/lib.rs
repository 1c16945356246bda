//! Quarry - relational metadata derivation and sargable interval analysis

pub use quarry_common as common;
pub use quarry_planner as planner;
pub use quarry_sql as sql;
