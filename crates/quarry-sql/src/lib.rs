//! Quarry SQL - scalar expressions and the logical operator tree

pub mod column_mask;
pub mod expr;
pub mod logical_plan;

pub use column_mask::ColumnMask;
pub use expr::{AggFunction, BinaryOperator, DynamicParam, Expr, Literal, UnaryOperator};
pub use logical_plan::{join_schema, ExtensionNode, JoinType, LogicalPlan, RelKind};
