//! Logical Query Plan representation

use crate::column_mask::ColumnMask;
use crate::expr::{Expr, Literal};
use arrow_schema::{Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Logical Query Plan
///
/// Plans are built by the planner and only read by the analyses in this
/// workspace; nothing here mutates a tree in place.
#[derive(Debug, Clone)]
pub enum LogicalPlan {
    /// Scan a table; `unique_keys` are the keys declared in the catalog
    Scan {
        table_name: String,
        schema: SchemaRef,
        unique_keys: Vec<ColumnMask>,
    },

    /// Inline rows
    Values {
        schema: SchemaRef,
        rows: Vec<Vec<Literal>>,
    },

    /// Filter rows
    Filter {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },

    /// Project columns
    Project {
        input: Box<LogicalPlan>,
        expr: Vec<Expr>,
        schema: SchemaRef,
    },

    /// Aggregate data; output is the grouping columns followed by the aggregates
    Aggregate {
        input: Box<LogicalPlan>,
        /// Input ordinals of the grouping columns. They become output columns
        /// `0..group_set.len()`, so keys derived here are in output positions.
        group_set: ColumnMask,
        aggregate_expr: Vec<Expr>,
        schema: SchemaRef,
    },

    /// Sort data
    Sort {
        input: Box<LogicalPlan>,
        expr: Vec<Expr>,
    },

    /// Limit rows
    Limit {
        input: Box<LogicalPlan>,
        limit: usize,
        offset: usize,
    },

    /// Join two relations; the condition refers to the concatenated row
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        condition: Expr,
        schema: SchemaRef,
    },

    /// Keep left rows that have a match on the right; outputs left columns only
    SemiJoin {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        condition: Expr,
    },

    /// Re-evaluate `right` once per `left` row with the correlation variable bound
    Correlate {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        correlation_id: usize,
        schema: SchemaRef,
    },

    /// Union relations
    Union {
        inputs: Vec<LogicalPlan>,
        all: bool,
        schema: SchemaRef,
    },

    /// Operator contributed from outside this crate
    Extension { node: Arc<dyn ExtensionNode> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Unmatched right rows are emitted with nulls in the left columns.
    pub fn generates_nulls_on_left(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }

    /// Unmatched left rows are emitted with nulls in the right columns.
    pub fn generates_nulls_on_right(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }
}

/// Operator variant tag used for metadata dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelKind {
    /// Root of the hierarchy; matches every operator
    Rel,
    Scan,
    Values,
    Filter,
    Project,
    Aggregate,
    Sort,
    Limit,
    Join,
    SemiJoin,
    Correlate,
    Union,
    Extension(&'static str),
}

impl RelKind {
    /// The next less specific tag, `None` for the root.
    pub fn parent(self) -> Option<RelKind> {
        match self {
            RelKind::Rel => None,
            RelKind::SemiJoin | RelKind::Correlate => Some(RelKind::Join),
            _ => Some(RelKind::Rel),
        }
    }

    /// This tag followed by its ancestors, most specific first.
    pub fn lineage(self) -> impl Iterator<Item = RelKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }
}

impl fmt::Display for RelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelKind::Extension(name) => write!(f, "Extension({})", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Operator node defined outside this crate.
pub trait ExtensionNode: fmt::Debug + Send + Sync {
    /// Tag under which metadata handlers for this node are registered
    fn name(&self) -> &'static str;

    fn inputs(&self) -> Vec<&LogicalPlan>;

    fn schema(&self) -> SchemaRef;

    fn as_any(&self) -> &dyn Any;
}

impl LogicalPlan {
    /// Variant tag of this node
    pub fn kind(&self) -> RelKind {
        match self {
            LogicalPlan::Scan { .. } => RelKind::Scan,
            LogicalPlan::Values { .. } => RelKind::Values,
            LogicalPlan::Filter { .. } => RelKind::Filter,
            LogicalPlan::Project { .. } => RelKind::Project,
            LogicalPlan::Aggregate { .. } => RelKind::Aggregate,
            LogicalPlan::Sort { .. } => RelKind::Sort,
            LogicalPlan::Limit { .. } => RelKind::Limit,
            LogicalPlan::Join { .. } => RelKind::Join,
            LogicalPlan::SemiJoin { .. } => RelKind::SemiJoin,
            LogicalPlan::Correlate { .. } => RelKind::Correlate,
            LogicalPlan::Union { .. } => RelKind::Union,
            LogicalPlan::Extension { node } => RelKind::Extension(node.name()),
        }
    }

    /// Get the schema (output columns) of this plan
    pub fn schema(&self) -> SchemaRef {
        match self {
            LogicalPlan::Scan { schema, .. } => schema.clone(),
            LogicalPlan::Values { schema, .. } => schema.clone(),
            LogicalPlan::Filter { input, .. } => input.schema(),
            LogicalPlan::Project { schema, .. } => schema.clone(),
            LogicalPlan::Aggregate { schema, .. } => schema.clone(),
            LogicalPlan::Sort { input, .. } => input.schema(),
            LogicalPlan::Limit { input, .. } => input.schema(),
            LogicalPlan::Join { schema, .. } => schema.clone(),
            LogicalPlan::SemiJoin { left, .. } => left.schema(),
            LogicalPlan::Correlate { schema, .. } => schema.clone(),
            LogicalPlan::Union { schema, .. } => schema.clone(),
            LogicalPlan::Extension { node } => node.schema(),
        }
    }

    /// Number of output columns
    pub fn field_count(&self) -> usize {
        self.schema().fields().len()
    }

    /// Child operators in order
    pub fn inputs(&self) -> Vec<&LogicalPlan> {
        match self {
            LogicalPlan::Scan { .. } | LogicalPlan::Values { .. } => vec![],
            LogicalPlan::Filter { input, .. }
            | LogicalPlan::Project { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Sort { input, .. }
            | LogicalPlan::Limit { input, .. } => vec![input.as_ref()],
            LogicalPlan::Join { left, right, .. }
            | LogicalPlan::SemiJoin { left, right, .. }
            | LogicalPlan::Correlate { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            LogicalPlan::Union { inputs, .. } => inputs.iter().collect(),
            LogicalPlan::Extension { node } => node.inputs(),
        }
    }
}

/// Output schema of a join: left columns then right columns, with the side
/// that the join type null-extends made nullable.
pub fn join_schema(left: &Schema, right: &Schema, join_type: JoinType) -> SchemaRef {
    let side = |schema: &Schema, nulls: bool| -> Vec<Field> {
        schema
            .fields()
            .iter()
            .map(|f| {
                let nullable = f.is_nullable() || nulls;
                Field::clone(f).with_nullable(nullable)
            })
            .collect()
    };
    let mut fields = side(left, join_type.generates_nulls_on_left());
    fields.extend(side(right, join_type.generates_nulls_on_right()));
    Arc::new(Schema::new(fields))
}
