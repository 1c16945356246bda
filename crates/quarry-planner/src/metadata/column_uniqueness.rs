//! Column uniqueness rules
//!
//! Answers whether a given set of output columns is unique. Operators without
//! a dedicated rule fall back to checking the set against their unique keys.

use crate::metadata::provider::{ArgType, HandlerTable, MetadataArg, MetadataValue, COLUMNS_UNIQUE};
use crate::metadata::query::{bool_arg, mask_arg, RelMetadataQuery};
use crate::metadata::util::unexpected_rel;
use quarry_common::Result;
use quarry_sql::{ColumnMask, Expr, LogicalPlan, RelKind};

/// Builds the handler table answering [`COLUMNS_UNIQUE`].
pub fn provider() -> Result<HandlerTable> {
    let signature = [ArgType::ColumnMask, ArgType::Bool];
    let table = HandlerTable::builder("columns_unique")
        .map_parameter_types(COLUMNS_UNIQUE, signature.to_vec())
        .register(COLUMNS_UNIQUE, RelKind::Rel, &signature, rule(from_unique_keys))?
        .register(COLUMNS_UNIQUE, RelKind::Filter, &signature, rule(pass_through))?
        .register(COLUMNS_UNIQUE, RelKind::Sort, &signature, rule(pass_through))?
        .register(COLUMNS_UNIQUE, RelKind::Project, &signature, rule(project))?
        .build();
    Ok(table)
}

fn rule<F>(
    f: F,
) -> impl Fn(&RelMetadataQuery<'_>, &LogicalPlan, &[MetadataArg]) -> Result<Option<MetadataValue>>
       + Send
       + Sync
       + 'static
where
    F: Fn(&RelMetadataQuery<'_>, &LogicalPlan, &ColumnMask, bool) -> Result<Option<bool>>
        + Send
        + Sync
        + 'static,
{
    move |mq, rel, args| {
        let columns = mask_arg(args, 0)?;
        let ignore_nulls = bool_arg(args, 1)?;
        Ok(f(mq, rel, columns, ignore_nulls)?.map(MetadataValue::Bool))
    }
}

/// Unique if the set contains a whole key; unknown if the keys are.
fn from_unique_keys(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    columns: &ColumnMask,
    ignore_nulls: bool,
) -> Result<Option<bool>> {
    Ok(mq
        .get_unique_keys(rel, ignore_nulls)?
        .map(|keys| keys.iter().any(|key| key.is_subset(columns))))
}

fn pass_through(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    columns: &ColumnMask,
    ignore_nulls: bool,
) -> Result<Option<bool>> {
    match rel {
        LogicalPlan::Filter { input, .. } | LogicalPlan::Sort { input, .. } => {
            mq.are_columns_unique(input, columns, ignore_nulls)
        }
        other => Err(unexpected_rel("Filter/Sort", other)),
    }
}

/// Output columns computed by expressions other than a column reference
/// cannot add uniqueness and are left out of the question put to the input.
fn project(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    columns: &ColumnMask,
    ignore_nulls: bool,
) -> Result<Option<bool>> {
    let LogicalPlan::Project { input, expr, .. } = rel else {
        return Err(unexpected_rel("Project", rel));
    };
    let input_columns: ColumnMask = columns
        .iter()
        .filter_map(|out| match expr.get(out) {
            Some(Expr::InputRef(index)) => Some(*index),
            _ => None,
        })
        .collect();
    mq.are_columns_unique(input, &input_columns, ignore_nulls)
}

#[cfg(test)]
mod tests {
    use crate::metadata::{default_provider, RelMetadataQuery};
    use arrow_schema::{DataType, Field, Schema};
    use quarry_common::MetadataConfig;
    use quarry_sql::{ColumnMask, Expr, Literal, LogicalPlan};
    use std::sync::Arc;

    fn scan() -> LogicalPlan {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("a", DataType::Int64, true),
            Field::new("b", DataType::Int64, true),
        ]);
        LogicalPlan::Scan {
            table_name: "t".to_string(),
            schema: Arc::new(schema),
            unique_keys: vec![ColumnMask::singleton(0), [1, 2].into_iter().collect()],
        }
    }

    fn unique(plan: &LogicalPlan, bits: &[usize]) -> Option<bool> {
        let provider = default_provider(&MetadataConfig::default()).unwrap();
        let columns: ColumnMask = bits.iter().copied().collect();
        RelMetadataQuery::new(&provider)
            .are_columns_unique(plan, &columns, false)
            .unwrap()
    }

    #[test]
    fn test_superset_of_key_is_unique() {
        let plan = scan();
        assert_eq!(unique(&plan, &[0]), Some(true));
        assert_eq!(unique(&plan, &[0, 1]), Some(true));
        assert_eq!(unique(&plan, &[1, 2]), Some(true));
        assert_eq!(unique(&plan, &[1]), Some(false));
        assert_eq!(unique(&plan, &[]), Some(false));
    }

    #[test]
    fn test_filter_delegates() {
        let plan = LogicalPlan::Filter {
            input: Box::new(scan()),
            predicate: Expr::Literal(Literal::Boolean(true)),
        };
        assert_eq!(unique(&plan, &[0]), Some(true));
        assert_eq!(unique(&plan, &[2]), Some(false));
    }

    #[test]
    fn test_project_maps_back_to_input() {
        let plan = LogicalPlan::Project {
            input: Box::new(scan()),
            expr: vec![
                Expr::Literal(Literal::Int(1)),
                Expr::InputRef(2),
                Expr::InputRef(1),
            ],
            schema: Arc::new(Schema::new(vec![
                Field::new("one", DataType::Int64, false),
                Field::new("b", DataType::Int64, true),
                Field::new("a", DataType::Int64, true),
            ])),
        };
        assert_eq!(unique(&plan, &[1, 2]), Some(true));
        assert_eq!(unique(&plan, &[0, 1]), Some(false));
    }

    #[test]
    fn test_unknown_keys_give_unknown_answer() {
        let plan = LogicalPlan::Limit {
            input: Box::new(scan()),
            limit: 5,
            offset: 0,
        };
        assert_eq!(unique(&plan, &[0]), None);
    }
}
