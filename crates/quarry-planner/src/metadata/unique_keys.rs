//! Unique key derivation rules
//!
//! For each operator variant, the sets of output columns that are guaranteed
//! to hold distinct values in every row. `ignore_nulls` is passed unchanged to
//! every recursive request.

use crate::metadata::provider::{
    ArgType, HandlerTable, MetadataArg, MetadataValue, UNIQUE_KEYS,
};
use crate::metadata::query::{bool_arg, RelMetadataQuery};
use crate::metadata::util::{find_equi_join_cols, unexpected_rel};
use quarry_common::{MetadataConfig, Result};
use quarry_sql::{ColumnMask, Expr, LogicalPlan, RelKind};
use std::collections::{HashMap, HashSet};

type KeySet = HashSet<ColumnMask>;

/// Builds the handler table answering [`UNIQUE_KEYS`].
pub fn provider(config: &MetadataConfig) -> Result<HandlerTable> {
    let max_combinations = config.max_unique_key_combinations;
    let signature = [ArgType::Bool];
    let table = HandlerTable::builder("unique_keys")
        .map_parameter_types(UNIQUE_KEYS, signature.to_vec())
        .register(UNIQUE_KEYS, RelKind::Scan, &signature, rule(scan_keys))?
        .register(UNIQUE_KEYS, RelKind::Values, &signature, rule(values_keys))?
        .register(UNIQUE_KEYS, RelKind::Filter, &signature, rule(pass_through_keys))?
        .register(UNIQUE_KEYS, RelKind::Sort, &signature, rule(pass_through_keys))?
        .register(UNIQUE_KEYS, RelKind::Correlate, &signature, rule(left_input_keys))?
        .register(UNIQUE_KEYS, RelKind::SemiJoin, &signature, rule(left_input_keys))?
        .register(UNIQUE_KEYS, RelKind::Project, &signature, rule(project_keys))?
        .register(
            UNIQUE_KEYS,
            RelKind::Join,
            &signature,
            rule(move |mq, rel, ignore_nulls| join_keys(mq, rel, ignore_nulls, max_combinations)),
        )?
        .register(UNIQUE_KEYS, RelKind::Aggregate, &signature, rule(aggregate_keys))?
        .register(UNIQUE_KEYS, RelKind::Rel, &signature, rule(|_, _, _| Ok(None)))?
        .build();
    Ok(table)
}

/// Adapts a typed rule to the handler calling convention.
fn rule<F>(
    f: F,
) -> impl Fn(&RelMetadataQuery<'_>, &LogicalPlan, &[MetadataArg]) -> Result<Option<MetadataValue>>
       + Send
       + Sync
       + 'static
where
    F: Fn(&RelMetadataQuery<'_>, &LogicalPlan, bool) -> Result<Option<KeySet>>
        + Send
        + Sync
        + 'static,
{
    move |mq, rel, args| {
        let ignore_nulls = bool_arg(args, 0)?;
        Ok(f(mq, rel, ignore_nulls)?.map(MetadataValue::ColumnMasks))
    }
}

fn scan_keys(_: &RelMetadataQuery<'_>, rel: &LogicalPlan, _: bool) -> Result<Option<KeySet>> {
    match rel {
        LogicalPlan::Scan { unique_keys, .. } => Ok(Some(unique_keys.iter().cloned().collect())),
        other => Err(unexpected_rel("Scan", other)),
    }
}

/// At most one row: every mask, including the empty one, is a key.
fn values_keys(_: &RelMetadataQuery<'_>, rel: &LogicalPlan, _: bool) -> Result<Option<KeySet>> {
    match rel {
        LogicalPlan::Values { rows, .. } if rows.len() <= 1 => {
            Ok(Some(HashSet::from([ColumnMask::new()])))
        }
        LogicalPlan::Values { .. } => Ok(None),
        other => Err(unexpected_rel("Values", other)),
    }
}

fn pass_through_keys(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    ignore_nulls: bool,
) -> Result<Option<KeySet>> {
    match rel {
        LogicalPlan::Filter { input, .. } | LogicalPlan::Sort { input, .. } => {
            mq.get_unique_keys(input, ignore_nulls)
        }
        other => Err(unexpected_rel("Filter/Sort", other)),
    }
}

/// Semi-joins only emit left rows, and a correlated right side never
/// changes which left rows are distinct.
fn left_input_keys(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    ignore_nulls: bool,
) -> Result<Option<KeySet>> {
    match rel {
        LogicalPlan::SemiJoin { left, .. } | LogicalPlan::Correlate { left, .. } => {
            mq.get_unique_keys(left, ignore_nulls)
        }
        other => Err(unexpected_rel("SemiJoin/Correlate", other)),
    }
}

/// Only direct column references preserve uniqueness, and a child key
/// survives only if every one of its columns is projected.
fn project_keys(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    ignore_nulls: bool,
) -> Result<Option<KeySet>> {
    let LogicalPlan::Project { input, expr, .. } = rel else {
        return Err(unexpected_rel("Project", rel));
    };

    let in_to_out: HashMap<usize, usize> = expr
        .iter()
        .enumerate()
        .filter_map(|(out, e)| match e {
            Expr::InputRef(index) => Some((*index, out)),
            _ => None,
        })
        .collect();

    if in_to_out.is_empty() {
        return Ok(Some(HashSet::new()));
    }

    let Some(child_keys) = mq.get_unique_keys(input, ignore_nulls)? else {
        return Ok(None);
    };

    let keys = child_keys
        .iter()
        .filter_map(|key| {
            key.iter()
                .map(|bit| in_to_out.get(&bit).copied())
                .collect::<Option<ColumnMask>>()
        })
        .collect();
    Ok(Some(keys))
}

fn join_keys(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    ignore_nulls: bool,
    max_combinations: usize,
) -> Result<Option<KeySet>> {
    let LogicalPlan::Join {
        left,
        right,
        join_type,
        condition,
        ..
    } = rel
    else {
        return Err(unexpected_rel("Join", rel));
    };

    let left_count = left.field_count();
    let left_keys = mq.get_unique_keys(left, ignore_nulls)?;
    let own_right_keys = mq.get_unique_keys(right, ignore_nulls)?;

    if left_keys.is_none() && own_right_keys.is_none() {
        return Ok(None);
    }

    // Known keys answer uniqueness without deriving the child a second time.
    let (left_cols, right_cols) = find_equi_join_cols(left_count, condition);
    let left_unique = unique_on(mq, left, left_keys.as_ref(), &left_cols, ignore_nulls)?;
    let right_unique = unique_on(mq, right, own_right_keys.as_ref(), &right_cols, ignore_nulls)?;

    let right_keys: Option<KeySet> = own_right_keys
        .map(|keys| keys.iter().map(|key| key.shift(left_count)).collect());

    // Any left key concatenated with any right key identifies a joined row.
    let mut keys = HashSet::new();
    if let (Some(lk), Some(rk)) = (&left_keys, &right_keys) {
        let combinations = lk.len().saturating_mul(rk.len());
        if combinations > max_combinations {
            tracing::warn!(
                "Skipping {} concatenated join keys (limit {})",
                combinations,
                max_combinations
            );
        } else {
            for r in rk {
                for l in lk {
                    keys.insert(l.union(r));
                }
            }
        }
    }

    // At most one right match per left row keeps left keys intact, unless
    // unmatched right rows are padded with null left columns.
    if right_unique == Some(true) && !join_type.generates_nulls_on_left() {
        if let Some(lk) = &left_keys {
            keys.extend(lk.iter().cloned());
        }
    }
    if left_unique == Some(true) && !join_type.generates_nulls_on_right() {
        if let Some(rk) = &right_keys {
            keys.extend(rk.iter().cloned());
        }
    }

    Ok(Some(keys))
}

/// Whether `columns` contains a key of `rel`, consulting the provider only
/// when no keys are known.
fn unique_on(
    mq: &RelMetadataQuery<'_>,
    rel: &LogicalPlan,
    keys: Option<&KeySet>,
    columns: &ColumnMask,
    ignore_nulls: bool,
) -> Result<Option<bool>> {
    match keys {
        Some(keys) => Ok(Some(keys.iter().any(|key| key.is_subset(columns)))),
        None => mq.are_columns_unique(rel, columns, ignore_nulls),
    }
}

/// The grouping columns lead the output and form its only key.
///
/// A global aggregate (no grouping columns) yields a single row, yet the
/// empty mask is deliberately not reported for it.
fn aggregate_keys(_: &RelMetadataQuery<'_>, rel: &LogicalPlan, _: bool) -> Result<Option<KeySet>> {
    let LogicalPlan::Aggregate { group_set, .. } = rel else {
        return Err(unexpected_rel("Aggregate", rel));
    };
    if group_set.is_empty() {
        Ok(Some(HashSet::new()))
    } else {
        Ok(Some(HashSet::from([ColumnMask::range(0, group_set.len())])))
    }
}
