//! Helpers shared by metadata rules

use quarry_common::QuarryError;
use quarry_sql::{BinaryOperator, ColumnMask, Expr, LogicalPlan};

/// Finds the columns compared by `=` between the two sides of a join.
///
/// `condition` refers to the concatenated row, so ordinals below `left_count`
/// belong to the left input. The right mask is rebased to the right input's
/// own ordinals. Conjuncts that are not a plain column-to-column equality
/// across the two sides are ignored.
pub fn find_equi_join_cols(left_count: usize, condition: &Expr) -> (ColumnMask, ColumnMask) {
    let mut left_cols = ColumnMask::new();
    let mut right_cols = ColumnMask::new();
    for conjunct in condition.conjuncts() {
        let Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } = conjunct
        else {
            continue;
        };
        if let (Expr::InputRef(a), Expr::InputRef(b)) = (left.as_ref(), right.as_ref()) {
            let (lo, hi) = if a < b { (*a, *b) } else { (*b, *a) };
            if lo < left_count && hi >= left_count {
                left_cols.insert(lo);
                right_cols.insert(hi - left_count);
            }
        }
    }
    (left_cols, right_cols)
}

/// Error for a handler invoked on an operator it cannot interpret.
pub(crate) fn unexpected_rel(rule: &str, rel: &LogicalPlan) -> QuarryError {
    QuarryError::Rule(format!("{} rule cannot be applied to {}", rule, rel.kind()))
}
