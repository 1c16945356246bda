//! Predicate analysis
//!
//! Recognizes predicates that restrict a single input column to one interval
//! and turns them into [`SargIntervalExpr`]s:
//!
//! ```text
//! a = 1
//! a > 1
//! 1 <= a
//! a IS NULL
//! a IS NOT DISTINCT FROM ?0
//! a > 1 AND a < 10
//! ```

use crate::sarg::endpoint::{BoundRole, Coordinate, Endpoint, SargDomain, Strictness};
use crate::sarg::factory::SargFactory;
use crate::sarg::interval_expr::SargIntervalExpr;
use arrow_schema::Schema;
use quarry_common::{NullSemantics, QuarryError, Result};
use quarry_sql::{BinaryOperator, Expr, Literal, UnaryOperator};
use std::cmp::Ordering;

/// Column ordinal and the range it is restricted to, if the predicate is
/// sargable.
pub type RangeCondition = Option<(usize, SargIntervalExpr)>;

/// A single conjunct's constraint on its column
#[derive(Debug, Clone)]
enum Term {
    Lower(Coordinate, Strictness),
    Upper(Coordinate, Strictness),
    /// `null_safe` points also match a null coordinate.
    Point { coordinate: Coordinate, null_safe: bool },
    /// Comparison with a null literal: never true.
    Contradiction,
}

impl Term {
    fn rejects_null(&self) -> bool {
        !matches!(self, Term::Point { null_safe: true, .. })
    }

    fn requires_null(&self) -> bool {
        matches!(self, Term::Point { coordinate, .. } if coordinate.is_null())
    }
}

pub struct SargAnalyzer<'a> {
    factory: &'a SargFactory,
    schema: &'a Schema,
}

impl<'a> SargAnalyzer<'a> {
    /// `schema` describes the row the predicate is evaluated against.
    pub fn new(factory: &'a SargFactory, schema: &'a Schema) -> Self {
        Self { factory, schema }
    }

    /// Converts `predicate` into a range on one column. `Ok(None)` when some
    /// conjunct is not a supported comparison, the conjuncts restrict
    /// different columns, or parameter bounds cannot be ordered.
    pub fn analyze(&self, predicate: &Expr) -> Result<RangeCondition> {
        let mut column = None;
        let mut terms = Vec::new();
        for conjunct in predicate.conjuncts() {
            let Some((col, term)) = analyze_term(conjunct) else {
                tracing::debug!("Predicate {:?} is not sargable", conjunct);
                return Ok(None);
            };
            if column.is_some_and(|c| c != col) {
                return Ok(None);
            }
            column = Some(col);
            terms.push(term);
        }
        let Some(column) = column else {
            return Ok(None);
        };

        let field = self.schema.fields().get(column).ok_or_else(|| {
            QuarryError::InvalidArgument(format!(
                "predicate references column {} of a {}-column row",
                column,
                self.schema.fields().len()
            ))
        })?;
        let domain = SargDomain::from_field(field);

        let null_safe_param = terms.iter().any(|t| {
            matches!(
                t,
                Term::Point {
                    coordinate: Coordinate::Param(_),
                    null_safe: true
                }
            )
        });
        let null_semantics = if null_safe_param {
            NullSemantics::NullMatchesNull
        } else {
            self.factory.config().default_null_semantics
        };
        let mut builder = self
            .factory
            .interval_builder_with(domain.clone(), null_semantics);

        let contradictory = terms.iter().any(|t| matches!(t, Term::Contradiction))
            || (terms.iter().any(Term::rejects_null) && terms.iter().any(Term::requires_null));
        if contradictory {
            builder.set_empty();
            return Ok(Some((column, builder.build())));
        }

        let mut lower = Endpoint::NegInfinity;
        let mut upper = Endpoint::PosInfinity;
        for term in terms {
            let endpoint = |role, strictness, coordinate| {
                self.factory.endpoint(&domain, role, strictness, coordinate)
            };
            let (lo, hi) = match term {
                Term::Lower(c, s) => (Some(endpoint(BoundRole::Lower, s, c)), None),
                Term::Upper(c, s) => (None, Some(endpoint(BoundRole::Upper, s, c))),
                Term::Point { coordinate, .. } => (
                    Some(endpoint(BoundRole::Lower, Strictness::Closed, coordinate.clone())),
                    Some(endpoint(BoundRole::Upper, Strictness::Closed, coordinate)),
                ),
                Term::Contradiction => (None, None),
            };
            if let Some(lo) = lo {
                let Some(tighter) = tighter(lower, lo, Ordering::Greater) else {
                    return Ok(None);
                };
                lower = tighter;
            }
            if let Some(hi) = hi {
                let Some(tighter) = tighter(upper, hi, Ordering::Less) else {
                    return Ok(None);
                };
                upper = tighter;
            }
        }

        let flipped = lower.role() != BoundRole::Lower || upper.role() != BoundRole::Upper;
        let point = match (&lower, &upper) {
            (
                Endpoint::Finite {
                    strictness: Strictness::Closed,
                    coordinate,
                    ..
                },
                Endpoint::Finite {
                    strictness: Strictness::Closed,
                    ..
                },
            ) if lower.compare(&upper) == Some(Ordering::Equal) => Some(coordinate.clone()),
            _ => None,
        };
        if flipped || lower.compare(&upper) == Some(Ordering::Greater) {
            builder.set_empty();
        } else if let Some(coordinate) = point {
            builder.set_point(coordinate);
        } else {
            builder.set_bounds(lower, upper);
        }

        let expr = builder.build();
        tracing::debug!("Column {} restricted to {}", column, expr);
        Ok(Some((column, expr)))
    }
}

/// The more restrictive of two endpoints of the same role, where `wins`
/// is the ordering the tighter one has. `None` if they cannot be ordered.
fn tighter(current: Endpoint, candidate: Endpoint, wins: Ordering) -> Option<Endpoint> {
    if candidate.compare(&current)? == wins {
        Some(candidate)
    } else {
        Some(current)
    }
}

fn analyze_term(expr: &Expr) -> Option<(usize, Term)> {
    match expr {
        Expr::UnaryOp {
            op: UnaryOperator::IsNull,
            expr,
        } => match expr.as_ref() {
            Expr::InputRef(col) => Some((
                *col,
                Term::Point {
                    coordinate: Coordinate::Literal(Literal::Null),
                    null_safe: true,
                },
            )),
            _ => None,
        },
        Expr::BinaryOp { left, op, right } => {
            let (col, op, value) = match (left.as_ref(), right.as_ref()) {
                (Expr::InputRef(col), value) => (*col, *op, value),
                (value, Expr::InputRef(col)) => (*col, op.reverse(), value),
                _ => return None,
            };
            let coordinate = match value {
                Expr::Literal(literal) => Coordinate::Literal(literal.clone()),
                Expr::DynamicParam(param) => Coordinate::Param(param.clone()),
                _ => return None,
            };
            if op == BinaryOperator::IsNotDistinctFrom {
                return Some((
                    col,
                    Term::Point {
                        coordinate,
                        null_safe: true,
                    },
                ));
            }
            if !op.is_comparison() || op == BinaryOperator::Neq {
                return None;
            }
            if coordinate.is_null() {
                return Some((col, Term::Contradiction));
            }
            let term = match op {
                BinaryOperator::Eq => Term::Point {
                    coordinate,
                    null_safe: false,
                },
                BinaryOperator::Lt => Term::Upper(coordinate, Strictness::Open),
                BinaryOperator::Lte => Term::Upper(coordinate, Strictness::Closed),
                BinaryOperator::Gt => Term::Lower(coordinate, Strictness::Open),
                BinaryOperator::Gte => Term::Lower(coordinate, Strictness::Closed),
                _ => return None,
            };
            Some((col, term))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sarg::SargExpr;
    use arrow_schema::{DataType, Field};
    use quarry_common::SargConfig;
    use quarry_sql::DynamicParam;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("name", DataType::Utf8, true),
        ])
    }

    fn col(i: usize) -> Expr {
        Expr::InputRef(i)
    }

    fn int(v: i64) -> Expr {
        Expr::Literal(Literal::Int(v))
    }

    fn param(index: usize) -> Expr {
        Expr::DynamicParam(DynamicParam { index })
    }

    fn cmp(l: Expr, op: BinaryOperator, r: Expr) -> Expr {
        Expr::binary(l, op, r)
    }

    fn and(l: Expr, r: Expr) -> Expr {
        Expr::binary(l, BinaryOperator::And, r)
    }

    fn analyze(predicate: &Expr) -> RangeCondition {
        let factory = SargFactory::default();
        let schema = schema();
        SargAnalyzer::new(&factory, &schema).analyze(predicate).unwrap()
    }

    fn evaluated(predicate: &Expr) -> String {
        let (_, expr) = analyze(predicate).unwrap();
        expr.evaluate().to_string()
    }

    #[test]
    fn test_single_comparisons() {
        assert_eq!(evaluated(&cmp(col(0), BinaryOperator::Eq, int(7))), "[7]");
        assert_eq!(evaluated(&cmp(col(0), BinaryOperator::Gt, int(7))), "(7, +infinity)");
        assert_eq!(evaluated(&cmp(col(0), BinaryOperator::Lte, int(7))), "(null, 7]");
        // 7 < id
        assert_eq!(evaluated(&cmp(int(7), BinaryOperator::Lt, col(0))), "(7, +infinity)");
    }

    #[test]
    fn test_conjunction_intersects() {
        let pred = and(
            and(
                cmp(col(0), BinaryOperator::Gte, int(1)),
                cmp(col(0), BinaryOperator::Lte, int(10)),
            ),
            cmp(col(0), BinaryOperator::Gt, int(4)),
        );
        let (column, expr) = analyze(&pred).unwrap();
        assert_eq!(column, 0);
        assert_eq!(expr.to_string(), "(4, 10]");
    }

    #[test]
    fn test_contradiction_is_empty() {
        let pred = and(
            cmp(col(0), BinaryOperator::Gt, int(5)),
            cmp(col(0), BinaryOperator::Lt, int(3)),
        );
        let (_, expr) = analyze(&pred).unwrap();
        assert!(expr.is_empty());
        assert!(expr.evaluate().is_empty());

        let eq_null = cmp(col(0), BinaryOperator::Eq, Expr::Literal(Literal::Null));
        assert!(analyze(&eq_null).unwrap().1.evaluate().is_empty());

        let null_and_range = and(
            Expr::unary(UnaryOperator::IsNull, col(0)),
            cmp(col(0), BinaryOperator::Lte, int(5)),
        );
        assert!(analyze(&null_and_range).unwrap().1.evaluate().is_empty());
    }

    #[test]
    fn test_equal_points_meet() {
        let pred = and(
            cmp(col(0), BinaryOperator::Gte, int(5)),
            cmp(col(0), BinaryOperator::Lte, int(5)),
        );
        let (_, expr) = analyze(&pred).unwrap();
        assert!(expr.is_point());
        assert_eq!(expr.to_string(), "[5]");
    }

    #[test]
    fn test_is_null() {
        let (_, expr) = analyze(&Expr::unary(UnaryOperator::IsNull, col(1))).unwrap();
        assert_eq!(expr.null_semantics(), NullSemantics::NullMatchesNull);
        assert_eq!(expr.evaluate().to_string(), "[null]");
    }

    #[test]
    fn test_null_safe_parameter() {
        let pred = cmp(col(0), BinaryOperator::IsNotDistinctFrom, param(0));
        let (_, expr) = analyze(&pred).unwrap();
        assert_eq!(expr.null_semantics(), NullSemantics::NullMatchesNull);
        assert_eq!(expr.to_string(), "[?0] NULL_MATCHES_NULL");
    }

    #[test]
    fn test_parameters() {
        let pred = and(
            cmp(col(0), BinaryOperator::Gt, param(0)),
            cmp(col(0), BinaryOperator::Lt, int(10)),
        );
        assert_eq!(evaluated(&pred), "(?0, 10)");

        let unordered = and(
            cmp(col(0), BinaryOperator::Gt, param(0)),
            cmp(col(0), BinaryOperator::Gt, param(1)),
        );
        assert!(analyze(&unordered).is_none());
    }

    #[test]
    fn test_fractional_bound_rounds() {
        let pred = cmp(col(0), BinaryOperator::Gt, Expr::Literal(Literal::Float(2.5)));
        assert_eq!(evaluated(&pred), "[3, +infinity)");

        let factory = SargFactory::new(SargConfig {
            round_integral_coordinates: false,
            ..SargConfig::default()
        });
        let schema = schema();
        let (_, expr) = SargAnalyzer::new(&factory, &schema)
            .analyze(&pred)
            .unwrap()
            .unwrap();
        assert_eq!(expr.to_string(), "(2.5, +infinity)");
    }

    #[test]
    fn test_unsupported_predicates() {
        assert!(analyze(&cmp(col(0), BinaryOperator::Neq, int(1))).is_none());
        assert!(analyze(&cmp(col(0), BinaryOperator::Eq, col(1))).is_none());
        assert!(analyze(&and(
            cmp(col(0), BinaryOperator::Gt, int(1)),
            cmp(col(1), BinaryOperator::Eq, Expr::Literal(Literal::String("x".into()))),
        ))
        .is_none());
        let or = Expr::binary(
            cmp(col(0), BinaryOperator::Eq, int(1)),
            BinaryOperator::Or,
            cmp(col(0), BinaryOperator::Eq, int(2)),
        );
        assert!(analyze(&or).is_none());
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let factory = SargFactory::default();
        let schema = schema();
        let err = SargAnalyzer::new(&factory, &schema)
            .analyze(&cmp(col(5), BinaryOperator::Eq, int(1)))
            .unwrap_err();
        assert!(matches!(err, QuarryError::InvalidArgument(_)));
    }
}
