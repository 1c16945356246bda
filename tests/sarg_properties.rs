//! Property tests for interval complements

use arrow_schema::DataType;
use proptest::prelude::*;
use quarry_common::NullSemantics;
use quarry_planner::sarg::{SargDomain, SargExpr, SargIntervalBuilder, SargIntervalExpr, Strictness};
use quarry_sql::Literal;

#[derive(Debug, Clone)]
enum Shape {
    Point(i64),
    Range {
        lower: Option<(i64, bool)>,
        upper: Option<(i64, bool)>,
    },
}

fn strictness(closed: bool) -> Strictness {
    if closed {
        Strictness::Closed
    } else {
        Strictness::Open
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    let bound = || proptest::option::of((-20i64..20, any::<bool>()));
    prop_oneof![
        (-20i64..20).prop_map(Shape::Point),
        (bound(), bound()).prop_map(|(lower, upper)| Shape::Range { lower, upper }),
    ]
}

fn build(shape: &Shape, nullable: bool) -> SargIntervalExpr {
    let mut b = SargIntervalBuilder::new(
        SargDomain::new(DataType::Int64, nullable),
        NullSemantics::NullMatchesNothing,
        true,
    );
    match shape {
        Shape::Point(v) => {
            b.set_point(Literal::Int(*v));
        }
        Shape::Range { lower, upper } => {
            if let Some((v, closed)) = lower {
                b.set_lower(Literal::Int(*v), strictness(*closed));
            }
            if let Some((v, closed)) = upper {
                b.set_upper(Literal::Int(*v), strictness(*closed));
            }
        }
    }
    b.build()
}

proptest! {
    // Unconstrained and unsatisfiable expressions complement to each other
    // including null, so only constrained satisfiable ones are checked.
    #[test]
    fn complement_partitions_non_null_values(shape in shape(), nullable in any::<bool>()) {
        let expr = build(&shape, nullable);
        prop_assume!(!expr.is_unconstrained());
        let matched = expr.evaluate();
        prop_assume!(!matched.is_empty());
        let unmatched = expr.evaluate_complemented();

        prop_assert!(matched.len() <= 1);
        prop_assert!(unmatched.len() <= 2);
        for v in -25i64..25 {
            let value = Literal::Int(v);
            let inside = matched.contains(&value) == Some(true);
            let outside = unmatched.contains(&value) == Some(true);
            prop_assert!(inside != outside, "{} in {} and {}", v, matched, unmatched);
        }
        if nullable {
            prop_assert_eq!(matched.contains(&Literal::Null), Some(false));
            prop_assert_eq!(unmatched.contains(&Literal::Null), Some(false));
        }
    }

    #[test]
    fn empty_stays_empty(shape in shape()) {
        let mut b = SargIntervalBuilder::new(
            SargDomain::new(DataType::Int64, true),
            NullSemantics::NullMatchesNothing,
            true,
        );
        if let Shape::Point(v) = shape {
            b.set_point(Literal::Int(v));
        }
        b.set_empty();
        prop_assert!(b.build().evaluate().is_empty());
    }
}
