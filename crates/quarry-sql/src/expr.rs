//! Quarry Expression

use crate::column_mask::ColumnMask;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Scalar expression node evaluated against the input row of an operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expr {
    /// Reference to an input column by ordinal
    InputRef(usize),

    /// Literal value
    Literal(Literal),

    /// Placeholder bound at execution time
    DynamicParam(DynamicParam),

    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// Aggregate function
    AggFunc {
        func: AggFunction,
        args: Vec<Expr>,
        distinct: bool,
    },

    /// Function call
    Function { name: String, args: Vec<Expr> },
}

/// Literal value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Runtime parameter placeholder (`?` in the statement text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DynamicParam {
    pub index: usize,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Null-safe equality: `a IS NOT DISTINCT FROM b`
    IsNotDistinctFrom,
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    IsNull,
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl BinaryOperator {
    /// The operator that yields the same result with operands swapped
    /// (`a < b` is `b > a`).
    pub fn reverse(self) -> Self {
        match self {
            BinaryOperator::Lt => BinaryOperator::Gt,
            BinaryOperator::Lte => BinaryOperator::Gte,
            BinaryOperator::Gt => BinaryOperator::Lt,
            BinaryOperator::Gte => BinaryOperator::Lte,
            BinaryOperator::Eq
            | BinaryOperator::Neq
            | BinaryOperator::IsNotDistinctFrom
            | BinaryOperator::And
            | BinaryOperator::Or => self,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Neq
                | BinaryOperator::Lt
                | BinaryOperator::Lte
                | BinaryOperator::Gt
                | BinaryOperator::Gte
                | BinaryOperator::IsNotDistinctFrom
        )
    }
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Self {
        Expr::UnaryOp {
            op,
            expr: Box::new(expr),
        }
    }

    /// Get all input columns referenced by this expression
    pub fn input_refs(&self) -> ColumnMask {
        let mut mask = ColumnMask::new();
        self.collect_input_refs(&mut mask);
        mask
    }

    fn collect_input_refs(&self, mask: &mut ColumnMask) {
        match self {
            Expr::InputRef(index) => mask.insert(*index),
            Expr::Literal(_) | Expr::DynamicParam(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_input_refs(mask);
                right.collect_input_refs(mask);
            }
            Expr::UnaryOp { expr, .. } => expr.collect_input_refs(mask),
            Expr::AggFunc { args, .. } | Expr::Function { args, .. } => {
                for arg in args {
                    arg.collect_input_refs(mask);
                }
            }
        }
    }

    /// Splits a predicate on its top-level ANDs.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                let mut conjuncts = left.conjuncts();
                conjuncts.extend(right.conjuncts());
                conjuncts
            }
            other => vec![other],
        }
    }
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Total order over comparable literals, with null below every non-null value.
    ///
    /// Returns `None` when the two literals belong to incomparable families
    /// (a string against a number, for example).
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Null, Literal::Null) => Some(Ordering::Equal),
            (Literal::Null, _) => Some(Ordering::Less),
            (_, Literal::Null) => Some(Ordering::Greater),
            (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
            (Literal::Int(a), Literal::Int(b)) => Some(a.cmp(b)),
            (Literal::Int(a), Literal::Float(b)) => (*a as f64).partial_cmp(b),
            (Literal::Float(a), Literal::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b),
            (Literal::String(a), Literal::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl fmt::Display for DynamicParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.index)
    }
}
