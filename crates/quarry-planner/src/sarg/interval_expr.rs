//! Single-interval sargable expressions
//!
//! [`SargIntervalBuilder`] narrows one interval step by step while a
//! predicate is analyzed. [`SargIntervalBuilder::build`] consumes it into an
//! immutable [`SargIntervalExpr`], which resolves the interval against its
//! null semantics into a canonical [`SargIntervalSequence`].

use crate::sarg::endpoint::{BoundRole, Coordinate, Endpoint, SargDomain, Strictness};
use crate::sarg::interval::{Interval, SargIntervalSequence};
use quarry_common::NullSemantics;
use quarry_sql::{DynamicParam, Literal};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Range constraint that can be resolved into interval sequences.
pub trait SargExpr {
    /// Values that satisfy the expression.
    fn evaluate(&self) -> SargIntervalSequence;

    /// Values that do not satisfy the expression, excluding null.
    fn evaluate_complemented(&self) -> SargIntervalSequence;

    /// Adds every dynamic parameter the endpoints refer to.
    fn collect_dynamic_params(&self, params: &mut HashSet<DynamicParam>);
}

/// Mutable interval under construction.
#[derive(Debug, Clone)]
pub struct SargIntervalBuilder {
    domain: SargDomain,
    null_semantics: NullSemantics,
    round_coordinates: bool,
    interval: Interval,
}

impl SargIntervalBuilder {
    pub fn new(domain: SargDomain, null_semantics: NullSemantics, round_coordinates: bool) -> Self {
        Self {
            domain,
            null_semantics,
            round_coordinates,
            interval: Interval::unconstrained(),
        }
    }

    fn endpoint(&self, role: BoundRole, strictness: Strictness, coordinate: Coordinate) -> Endpoint {
        if self.round_coordinates {
            Endpoint::rounded(&self.domain, role, strictness, coordinate)
        } else {
            Endpoint::finite(role, strictness, coordinate)
        }
    }

    /// Restricts to a single value. A null point asks for null to match
    /// itself, so three-valued semantics are upgraded to `NULL_MATCHES_NULL`.
    pub fn set_point(&mut self, coordinate: impl Into<Coordinate>) -> &mut Self {
        let coordinate = coordinate.into();
        if coordinate.is_null() && self.null_semantics == NullSemantics::NullMatchesNothing {
            self.null_semantics = NullSemantics::NullMatchesNull;
        }
        let lower = self.endpoint(BoundRole::Lower, Strictness::Closed, coordinate.clone());
        let upper = self.endpoint(BoundRole::Upper, Strictness::Closed, coordinate);
        self.interval.set_lower(lower);
        self.interval.set_upper(upper);
        self
    }

    pub fn set_null(&mut self) -> &mut Self {
        self.set_point(Literal::Null)
    }

    pub fn set_lower(&mut self, coordinate: impl Into<Coordinate>, strictness: Strictness) -> &mut Self {
        let lower = self.endpoint(BoundRole::Lower, strictness, coordinate.into());
        self.interval.set_lower(lower);
        self
    }

    pub fn set_upper(&mut self, coordinate: impl Into<Coordinate>, strictness: Strictness) -> &mut Self {
        let upper = self.endpoint(BoundRole::Upper, strictness, coordinate.into());
        self.interval.set_upper(upper);
        self
    }

    pub fn unset_lower(&mut self) -> &mut Self {
        self.interval.set_lower(Endpoint::NegInfinity);
        self
    }

    pub fn unset_upper(&mut self) -> &mut Self {
        self.interval.set_upper(Endpoint::PosInfinity);
        self
    }

    pub fn set_unconstrained(&mut self) -> &mut Self {
        self.interval = Interval::unconstrained();
        self
    }

    pub fn set_empty(&mut self) -> &mut Self {
        self.interval = Interval::empty();
        self
    }

    pub(crate) fn set_bounds(&mut self, lower: Endpoint, upper: Endpoint) -> &mut Self {
        self.interval = Interval::new(lower, upper);
        self
    }

    pub fn null_semantics(&self) -> NullSemantics {
        self.null_semantics
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn is_point(&self) -> bool {
        self.interval.is_point()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.interval.is_unconstrained()
    }

    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    pub fn build(self) -> SargIntervalExpr {
        SargIntervalExpr {
            domain: self.domain,
            null_semantics: self.null_semantics,
            interval: self.interval,
        }
    }
}

impl fmt::Display for SargIntervalBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_with_semantics(f, &self.interval, self.null_semantics)
    }
}

/// Finished range constraint on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SargIntervalExpr {
    domain: SargDomain,
    null_semantics: NullSemantics,
    interval: Interval,
}

impl SargIntervalExpr {
    pub fn domain(&self) -> &SargDomain {
        &self.domain
    }

    pub fn null_semantics(&self) -> NullSemantics {
        self.null_semantics
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn is_point(&self) -> bool {
        self.interval.is_point()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.interval.is_unconstrained()
    }

    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    /// Both endpoints finite and known to be out of order, as in `(5, 5)`
    /// or `[9, 3]`.
    fn is_inverted(&self) -> bool {
        let (lower, upper) = (self.interval.lower(), self.interval.upper());
        if !lower.is_finite() || !upper.is_finite() {
            return false;
        }
        match lower.coordinate().zip(upper.coordinate()).and_then(|(lo, hi)| lo.compare(hi)) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => !(lower.is_closed() && upper.is_closed()),
            _ => false,
        }
    }
}

impl SargExpr for SargIntervalExpr {
    fn evaluate(&self) -> SargIntervalSequence {
        let mut seq = SargIntervalSequence::new();
        let (lower, upper) = (self.interval.lower(), self.interval.upper());

        if self.interval.is_empty() {
            return seq;
        }
        if self.null_semantics == NullSemantics::NullMatchesNothing
            && (lower.is_null() || upper.is_null())
        {
            return seq;
        }
        if self.is_inverted() {
            return seq;
        }

        let mut interval = self.interval.clone();
        let constrained = lower.is_finite() || upper.is_finite();
        match self.null_semantics {
            NullSemantics::NullMatchesNothing
                if self.domain.nullable && constrained && (!lower.is_finite() || lower.is_null()) =>
            {
                interval.set_lower(Endpoint::above_null());
            }
            NullSemantics::NullMatchesAnything
                if !lower.is_finite() || lower.is_null() || upper.is_null() =>
            {
                interval = Interval::unconstrained();
            }
            _ => {}
        }

        tracing::trace!("Evaluated {} to {}", self, interval);
        seq.push(interval);
        seq
    }

    /// Always complements under three-valued semantics, whatever the
    /// expression's own null semantics are.
    fn evaluate_complemented(&self) -> SargIntervalSequence {
        let matched = self.evaluate();
        let mut seq = SargIntervalSequence::new();

        let Some(matched) = matched.intervals().first() else {
            seq.push(Interval::unconstrained());
            return seq;
        };
        if matched.is_unconstrained() {
            return seq;
        }

        let (lower, upper) = (matched.lower(), matched.upper());
        // Nothing lies below a null lower endpoint once null is excluded.
        if let Some(coordinate) = lower.coordinate().filter(|c| !c.is_null()) {
            seq.push(Interval::new(
                Endpoint::above_null(),
                Endpoint::finite(BoundRole::Upper, lower.strictness_complement(), coordinate.clone()),
            ));
        }
        if let Some(coordinate) = upper.coordinate() {
            seq.push(Interval::new(
                Endpoint::finite(BoundRole::Lower, upper.strictness_complement(), coordinate.clone()),
                Endpoint::PosInfinity,
            ));
        }
        seq
    }

    fn collect_dynamic_params(&self, params: &mut HashSet<DynamicParam>) {
        for endpoint in [self.interval.lower(), self.interval.upper()] {
            if let Some(Coordinate::Param(param)) = endpoint.coordinate() {
                params.insert(param.clone());
            }
        }
    }
}

impl fmt::Display for SargIntervalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_with_semantics(f, &self.interval, self.null_semantics)
    }
}

fn fmt_with_semantics(
    f: &mut fmt::Formatter<'_>,
    interval: &Interval,
    null_semantics: NullSemantics,
) -> fmt::Result {
    write!(f, "{}", interval)?;
    if null_semantics != NullSemantics::NullMatchesNothing {
        write!(f, " {}", null_semantics)?;
    }
    Ok(())
}
