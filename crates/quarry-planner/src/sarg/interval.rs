//! Intervals and interval sequences

use crate::sarg::endpoint::{BoundRole, Coordinate, Endpoint, Strictness};
use quarry_sql::Literal;
use std::cmp::Ordering;
use std::fmt;

/// Range between a lower and an upper endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    lower: Endpoint,
    upper: Endpoint,
}

impl Default for Interval {
    fn default() -> Self {
        Self::unconstrained()
    }
}

impl Interval {
    pub fn new(lower: Endpoint, upper: Endpoint) -> Self {
        Self { lower, upper }
    }

    /// `(-infinity, +infinity)`
    pub fn unconstrained() -> Self {
        Self::new(Endpoint::NegInfinity, Endpoint::PosInfinity)
    }

    /// Both endpoints flipped: matches nothing.
    pub fn empty() -> Self {
        Self::new(Endpoint::PosInfinity, Endpoint::NegInfinity)
    }

    pub fn lower(&self) -> &Endpoint {
        &self.lower
    }

    pub fn upper(&self) -> &Endpoint {
        &self.upper
    }

    pub(crate) fn set_lower(&mut self, lower: Endpoint) {
        self.lower = lower;
    }

    pub(crate) fn set_upper(&mut self, upper: Endpoint) {
        self.upper = upper;
    }

    pub fn is_unconstrained(&self) -> bool {
        self.lower == Endpoint::NegInfinity && self.upper == Endpoint::PosInfinity
    }

    /// An endpoint overflowed into the other side's infinity.
    pub fn is_empty(&self) -> bool {
        self.lower.role() != BoundRole::Lower || self.upper.role() != BoundRole::Upper
    }

    pub fn is_point(&self) -> bool {
        match (&self.lower, &self.upper) {
            (
                Endpoint::Finite {
                    strictness: Strictness::Closed,
                    coordinate: lo,
                    ..
                },
                Endpoint::Finite {
                    strictness: Strictness::Closed,
                    coordinate: hi,
                    ..
                },
            ) => lo.compare(hi) == Some(Ordering::Equal),
            _ => false,
        }
    }

    /// Whether `value` lies inside, with null ordered below every non-null
    /// value. `None` when an endpoint is a parameter or not comparable with
    /// `value`.
    pub fn contains(&self, value: &Literal) -> Option<bool> {
        if self.is_empty() {
            return Some(false);
        }
        Some(above(&self.lower, value)? && below(&self.upper, value)?)
    }
}

/// Where `value` sits relative to `coordinate`.
fn position(coordinate: &Coordinate, value: &Literal) -> Option<Ordering> {
    match coordinate {
        Coordinate::Literal(literal) => value.compare(literal),
        Coordinate::Param(_) => None,
    }
}

fn above(lower: &Endpoint, value: &Literal) -> Option<bool> {
    match lower {
        Endpoint::NegInfinity => Some(true),
        Endpoint::PosInfinity => Some(false),
        Endpoint::Finite {
            strictness,
            coordinate,
            ..
        } => {
            let ord = position(coordinate, value)?;
            Some(match strictness {
                Strictness::Open => ord == Ordering::Greater,
                Strictness::Closed => ord != Ordering::Less,
            })
        }
    }
}

fn below(upper: &Endpoint, value: &Literal) -> Option<bool> {
    match upper {
        Endpoint::NegInfinity => Some(false),
        Endpoint::PosInfinity => Some(true),
        Endpoint::Finite {
            strictness,
            coordinate,
            ..
        } => {
            let ord = position(coordinate, value)?;
            Some(match strictness {
                Strictness::Open => ord == Ordering::Less,
                Strictness::Closed => ord != Ordering::Greater,
            })
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "()");
        }
        if self.is_point() {
            if let Some(coordinate) = self.lower.coordinate() {
                return write!(f, "[{}]", coordinate);
            }
        }
        match &self.lower {
            Endpoint::Finite {
                strictness,
                coordinate,
                ..
            } => {
                let bracket = if *strictness == Strictness::Closed { "[" } else { "(" };
                write!(f, "{}{}", bracket, coordinate)?;
            }
            infinity => write!(f, "({}", infinity)?,
        }
        write!(f, ", ")?;
        match &self.upper {
            Endpoint::Finite {
                strictness,
                coordinate,
                ..
            } => {
                let bracket = if *strictness == Strictness::Closed { "]" } else { ")" };
                write!(f, "{}{}", coordinate, bracket)
            }
            infinity => write!(f, "{})", infinity),
        }
    }
}

/// Ordered disjoint intervals, read as their union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SargIntervalSequence {
    intervals: Vec<Interval>,
}

impl SargIntervalSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Whether any interval contains `value`; `None` if no interval does and
    /// at least one could not decide.
    pub fn contains(&self, value: &Literal) -> Option<bool> {
        let mut undecided = false;
        for interval in &self.intervals {
            match interval.contains(value) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => undecided = true,
            }
        }
        if undecided {
            None
        } else {
            Some(false)
        }
    }
}

impl<'a> IntoIterator for &'a SargIntervalSequence {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl fmt::Display for SargIntervalSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intervals.as_slice() {
            [] => write!(f, "()"),
            [single] => write!(f, "{}", single),
            many => {
                write!(f, "UNION(")?;
                for interval in many {
                    write!(f, " {}", interval)?;
                }
                write!(f, " )")
            }
        }
    }
}
