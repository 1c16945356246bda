//! Interval endpoints
//!
//! An endpoint is either one of the two infinities or a finite coordinate
//! (literal or dynamic parameter) together with the role it plays in an
//! interval and whether the coordinate itself is included.

use arrow_schema::{DataType, Field};
use quarry_sql::{DynamicParam, Literal};
use std::cmp::Ordering;
use std::fmt;

/// Whether a finite endpoint includes its coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strictness {
    Open,
    Closed,
}

impl Strictness {
    pub fn complement(self) -> Self {
        match self {
            Strictness::Open => Strictness::Closed,
            Strictness::Closed => Strictness::Open,
        }
    }
}

/// Side of the interval an endpoint bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundRole {
    Lower,
    Upper,
}

/// Value type of the column an interval ranges over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SargDomain {
    pub data_type: DataType,
    pub nullable: bool,
}

impl SargDomain {
    pub fn new(data_type: DataType, nullable: bool) -> Self {
        Self {
            data_type,
            nullable,
        }
    }

    pub fn from_field(field: &Field) -> Self {
        Self::new(field.data_type().clone(), field.is_nullable())
    }

    /// Inclusive value range of an integral domain.
    pub fn integral_range(&self) -> Option<(i64, i64)> {
        match self.data_type {
            DataType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            DataType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DataType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DataType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

/// Finite endpoint value
#[derive(Debug, Clone, PartialEq)]
pub enum Coordinate {
    Literal(Literal),
    Param(DynamicParam),
}

impl Coordinate {
    pub fn is_null(&self) -> bool {
        matches!(self, Coordinate::Literal(Literal::Null))
    }

    /// Ordering of two coordinates; `None` when either is a parameter
    /// (other than the same parameter on both sides) or the literals are of
    /// incomparable families.
    pub fn compare(&self, other: &Coordinate) -> Option<Ordering> {
        match (self, other) {
            (Coordinate::Literal(a), Coordinate::Literal(b)) => a.compare(b),
            (Coordinate::Param(a), Coordinate::Param(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl From<Literal> for Coordinate {
    fn from(literal: Literal) -> Self {
        Coordinate::Literal(literal)
    }
}

impl From<DynamicParam> for Coordinate {
    fn from(param: DynamicParam) -> Self {
        Coordinate::Param(param)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Literal(literal) => write!(f, "{}", literal),
            Coordinate::Param(param) => write!(f, "{}", param),
        }
    }
}

/// One end of an interval.
///
/// `-infinity` plays the lower role and `+infinity` the upper role, so an
/// interval whose lower end overflowed to `+infinity` (or whose upper end
/// underflowed to `-infinity`) has mismatched roles and denotes nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    NegInfinity,
    PosInfinity,
    Finite {
        role: BoundRole,
        strictness: Strictness,
        coordinate: Coordinate,
    },
}

impl Endpoint {
    pub fn finite(role: BoundRole, strictness: Strictness, coordinate: impl Into<Coordinate>) -> Self {
        Endpoint::Finite {
            role,
            strictness,
            coordinate: coordinate.into(),
        }
    }

    /// Finite endpoint adjusted to an integral `domain`.
    ///
    /// Fractional coordinates move to the next integer: a lower endpoint
    /// becomes closed there, an upper endpoint open. A coordinate outside the
    /// domain turns the endpoint into an infinity, the opposite one when
    /// nothing in the domain can satisfy it.
    pub fn rounded(
        domain: &SargDomain,
        role: BoundRole,
        strictness: Strictness,
        coordinate: impl Into<Coordinate>,
    ) -> Self {
        let coordinate = coordinate.into();
        // Float-to-integer casts saturate, and i128 holds every i64 exactly.
        let integral = match (&coordinate, domain.integral_range()) {
            (Coordinate::Literal(Literal::Int(v)), Some(range)) => Some((*v as i128, strictness, range)),
            (Coordinate::Literal(Literal::Float(v)), Some(range)) if v.is_finite() => {
                if v.fract() == 0.0 {
                    Some((*v as i128, strictness, range))
                } else if role == BoundRole::Lower {
                    Some((v.ceil() as i128, Strictness::Closed, range))
                } else {
                    Some((v.ceil() as i128, Strictness::Open, range))
                }
            }
            _ => None,
        };
        let Some((value, strictness, (min, max))) = integral else {
            return Endpoint::Finite {
                role,
                strictness,
                coordinate,
            };
        };

        let (min, max) = (min as i128, max as i128);
        let open = strictness == Strictness::Open;
        match role {
            BoundRole::Lower if value > max || (value == max && open) => Endpoint::PosInfinity,
            BoundRole::Lower if value < min => Endpoint::NegInfinity,
            BoundRole::Upper if value < min || (value == min && open) => Endpoint::NegInfinity,
            BoundRole::Upper if value > max => Endpoint::PosInfinity,
            // in range of the domain, hence of i64
            _ => Endpoint::finite(role, strictness, Literal::Int(value as i64)),
        }
    }

    /// Open lower endpoint just above null: every non-null value.
    pub fn above_null() -> Self {
        Endpoint::finite(BoundRole::Lower, Strictness::Open, Literal::Null)
    }

    /// Role this endpoint plays; infinities carry their natural role.
    pub fn role(&self) -> BoundRole {
        match self {
            Endpoint::NegInfinity => BoundRole::Lower,
            Endpoint::PosInfinity => BoundRole::Upper,
            Endpoint::Finite { role, .. } => *role,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Endpoint::Finite { .. })
    }

    /// Finite endpoint at the null literal
    pub fn is_null(&self) -> bool {
        self.coordinate().is_some_and(Coordinate::is_null)
    }

    pub fn coordinate(&self) -> Option<&Coordinate> {
        match self {
            Endpoint::Finite { coordinate, .. } => Some(coordinate),
            _ => None,
        }
    }

    /// Infinities never include a coordinate, so they count as open.
    pub fn strictness(&self) -> Strictness {
        match self {
            Endpoint::Finite { strictness, .. } => *strictness,
            _ => Strictness::Open,
        }
    }

    pub fn strictness_complement(&self) -> Strictness {
        self.strictness().complement()
    }

    pub fn is_closed(&self) -> bool {
        self.strictness() == Strictness::Closed
    }

    /// Position relative to another endpoint on the value line.
    ///
    /// At a shared coordinate an open upper endpoint sits just below it and
    /// an open lower endpoint just above it.
    pub fn compare(&self, other: &Endpoint) -> Option<Ordering> {
        match (self, other) {
            (Endpoint::NegInfinity, Endpoint::NegInfinity)
            | (Endpoint::PosInfinity, Endpoint::PosInfinity) => Some(Ordering::Equal),
            (Endpoint::NegInfinity, _) | (_, Endpoint::PosInfinity) => Some(Ordering::Less),
            (_, Endpoint::NegInfinity) | (Endpoint::PosInfinity, _) => Some(Ordering::Greater),
            (
                Endpoint::Finite { coordinate: a, .. },
                Endpoint::Finite { coordinate: b, .. },
            ) => Some(a.compare(b)?.then(self.offset().cmp(&other.offset()))),
        }
    }

    fn offset(&self) -> i8 {
        match (self.role(), self.strictness()) {
            (_, Strictness::Closed) => 0,
            (BoundRole::Lower, Strictness::Open) => 1,
            (BoundRole::Upper, Strictness::Open) => -1,
        }
    }

    /// Whether two endpoints meet at a shared coordinate with no gap
    /// between them.
    pub fn is_touching(&self, other: &Endpoint) -> bool {
        match (self.coordinate(), other.coordinate()) {
            (Some(a), Some(b)) => {
                a.compare(b) == Some(Ordering::Equal) && (self.is_closed() || other.is_closed())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::NegInfinity => write!(f, "-infinity"),
            Endpoint::PosInfinity => write!(f, "+infinity"),
            Endpoint::Finite {
                role,
                strictness,
                coordinate,
            } => {
                let op = match (role, strictness) {
                    (BoundRole::Lower, Strictness::Open) => ">",
                    (BoundRole::Lower, Strictness::Closed) => ">=",
                    (BoundRole::Upper, Strictness::Open) => "<",
                    (BoundRole::Upper, Strictness::Closed) => "<=",
                };
                write!(f, "{} {}", op, coordinate)
            }
        }
    }
}
