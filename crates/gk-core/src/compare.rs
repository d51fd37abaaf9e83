//! Comparison operators and the typed comparison used by predicates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// How an observed value is compared against a predicate's target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    /// `observed == target`
    #[default]
    Equals,
    /// `observed != target`
    NotEquals,
    /// `observed > target`
    GreaterThan,
    /// `observed >= target`
    GreaterOrEqual,
    /// `observed < target`
    LessThan,
    /// `observed <= target`
    LessOrEqual,
}

impl ComparisonOp {
    /// Short symbolic form, e.g. `>=`.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
        }
    }

    /// Whether this operator only makes sense for ordered kinds.
    pub fn is_ordering(self) -> bool {
        !matches!(self, Self::Equals | Self::NotEquals)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Tolerance used when testing floats for equality.
///
/// Two floats are equal when `|a - b| <= max(relative * max(|a|, |b|), absolute)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Scale-relative tolerance.
    pub relative: f64,
    /// Floor applied near zero.
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: 1e-6,
            absolute: f64::EPSILON * 8.0,
        }
    }
}

impl Tolerance {
    /// Approximate float equality. Infinities only equal themselves and
    /// NaN equals nothing.
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let scale = a.abs().max(b.abs());
        (a - b).abs() <= (self.relative * scale).max(self.absolute)
    }
}

/// Compare `observed` against `target` with the default float tolerance.
pub fn compare(observed: &Value, target: &Value, op: ComparisonOp) -> bool {
    compare_with(observed, target, op, &Tolerance::default())
}

/// Compare `observed` against `target`.
///
/// Values of different kinds never match. Ordering operators only apply to
/// integers and floats; for every other kind they return `false`.
pub fn compare_with(observed: &Value, target: &Value, op: ComparisonOp, tol: &Tolerance) -> bool {
    match (observed, target) {
        (Value::Int(a), Value::Int(b)) => match op {
            ComparisonOp::Equals => a == b,
            ComparisonOp::NotEquals => a != b,
            ComparisonOp::GreaterThan => a > b,
            ComparisonOp::GreaterOrEqual => a >= b,
            ComparisonOp::LessThan => a < b,
            ComparisonOp::LessOrEqual => a <= b,
        },
        (Value::Float(a), Value::Float(b)) => {
            let (a, b) = (*a, *b);
            match op {
                ComparisonOp::Equals => tol.approx_eq(a, b),
                ComparisonOp::NotEquals => !tol.approx_eq(a, b),
                ComparisonOp::GreaterThan => a > b,
                ComparisonOp::GreaterOrEqual => a >= b,
                ComparisonOp::LessThan => a < b,
                ComparisonOp::LessOrEqual => a <= b,
            }
        }
        (Value::Unit, Value::Unit) => equality(true, op),
        (Value::Bool(a), Value::Bool(b)) => equality(a == b, op),
        (Value::Text(a), Value::Text(b)) => equality(a == b, op),
        (Value::Id(a), Value::Id(b)) => equality(a == b, op),
        _ => false,
    }
}

fn equality(equal: bool, op: ComparisonOp) -> bool {
    match op {
        ComparisonOp::Equals => equal,
        ComparisonOp::NotEquals => !equal,
        _ => false,
    }
}
