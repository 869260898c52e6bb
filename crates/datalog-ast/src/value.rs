//! Constant values
//!
//! A [`Value`] is the payload of a constant term. Values fall into four
//! categories (numeric, boolean, string, IRI); only numerics compare across
//! concrete types.
//!
//! # Ordering
//!
//! There are two comparisons:
//!
//! - [`Value::compare_semantic`] widens mixed numerics to the wider of the two
//!   types (`integer < decimal < float < double`) and returns `None` for
//!   values that are not comparable. Built-ins and selections use it.
//! - The [`Ord`] impl is total. It orders by category, then by the widened
//!   value, then by concrete type, so `1` and `1.0` stay distinct members of
//!   a relation while still comparing semantically equal.
//!
//! `NaN` equals `NaN` and sorts above every other numeric.

use crate::Symbol;
use internment::Intern;
use oxsdatatypes::{Decimal, Double};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The concrete type of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datatype {
    Integer,
    Decimal,
    Float,
    Double,
    Boolean,
    String,
    Iri,
}

impl Datatype {
    /// Check if this is one of the numeric types
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Datatype::Integer | Datatype::Decimal | Datatype::Float | Datatype::Double
        )
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Datatype::Integer => "integer",
            Datatype::Decimal => "decimal",
            Datatype::Float => "float",
            Datatype::Double => "double",
            Datatype::Boolean => "boolean",
            Datatype::String => "string",
            Datatype::Iri => "iri",
        };
        f.write_str(name)
    }
}

/// A lexical form that is not valid for the requested datatype
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {datatype} literal '{lexical}'")]
pub struct MalformedLiteralError {
    pub datatype: Datatype,
    pub lexical: String,
}

/// Constant values
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(Symbol),
    Iri(Symbol),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Intern::new(s.into()))
    }

    pub fn iri(s: impl Into<String>) -> Self {
        Value::Iri(Intern::new(s.into()))
    }

    /// Build a value of `datatype` from its lexical form.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedLiteralError`] when `lexical` is not a valid
    /// representation of `datatype`.
    pub fn parse(datatype: Datatype, lexical: &str) -> Result<Value, MalformedLiteralError> {
        let malformed = || MalformedLiteralError {
            datatype,
            lexical: lexical.to_string(),
        };
        let trimmed = lexical.trim();
        match datatype {
            Datatype::Integer => trimmed.parse().map(Value::Integer).map_err(|_| malformed()),
            Datatype::Decimal => Decimal::from_str(trimmed)
                .map(Value::Decimal)
                .map_err(|_| malformed()),
            Datatype::Float => trimmed.parse().map(Value::Float).map_err(|_| malformed()),
            Datatype::Double => trimmed.parse().map(Value::Double).map_err(|_| malformed()),
            Datatype::Boolean => match trimmed {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(malformed()),
            },
            Datatype::String => Ok(Value::string(lexical)),
            Datatype::Iri => {
                let valid = !trimmed.is_empty()
                    && trimmed.contains(':')
                    && !trimmed.chars().any(char::is_whitespace);
                if valid {
                    Ok(Value::iri(trimmed))
                } else {
                    Err(malformed())
                }
            }
        }
    }

    pub fn datatype(&self) -> Datatype {
        match self {
            Value::Integer(_) => Datatype::Integer,
            Value::Decimal(_) => Datatype::Decimal,
            Value::Float(_) => Datatype::Float,
            Value::Double(_) => Datatype::Double,
            Value::Boolean(_) => Datatype::Boolean,
            Value::String(_) => Datatype::String,
            Value::Iri(_) => Datatype::Iri,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.datatype().is_numeric()
    }

    /// Exact decimal view of integer and decimal values
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Floating point view of any numeric value
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Decimal(d) => Some(f64::from(Double::from(*d))),
            Value::Float(f) => Some(f64::from(*f)),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Compare two values the way built-ins see them.
    ///
    /// Mixed numerics are widened to the wider type. Returns `None` when the
    /// values belong to different categories.
    pub fn compare_semantic(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) | (Value::Iri(a), Value::Iri(b)) => {
                Some(a.as_str().cmp(b.as_str()))
            }
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(_) | Value::Decimal(_), Value::Integer(_) | Value::Decimal(_)) => {
                Some(self.to_decimal()?.cmp(&other.to_decimal()?))
            }
            _ => Some(compare_f64(self.to_f64()?, other.to_f64()?)),
        }
    }

    fn category(&self) -> u8 {
        match self {
            Value::Integer(_) | Value::Decimal(_) | Value::Float(_) | Value::Double(_) => 0,
            Value::Boolean(_) => 1,
            Value::String(_) => 2,
            Value::Iri(_) => 3,
        }
    }
}

/// Total order on doubles: `NaN` equals itself and is the largest value,
/// `-0.0` equals `0.0`.
pub(crate) fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn normalized_f64_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category()
            .cmp(&other.category())
            .then_with(|| {
                self.compare_semantic(other)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.datatype().cmp(&other.datatype()))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.datatype().hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::Float(f) => normalized_f64_bits(f64::from(*f)).hash(state),
            Value::Double(d) => normalized_f64_bits(*d).hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::String(s) | Value::Iri(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Float(x) => write!(f, "{:?}f", x),
            Value::Double(x) => write!(f, "{:?}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Iri(s) => write!(f, "<{}>", s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}
