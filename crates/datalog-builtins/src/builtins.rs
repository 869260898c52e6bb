//! Built-in predicates and arithmetic evaluation
//!
//! Built-ins are evaluated against a partial binding: each argument is either
//! a ground term or unbound (`None`). A successful evaluation returns the
//! completed argument list, so a built-in can bind variables as well as test
//! them.
//!
//! # Supported Built-ins
//!
//! - **Comparisons**: `=`, `!=`, `<`, `<=`, `>`, `>=`. Only `=` can bind, and
//!   only one side.
//! - **Arithmetic**: `ADD`, `SUBTRACT`, `MULTIPLY`, `DIVIDE`, `MODULUS` over
//!   `op(X, Y, Z)` meaning `X op Y = Z`. Any one of the three may be unbound,
//!   except that `MODULUS` only computes `Z`.
//! - **Type checks**: `IS_INTEGER(X)`, ..., `IS_NUMERIC(X)`
//! - **Constants**: `TRUE`, `FALSE`
//!
//! # Usage
//!
//! ```ignore
//! // age(?P, ?A), ADD(?A, 1, ?Next)
//! let outcome = evaluate(BuiltinKind::Arithmetic(ArithmeticOp::Add), &[Some(a), Some(one), None]);
//! ```
//!
//! Type mismatches and integer overflow make the built-in fail. Division by
//! zero is reported separately so the caller can choose whether to stop.

use datalog_ast::{ArithmeticOp, BuiltinKind, ComparisonOp, Term, Value};
use oxsdatatypes::Decimal;
use std::cmp::Ordering;

/// Result of evaluating a built-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinOutcome {
    /// The built-in holds; carries every argument, now ground
    Holds(Vec<Term>),
    /// The built-in does not hold, or cannot be evaluated with these arguments
    Fails,
    /// A division or modulus by zero
    DivisionByZero,
}

impl BuiltinOutcome {
    pub fn holds(&self) -> bool {
        matches!(self, BuiltinOutcome::Holds(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Decimal(Decimal),
    Float(f32),
    Double(f64),
}

/// Marker for a zero divisor
struct DivideByZero;

impl Numeric {
    fn from_term(term: &Term) -> Option<Self> {
        match term.as_value()? {
            Value::Integer(i) => Some(Numeric::Int(*i)),
            Value::Decimal(d) => Some(Numeric::Decimal(*d)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            Value::Double(d) => Some(Numeric::Double(*d)),
            _ => None,
        }
    }

    fn to_term(self) -> Term {
        Term::Constant(match self {
            Numeric::Int(i) => Value::Integer(i),
            Numeric::Decimal(d) => Value::Decimal(d),
            Numeric::Float(f) => Value::Float(f),
            Numeric::Double(d) => Value::Double(d),
        })
    }

    fn rank(self) -> u8 {
        match self {
            Numeric::Int(_) => 0,
            Numeric::Decimal(_) => 1,
            Numeric::Float(_) => 2,
            Numeric::Double(_) => 3,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Decimal(d) => f64::from(oxsdatatypes::Double::from(d)),
            Numeric::Float(f) => f64::from(f),
            Numeric::Double(d) => d,
        }
    }

    /// Convert to the type with the given rank; never narrows
    fn widen(self, rank: u8) -> Numeric {
        match (self, rank) {
            (Numeric::Int(i), 1) => Numeric::Decimal(Decimal::from(i)),
            (n, 2) if n.rank() < 2 => Numeric::Float(n.to_f64() as f32),
            (n, 3) if n.rank() < 3 => Numeric::Double(n.to_f64()),
            (n, _) => n,
        }
    }

    fn promote(lhs: Numeric, rhs: Numeric) -> (Numeric, Numeric) {
        let rank = lhs.rank().max(rhs.rank());
        (lhs.widen(rank), rhs.widen(rank))
    }

    fn is_zero(self) -> bool {
        match self {
            Numeric::Int(i) => i == 0,
            Numeric::Decimal(d) => d == Decimal::from(0),
            Numeric::Float(f) => f == 0.0,
            Numeric::Double(d) => d == 0.0,
        }
    }

    /// Apply `op` to the promoted operands.
    ///
    /// `Ok(None)` means the result is not representable (integer or decimal
    /// overflow).
    fn apply(op: ArithmeticOp, lhs: Numeric, rhs: Numeric) -> Result<Option<Numeric>, DivideByZero> {
        let (lhs, rhs) = Numeric::promote(lhs, rhs);
        if matches!(op, ArithmeticOp::Divide | ArithmeticOp::Modulus) && rhs.is_zero() {
            return Err(DivideByZero);
        }
        let result = match (lhs, rhs) {
            (Numeric::Int(l), Numeric::Int(r)) => match op {
                ArithmeticOp::Add => l.checked_add(r),
                ArithmeticOp::Subtract => l.checked_sub(r),
                ArithmeticOp::Multiply => l.checked_mul(r),
                ArithmeticOp::Divide => l.checked_div(r),
                ArithmeticOp::Modulus => l.checked_rem(r),
            }
            .map(Numeric::Int),
            (Numeric::Decimal(l), Numeric::Decimal(r)) => match op {
                ArithmeticOp::Add => l.checked_add(r),
                ArithmeticOp::Subtract => l.checked_sub(r),
                ArithmeticOp::Multiply => l.checked_mul(r),
                ArithmeticOp::Divide => l.checked_div(r),
                ArithmeticOp::Modulus => l.checked_rem(r),
            }
            .map(Numeric::Decimal),
            (Numeric::Float(l), Numeric::Float(r)) => Some(Numeric::Float(match op {
                ArithmeticOp::Add => l + r,
                ArithmeticOp::Subtract => l - r,
                ArithmeticOp::Multiply => l * r,
                ArithmeticOp::Divide => l / r,
                ArithmeticOp::Modulus => l % r,
            })),
            (l, r) => {
                let (l, r) = (l.to_f64(), r.to_f64());
                Some(Numeric::Double(match op {
                    ArithmeticOp::Add => l + r,
                    ArithmeticOp::Subtract => l - r,
                    ArithmeticOp::Multiply => l * r,
                    ArithmeticOp::Divide => l / r,
                    ArithmeticOp::Modulus => l % r,
                }))
            }
        };
        Ok(result)
    }
}

/// Check whether a built-in can be evaluated when exactly the arguments
/// flagged in `bound` are known
pub fn can_evaluate(kind: BuiltinKind, bound: &[bool]) -> bool {
    let known = bound.iter().filter(|b| **b).count();
    match kind {
        BuiltinKind::Comparison(ComparisonOp::Equal) => known >= 1,
        BuiltinKind::Arithmetic(ArithmeticOp::Modulus) => {
            bound.first() == Some(&true) && bound.get(1) == Some(&true)
        }
        BuiltinKind::Arithmetic(_) => known >= 2,
        _ => known == bound.len(),
    }
}

/// Evaluate a built-in against a partial binding.
///
/// `args` must have one entry per argument of `kind`; bound entries must be
/// ground. Returns [`BuiltinOutcome::Fails`] if the arguments are not enough
/// to evaluate (see [`can_evaluate`]).
pub fn evaluate(kind: BuiltinKind, args: &[Option<Term>]) -> BuiltinOutcome {
    if args.len() != kind.arity() {
        return BuiltinOutcome::Fails;
    }
    match kind {
        BuiltinKind::Comparison(op) => evaluate_comparison(op, &args[0], &args[1]),
        BuiltinKind::Arithmetic(op) => evaluate_arithmetic(op, &args[0], &args[1], &args[2]),
        BuiltinKind::IsType(datatype) => type_check(&args[0], |v| v.datatype() == datatype),
        BuiltinKind::IsNumeric => type_check(&args[0], Value::is_numeric),
        BuiltinKind::True => BuiltinOutcome::Holds(Vec::new()),
        BuiltinKind::False => BuiltinOutcome::Fails,
    }
}

fn evaluate_comparison(op: ComparisonOp, left: &Option<Term>, right: &Option<Term>) -> BuiltinOutcome {
    match (left, right) {
        (Some(l), Some(r)) => {
            if op.holds(l.compare_semantic(r)) {
                BuiltinOutcome::Holds(vec![l.clone(), r.clone()])
            } else {
                BuiltinOutcome::Fails
            }
        }
        // Equality binds the unknown side to the known one
        (None, Some(known)) | (Some(known), None) if op == ComparisonOp::Equal => {
            BuiltinOutcome::Holds(vec![known.clone(), known.clone()])
        }
        _ => BuiltinOutcome::Fails,
    }
}

fn evaluate_arithmetic(
    op: ArithmeticOp,
    x: &Option<Term>,
    y: &Option<Term>,
    z: &Option<Term>,
) -> BuiltinOutcome {
    let numeric = |term: &Option<Term>| term.as_ref().map(Numeric::from_term);
    match (numeric(x), numeric(y), numeric(z)) {
        (Some(Some(x)), Some(Some(y)), z) => {
            let result = match Numeric::apply(op, x, y) {
                Ok(Some(result)) => result,
                Ok(None) => return BuiltinOutcome::Fails,
                Err(DivideByZero) => return BuiltinOutcome::DivisionByZero,
            };
            match z {
                None => BuiltinOutcome::Holds(vec![x.to_term(), y.to_term(), result.to_term()]),
                Some(Some(z)) if numeric_equal(result, z) => {
                    BuiltinOutcome::Holds(vec![x.to_term(), y.to_term(), z.to_term()])
                }
                Some(_) => BuiltinOutcome::Fails,
            }
        }
        (None, Some(Some(y)), Some(Some(z))) => {
            let inverse = match op {
                ArithmeticOp::Add => Numeric::apply(ArithmeticOp::Subtract, z, y),
                ArithmeticOp::Subtract => Numeric::apply(ArithmeticOp::Add, z, y),
                ArithmeticOp::Multiply => Numeric::apply(ArithmeticOp::Divide, z, y),
                ArithmeticOp::Divide => Numeric::apply(ArithmeticOp::Multiply, z, y),
                ArithmeticOp::Modulus => return BuiltinOutcome::Fails,
            };
            solve(op, inverse, |x| (x, y), z)
        }
        (Some(Some(x)), None, Some(Some(z))) => {
            let inverse = match op {
                ArithmeticOp::Add => Numeric::apply(ArithmeticOp::Subtract, z, x),
                ArithmeticOp::Subtract => Numeric::apply(ArithmeticOp::Subtract, x, z),
                ArithmeticOp::Multiply => Numeric::apply(ArithmeticOp::Divide, z, x),
                ArithmeticOp::Divide => Numeric::apply(ArithmeticOp::Divide, x, z),
                ArithmeticOp::Modulus => return BuiltinOutcome::Fails,
            };
            solve(op, inverse, |y| (x, y), z)
        }
        _ => BuiltinOutcome::Fails,
    }
}

/// Accept a candidate for the unknown operand only if the forward
/// computation reproduces `z`. Integer division truncates, so not every
/// inverse is exact.
fn solve(
    op: ArithmeticOp,
    inverse: Result<Option<Numeric>, DivideByZero>,
    operands: impl Fn(Numeric) -> (Numeric, Numeric),
    z: Numeric,
) -> BuiltinOutcome {
    let Ok(Some(candidate)) = inverse else {
        return BuiltinOutcome::Fails;
    };
    let (x, y) = operands(candidate);
    match Numeric::apply(op, x, y) {
        Ok(Some(result)) if numeric_equal(result, z) => {
            BuiltinOutcome::Holds(vec![x.to_term(), y.to_term(), z.to_term()])
        }
        _ => BuiltinOutcome::Fails,
    }
}

fn numeric_equal(lhs: Numeric, rhs: Numeric) -> bool {
    lhs.to_term().compare_semantic(&rhs.to_term()) == Some(Ordering::Equal)
}

fn type_check(arg: &Option<Term>, check: impl Fn(&Value) -> bool) -> BuiltinOutcome {
    match arg {
        Some(term) if term.as_value().is_some_and(check) => {
            BuiltinOutcome::Holds(vec![term.clone()])
        }
        _ => BuiltinOutcome::Fails,
    }
}
