//! # Operators
//!
//! Arithmetic and comparison on runtime values. `&&` and `||` short
//! circuit and are handled by the expression evaluator.
//!
//! ## Vector arithmetic
//!
//! | Operands           | `+` `-`       | `*`                   | `/`          |
//! |--------------------|---------------|-----------------------|--------------|
//! | number, number     | scalar        | scalar                | scalar       |
//! | vector, vector     | elementwise   | dot product           | error        |
//! | vector, number     | error         | scales elements       | elementwise  |
//! | matrix, vector     | error         | matrix product        | error        |

use std::rc::Rc;

use openscad_ast::{BinaryOp, UnaryOp};

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Apply a unary operator. `!` is handled by the caller.
pub(super) fn unary<'a>(op: UnaryOp, value: &Value<'a>) -> EvalResult<Value<'a>> {
    match (op, value) {
        (UnaryOp::Plus, Value::Number(_) | Value::Vector(_)) => Ok(value.clone()),
        (UnaryOp::Negate, _) => negate(value).ok_or_else(|| {
            EvalError::type_mismatch("unary '-'", format!("cannot negate {}", value.type_name()))
        }),
        (UnaryOp::Not, _) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Plus, other) => Err(EvalError::type_mismatch(
            "unary '+'",
            format!("expected a number or vector, got {}", other.type_name()),
        )),
    }
}

fn negate<'a>(value: &Value<'a>) -> Option<Value<'a>> {
    match value {
        Value::Number(n) => Some(Value::Number(-n)),
        Value::Vector(items) => items
            .iter()
            .map(negate)
            .collect::<Option<Vec<_>>>()
            .map(Value::vector),
        _ => None,
    }
}

/// Apply a binary operator other than `&&` and `||`.
pub(super) fn binary<'a>(op: BinaryOp, left: &Value<'a>, right: &Value<'a>) -> EvalResult<Value<'a>> {
    match op {
        BinaryOp::Add => add_subtract(op, left, right),
        BinaryOp::Subtract => add_subtract(op, left, right),
        BinaryOp::Multiply => multiply(left, right),
        BinaryOp::Divide => divide(left, right),
        BinaryOp::Modulo => scalar(op, left, right, |a, b| a % b),
        BinaryOp::Power => scalar(op, left, right, f64::powf),
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            compare(op, left, right)
        }
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

fn mismatch(op: BinaryOp, left: &Value<'_>, right: &Value<'_>) -> EvalError {
    EvalError::type_mismatch(
        format!("operator '{}'", op.symbol()),
        format!("cannot apply to {} and {}", left.type_name(), right.type_name()),
    )
}

fn scalar<'a>(
    op: BinaryOp,
    left: &Value<'a>,
    right: &Value<'a>,
    apply: fn(f64, f64) -> f64,
) -> EvalResult<Value<'a>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
        _ => Err(mismatch(op, left, right)),
    }
}

fn add_subtract<'a>(op: BinaryOp, left: &Value<'a>, right: &Value<'a>) -> EvalResult<Value<'a>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(if op == BinaryOp::Add {
            a + b
        } else {
            a - b
        })),
        (Value::Vector(a), Value::Vector(b)) => {
            if a.len() != b.len() {
                return Err(EvalError::type_mismatch(
                    format!("operator '{}'", op.symbol()),
                    format!("vector lengths differ ({} and {})", a.len(), b.len()),
                ));
            }
            let items = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| add_subtract(op, x, y))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::vector(items))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

fn is_matrix(items: &[Value<'_>]) -> bool {
    !items.is_empty() && items.iter().all(|row| matches!(row, Value::Vector(_)))
}

fn multiply<'a>(left: &Value<'a>, right: &Value<'a>) -> EvalResult<Value<'a>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (factor @ Value::Number(_), Value::Vector(items))
        | (Value::Vector(items), factor @ Value::Number(_)) => {
            let items = items
                .iter()
                .map(|item| multiply(item, factor))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::vector(items))
        }
        (Value::Vector(a), Value::Vector(b)) => match (is_matrix(a), is_matrix(b)) {
            (false, false) => dot(a, b).map(Value::Number),
            (true, false) => {
                let rows = a
                    .iter()
                    .map(|row| match row {
                        Value::Vector(row) => dot(row, b).map(Value::Number),
                        _ => Err(mismatch(BinaryOp::Multiply, left, right)),
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::vector(rows))
            }
            (false, true) => {
                let columns = transpose(b)?;
                let items = columns
                    .iter()
                    .map(|column| dot(a, column).map(Value::Number))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::vector(items))
            }
            (true, true) => {
                let columns = transpose(b)?;
                let rows = a
                    .iter()
                    .map(|row| {
                        let row = row.as_vector().unwrap_or_default();
                        let cells = columns
                            .iter()
                            .map(|column| dot(row, column).map(Value::Number))
                            .collect::<EvalResult<Vec<_>>>()?;
                        Ok(Value::vector(cells))
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::vector(rows))
            }
        },
        _ => Err(mismatch(BinaryOp::Multiply, left, right)),
    }
}

fn dot(a: &[Value<'_>], b: &[Value<'_>]) -> EvalResult<f64> {
    if a.len() != b.len() {
        return Err(EvalError::type_mismatch(
            "operator '*'",
            format!("vector lengths differ ({} and {})", a.len(), b.len()),
        ));
    }
    a.iter().zip(b).try_fold(0.0, |sum, (x, y)| match (x, y) {
        (Value::Number(x), Value::Number(y)) => Ok(sum + x * y),
        _ => Err(EvalError::type_mismatch(
            "operator '*'",
            "dot product needs numeric vectors",
        )),
    })
}

/// Columns of a matrix value as owned rows.
fn transpose<'a>(matrix: &[Value<'a>]) -> EvalResult<Vec<Rc<[Value<'a>]>>> {
    let rows: Vec<&[Value<'a>]> = matrix
        .iter()
        .map(|row| {
            row.as_vector().ok_or_else(|| {
                EvalError::type_mismatch("operator '*'", "matrix rows must be vectors")
            })
        })
        .collect::<EvalResult<_>>()?;
    let width = rows.first().map_or(0, |row| row.len());
    if rows.iter().any(|row| row.len() != width) {
        return Err(EvalError::type_mismatch(
            "operator '*'",
            "matrix rows differ in length",
        ));
    }
    Ok((0..width)
        .map(|column| rows.iter().map(|row| row[column].clone()).collect())
        .collect())
}

fn divide<'a>(left: &Value<'a>, right: &Value<'a>) -> EvalResult<Value<'a>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (Value::Vector(items), Value::Number(_)) => {
            let items = items
                .iter()
                .map(|item| divide(item, right))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::vector(items))
        }
        (Value::Number(_), Value::Vector(items)) => {
            let items = items
                .iter()
                .map(|item| divide(left, item))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::vector(items))
        }
        _ => Err(mismatch(BinaryOp::Divide, left, right)),
    }
}

fn compare<'a>(op: BinaryOp, left: &Value<'a>, right: &Value<'a>) -> EvalResult<Value<'a>> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => return Err(mismatch(op, left, right)),
    };
    // NaN compares false with everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };
    Ok(Value::Bool(match op {
        BinaryOp::Less => ordering.is_lt(),
        BinaryOp::LessEqual => ordering.is_le(),
        BinaryOp::Greater => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value<'static> {
        Value::Number(n)
    }

    #[test]
    fn test_scalar_arithmetic() {
        assert_eq!(binary(BinaryOp::Add, &num(2.0), &num(3.0)).unwrap(), num(5.0));
        assert_eq!(binary(BinaryOp::Modulo, &num(-7.0), &num(3.0)).unwrap(), num(-1.0));
        assert_eq!(binary(BinaryOp::Power, &num(2.0), &num(10.0)).unwrap(), num(1024.0));
        assert!(matches!(
            binary(BinaryOp::Divide, &num(1.0), &num(0.0)).unwrap(),
            Value::Number(n) if n.is_infinite()
        ));
    }

    #[test]
    fn test_vector_add_requires_equal_length() {
        let a = Value::numbers(&[1.0, 2.0]);
        let b = Value::numbers(&[3.0, 4.0]);
        assert_eq!(
            binary(BinaryOp::Add, &a, &b).unwrap(),
            Value::numbers(&[4.0, 6.0])
        );
        let c = Value::numbers(&[1.0]);
        assert!(binary(BinaryOp::Subtract, &a, &c).is_err());
    }

    #[test]
    fn test_vector_products() {
        let v = Value::numbers(&[1.0, 2.0, 3.0]);
        assert_eq!(binary(BinaryOp::Multiply, &v, &v).unwrap(), num(14.0));
        assert_eq!(
            binary(BinaryOp::Multiply, &num(2.0), &v).unwrap(),
            Value::numbers(&[2.0, 4.0, 6.0])
        );
        assert_eq!(
            binary(BinaryOp::Divide, &v, &num(2.0)).unwrap(),
            Value::numbers(&[0.5, 1.0, 1.5])
        );
    }

    #[test]
    fn test_matrix_products() {
        let identity = Value::vector(vec![
            Value::numbers(&[1.0, 0.0]),
            Value::numbers(&[0.0, 1.0]),
        ]);
        let swap = Value::vector(vec![
            Value::numbers(&[0.0, 1.0]),
            Value::numbers(&[1.0, 0.0]),
        ]);
        let v = Value::numbers(&[3.0, 4.0]);
        assert_eq!(binary(BinaryOp::Multiply, &swap, &v).unwrap(), Value::numbers(&[4.0, 3.0]));
        assert_eq!(binary(BinaryOp::Multiply, &v, &swap).unwrap(), Value::numbers(&[4.0, 3.0]));
        assert_eq!(binary(BinaryOp::Multiply, &identity, &swap).unwrap(), swap);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(binary(BinaryOp::Less, &num(1.0), &num(2.0)).unwrap(), Value::Bool(true));
        assert_eq!(
            binary(BinaryOp::GreaterEqual, &Value::from("b"), &Value::from("a")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Less, &num(f64::NAN), &num(1.0)).unwrap(),
            Value::Bool(false)
        );
        assert!(binary(BinaryOp::Less, &num(1.0), &Value::from("a")).is_err());
    }

    #[test]
    fn test_equality_is_structural() {
        let a = Value::numbers(&[1.0, 2.0]);
        let b = Value::numbers(&[1.0, 2.0]);
        assert_eq!(binary(BinaryOp::Equal, &a, &b).unwrap(), Value::Bool(true));
        assert_eq!(binary(BinaryOp::NotEqual, &a, &num(1.0)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_negate_nested_vectors() {
        let v = Value::vector(vec![num(1.0), Value::numbers(&[2.0])]);
        assert_eq!(
            unary(UnaryOp::Negate, &v).unwrap(),
            Value::vector(vec![num(-1.0), Value::numbers(&[-2.0])])
        );
        assert!(unary(UnaryOp::Negate, &Value::from("x")).is_err());
    }
}
