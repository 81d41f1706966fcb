//! # Runtime Values
//!
//! OpenSCAD is dynamically typed. Values borrow function bodies from the
//! AST they were evaluated from, so `Value<'a>` lives no longer than the
//! statements being evaluated.
//!
//! Vectors and strings are reference counted; copying a value out of a
//! scope never deep-copies a list.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use config::constants::EPSILON;
use glam::{DVec2, DVec3};
use openscad_ast::{Expression, Parameter};

use crate::error::{EvalError, EvalErrorKind};
use crate::scope::Env;

// =============================================================================
// VALUE
// =============================================================================

/// A runtime value.
#[derive(Debug, Clone, Default)]
pub enum Value<'a> {
    #[default]
    Undef,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Vector(VectorItems<'a>),
    Range(RangeValue),
    Function(Rc<FunctionValue<'a>>),
}

/// A function literal closed over the scope it was created in.
#[derive(Debug)]
pub struct FunctionValue<'a> {
    pub params: &'a [Parameter],
    pub body: &'a Expression,
    pub env: Env<'a>,
}

/// Elements of a vector value and how deeply they nest.
///
/// A flat vector has depth 1; `[[1]]` has depth 2.
#[derive(Debug, Clone)]
pub struct VectorItems<'a> {
    values: Rc<[Value<'a>]>,
    depth: usize,
}

impl<'a> VectorItems<'a> {
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<'a> Deref for VectorItems<'a> {
    type Target = [Value<'a>];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl PartialEq for VectorItems<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.values == other.values
    }
}

impl<'a> Value<'a> {
    /// Build a vector value.
    pub fn vector(items: Vec<Value<'a>>) -> Self {
        let depth = 1 + items.iter().map(Value::nesting_depth).max().unwrap_or(0);
        Value::Vector(VectorItems {
            values: Rc::from(items),
            depth,
        })
    }

    /// Build a vector value, rejecting nesting deeper than `limit`.
    pub fn checked_vector(items: Vec<Value<'a>>, limit: usize) -> Result<Self, EvalError> {
        let value = Self::vector(items);
        let depth = value.nesting_depth();
        if depth > limit {
            return Err(EvalError::new(EvalErrorKind::VectorTooDeep { depth, limit }, None));
        }
        Ok(value)
    }

    /// Vector nesting of this value; 0 for anything but a vector.
    pub fn nesting_depth(&self) -> usize {
        match self {
            Value::Vector(items) => items.depth,
            _ => 0,
        }
    }

    /// Build a string value.
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    /// Vector of numbers.
    pub fn numbers(values: &[f64]) -> Self {
        Self::vector(values.iter().map(|&n| Value::Number(n)).collect())
    }

    /// Name of the value's type, as shown in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undef => "undef",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Vector(_) => "vector",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
        }
    }

    /// OpenSCAD truthiness.
    ///
    /// `undef`, `false`, `0`, `""` and `[]` are false; everything else
    /// is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undef => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Vector(items) => !items.is_empty(),
            Value::Range(_) | Value::Function(_) => true,
        }
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }

    /// All elements as numbers, or `None` if any is not a number.
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        self.as_vector()?.iter().map(Value::as_number).collect()
    }

    /// `[x, y]` or `[x, y, z]`; a missing z is 0.
    pub fn as_dvec3(&self) -> Option<DVec3> {
        match self.as_numbers()?.as_slice() {
            [x, y] => Some(DVec3::new(*x, *y, 0.0)),
            [x, y, z, ..] => Some(DVec3::new(*x, *y, *z)),
            _ => None,
        }
    }

    /// `[x, y]` (extra components ignored).
    pub fn as_dvec2(&self) -> Option<DVec2> {
        match self.as_numbers()?.as_slice() {
            [x, y, ..] => Some(DVec2::new(*x, *y)),
            _ => None,
        }
    }

    /// Number of elements of a string, vector or range.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Vector(items) => Some(items.len()),
            Value::Range(range) => usize::try_from(range.len()).ok(),
            _ => None,
        }
    }

    /// Text used by `str()`: strings without quotes, everything else as
    /// echoed.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undef, Value::Undef) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value<'_> {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl<'a> From<Vec<Value<'a>>> for Value<'a> {
    fn from(items: Vec<Value<'a>>) -> Self {
        Value::vector(items)
    }
}

impl From<RangeValue> for Value<'_> {
    fn from(range: RangeValue) -> Self {
        Value::Range(range)
    }
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "undef"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "\"{}\"", s.escape_debug()),
            Value::Vector(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Range(range) => write!(f, "{range}"),
            Value::Function(func) => {
                let names: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "function({})", names.join(", "))
            }
        }
    }
}

/// Format a number the way OpenSCAD echoes it: integers without a
/// fraction, other values with six significant digits.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{n:.0}");
    }

    let exponent = n.abs().log10().floor() as i32;
    if !(-5..6).contains(&exponent) {
        let mantissa = n / 10f64.powi(exponent);
        let mantissa = trim_fraction(format!("{mantissa:.5}"));
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    let decimals = (5 - exponent).max(0) as usize;
    trim_fraction(format!("{n:.decimals$}"))
}

fn trim_fraction(text: String) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

// =============================================================================
// RANGE
// =============================================================================

/// `[start : step : end]`, iterated lazily.
///
/// A zero step, or a step pointing away from `end`, yields no elements.
///
/// ## Example
///
/// ```rust
/// use openscad_eval::value::RangeValue;
///
/// let up: Vec<f64> = RangeValue::new(0.0, 1.0, 3.0).iter().collect();
/// assert_eq!(up, vec![0.0, 1.0, 2.0, 3.0]);
/// assert_eq!(RangeValue::new(0.0, -1.0, 3.0).iter().count(), 0);
/// assert_eq!(RangeValue::new(0.0, 0.0, 3.0).iter().count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValue {
    pub start: f64,
    pub step: f64,
    pub end: f64,
}

impl RangeValue {
    pub fn new(start: f64, step: f64, end: f64) -> Self {
        Self { start, step, end }
    }

    /// Build a range, rejecting non-finite bounds or step.
    pub fn checked(start: f64, step: f64, end: f64) -> Result<Self, EvalError> {
        if !(start.is_finite() && step.is_finite() && end.is_finite()) {
            return Err(EvalError::new(
                EvalErrorKind::InvalidRange(format!(
                    "[{} : {} : {}] has a non-finite component",
                    format_number(start),
                    format_number(step),
                    format_number(end)
                )),
                None,
            ));
        }
        Ok(Self::new(start, step, end))
    }

    /// Number of elements.
    pub fn len(&self) -> u64 {
        let span = self.end - self.start;
        if self.step == 0.0 || !self.step.is_finite() || !span.is_finite() {
            return 0;
        }
        if span != 0.0 && span.signum() != self.step.signum() {
            return 0;
        }
        let steps = (span / self.step + EPSILON).floor();
        if steps < 0.0 {
            0
        } else if steps >= u64::MAX as f64 {
            u64::MAX
        } else {
            steps as u64 + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in order. Each is `start + i * step`, so rounding does
    /// not accumulate.
    pub fn iter(&self) -> RangeIter {
        RangeIter {
            range: *self,
            index: 0,
            count: self.len(),
        }
    }

    /// Materialize into values, failing past `limit` elements.
    pub fn to_values<'a>(&self, limit: usize) -> Result<Vec<Value<'a>>, EvalError> {
        let count = self.len();
        if count > limit as u64 {
            return Err(EvalError::new(
                EvalErrorKind::RangeTooLarge { count, limit },
                None,
            ));
        }
        Ok(self.iter().map(Value::Number).collect())
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} : {} : {}]",
            format_number(self.start),
            format_number(self.step),
            format_number(self.end)
        )
    }
}

/// Iterator over a [`RangeValue`].
#[derive(Debug, Clone)]
pub struct RangeIter {
    range: RangeValue,
    index: u64,
    count: u64,
}

impl Iterator for RangeIter {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.index >= self.count {
            return None;
        }
        let value = self.range.start + self.index as f64 * self.range.step;
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.count - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

// =============================================================================
// TESTS
// =============================================================================
