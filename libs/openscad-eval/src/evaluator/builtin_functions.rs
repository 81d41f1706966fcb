//! # Builtin Functions
//!
//! Math, list and string functions. Trigonometry works in degrees.
//! Arguments of the wrong type raise `TypeMismatch`; they never
//! silently produce `undef`.
//!
//! ## OpenSCAD Signature
//!
//! ```text
//! abs(x) sign(x) sin(deg) cos(deg) tan(deg) asin(x) acos(x) atan(x) atan2(y, x)
//! floor(x) ceil(x) round(x) sqrt(x) pow(base, exp) exp(x) ln(x) log([base,] x)
//! min(v | a, b, ...) max(v | a, b, ...) norm(v) cross(a, b)
//! len(v) concat(a, b, ...) lookup(key, table) str(...) chr(n, ...) ord(s)
//! search(match, table, num_returns_per_match = 1, index_col_num = 0)
//! is_undef(x) is_bool(x) is_num(x) is_string(x) is_list(x) is_function(x)
//! rands(min, max, count, seed) version() version_num()
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Arguments, Bound, Evaluator};
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::kernel::GeometryKernel;
use crate::math::{cos_degrees, sin_degrees};
use crate::value::Value;

/// Language version reported by `version()`.
const VERSION: [f64; 3] = [2021.0, 1.0, 0.0];

// =============================================================================
// BUILTIN FUNCTION TABLE
// =============================================================================

/// Functions provided by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Abs,
    Sign,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Pow,
    Exp,
    Ln,
    Log,
    Min,
    Max,
    Norm,
    Cross,
    Len,
    Concat,
    Lookup,
    Str,
    Chr,
    Ord,
    Search,
    IsUndef,
    IsBool,
    IsNum,
    IsString,
    IsList,
    IsFunction,
    Rands,
    Version,
    VersionNum,
}

impl BuiltinFunction {
    /// Look up a builtin by name.
    ///
    /// ```rust
    /// use openscad_eval::evaluator::BuiltinFunction;
    ///
    /// assert_eq!(BuiltinFunction::from_name("atan2"), Some(BuiltinFunction::Atan2));
    /// assert_eq!(BuiltinFunction::from_name("cube"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "abs" => Self::Abs,
            "sign" => Self::Sign,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "atan2" => Self::Atan2,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "sqrt" => Self::Sqrt,
            "pow" => Self::Pow,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "min" => Self::Min,
            "max" => Self::Max,
            "norm" => Self::Norm,
            "cross" => Self::Cross,
            "len" => Self::Len,
            "concat" => Self::Concat,
            "lookup" => Self::Lookup,
            "str" => Self::Str,
            "chr" => Self::Chr,
            "ord" => Self::Ord,
            "search" => Self::Search,
            "is_undef" => Self::IsUndef,
            "is_bool" => Self::IsBool,
            "is_num" => Self::IsNum,
            "is_string" => Self::IsString,
            "is_list" => Self::IsList,
            "is_function" => Self::IsFunction,
            "rands" => Self::Rands,
            "version" => Self::Version,
            "version_num" => Self::VersionNum,
            _ => return None,
        })
    }

    /// Parameter names, for functions with a fixed signature.
    fn params(self) -> &'static [&'static str] {
        match self {
            Self::Abs | Self::Sign | Self::Floor | Self::Ceil | Self::Round | Self::Sqrt => &["x"],
            Self::Exp | Self::Ln | Self::Asin | Self::Acos | Self::Atan => &["x"],
            Self::Sin | Self::Cos | Self::Tan => &["x"],
            Self::Atan2 => &["y", "x"],
            Self::Pow => &["base", "exponent"],
            Self::Log => &["a", "b"],
            Self::Norm => &["v"],
            Self::Cross => &["a", "b"],
            Self::Len => &["v"],
            Self::Lookup => &["key", "table"],
            Self::Ord => &["s"],
            Self::Search => &["match_value", "string_or_vector", "num_returns_per_match", "index_col_num"],
            Self::IsUndef
            | Self::IsBool
            | Self::IsNum
            | Self::IsString
            | Self::IsList
            | Self::IsFunction => &["x"],
            Self::Rands => &["min_value", "max_value", "value_count", "seed_value"],
            Self::Version | Self::VersionNum => &[],
            Self::Min | Self::Max | Self::Concat | Self::Str | Self::Chr => &[],
        }
    }

    /// Functions taking any number of positional arguments.
    fn is_variadic(self) -> bool {
        matches!(self, Self::Min | Self::Max | Self::Concat | Self::Str | Self::Chr)
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

impl<K: GeometryKernel> Evaluator<'_, K> {
    /// Call a builtin function with evaluated arguments.
    pub(super) fn call_builtin<'a>(
        &mut self,
        builtin: BuiltinFunction,
        name: &'a str,
        arguments: Arguments<'a>,
    ) -> EvalResult<Value<'a>> {
        if builtin.is_variadic() {
            for (named, _) in &arguments.named {
                self.warn(format!("{name}() ignores named argument '{named}'"));
            }
            return self.call_variadic(builtin, name, arguments.positional);
        }

        let bound = arguments.bind(name, builtin.params())?;
        self.warn_unknown(&bound);

        use BuiltinFunction as F;
        match builtin {
            F::Abs => unary_math(&bound, f64::abs),
            F::Sign => unary_math(&bound, sign),
            F::Sin => unary_math(&bound, sin_degrees),
            F::Cos => unary_math(&bound, cos_degrees),
            F::Tan => unary_math(&bound, |x| sin_degrees(x) / cos_degrees(x)),
            F::Asin => unary_math(&bound, |x| x.asin().to_degrees()),
            F::Acos => unary_math(&bound, |x| x.acos().to_degrees()),
            F::Atan => unary_math(&bound, |x| x.atan().to_degrees()),
            F::Atan2 => {
                let y = required_number(&bound, "y")?;
                let x = required_number(&bound, "x")?;
                Ok(Value::Number(y.atan2(x).to_degrees()))
            }
            F::Floor => unary_math(&bound, f64::floor),
            F::Ceil => unary_math(&bound, f64::ceil),
            F::Round => unary_math(&bound, f64::round),
            F::Sqrt => unary_math(&bound, f64::sqrt),
            F::Exp => unary_math(&bound, f64::exp),
            F::Ln => unary_math(&bound, f64::ln),
            F::Pow => {
                let base = required_number(&bound, "base")?;
                let exponent = required_number(&bound, "exponent")?;
                Ok(Value::Number(base.powf(exponent)))
            }
            F::Log => {
                let first = required_number(&bound, "a")?;
                match bound.opt_number("b")? {
                    Some(x) => Ok(Value::Number(x.ln() / first.ln())),
                    None => Ok(Value::Number(first.log10())),
                }
            }
            F::Norm => {
                let v = required_numbers(&bound, "v")?;
                Ok(Value::Number(v.iter().map(|c| c * c).sum::<f64>().sqrt()))
            }
            F::Cross => cross(&bound),
            F::Len => {
                let v = required(&bound, "v")?;
                v.len()
                    .map(|n| Value::Number(n as f64))
                    .ok_or_else(|| EvalError::type_mismatch("len", format!("{} has no length", v.type_name())))
            }
            F::Lookup => lookup(&bound),
            F::Ord => self.ord(&bound),
            F::Search => self.search(&bound),
            F::IsUndef => Ok(Value::Bool(!bound.is_set("x"))),
            F::IsBool => Ok(Value::Bool(matches!(bound.get("x"), Some(Value::Bool(_))))),
            F::IsNum => Ok(Value::Bool(matches!(bound.get("x"), Some(Value::Number(n)) if !n.is_nan()))),
            F::IsString => Ok(Value::Bool(matches!(bound.get("x"), Some(Value::String(_))))),
            F::IsList => Ok(Value::Bool(matches!(bound.get("x"), Some(Value::Vector(_))))),
            F::IsFunction => Ok(Value::Bool(matches!(bound.get("x"), Some(Value::Function(_))))),
            F::Rands => self.rands(&bound),
            F::Version => Ok(Value::numbers(&VERSION)),
            F::VersionNum => Ok(Value::Number(
                VERSION[0] * 10_000.0 + VERSION[1] * 100.0 + VERSION[2],
            )),
            // Variadic, dispatched above.
            F::Min | F::Max | F::Concat | F::Str | F::Chr => Ok(Value::Undef),
        }
    }

    fn call_variadic<'a>(
        &mut self,
        builtin: BuiltinFunction,
        name: &str,
        args: Vec<Value<'a>>,
    ) -> EvalResult<Value<'a>> {
        match builtin {
            BuiltinFunction::Min => extremum(name, &args, f64::min),
            BuiltinFunction::Max => extremum(name, &args, f64::max),
            BuiltinFunction::Concat => {
                let mut items = Vec::new();
                for arg in args {
                    match arg {
                        Value::Vector(inner) => items.extend(inner.iter().cloned()),
                        other => items.push(other),
                    }
                }
                if items.len() > self.config.max_list_elements {
                    return Err(EvalError::new(
                        EvalErrorKind::RangeTooLarge {
                            count: items.len() as u64,
                            limit: self.config.max_list_elements,
                        },
                        None,
                    ));
                }
                Ok(Value::vector(items))
            }
            BuiltinFunction::Str => Ok(Value::string(
                args.iter().map(Value::to_plain_string).collect::<String>(),
            )),
            _ => {
                let mut text = String::new();
                for arg in &args {
                    self.push_chars(arg, &mut text)?;
                }
                Ok(Value::string(text))
            }
        }
    }

    /// Characters for `chr()`; invalid code points are skipped with a
    /// warning.
    fn push_chars(&mut self, value: &Value<'_>, text: &mut String) -> EvalResult<()> {
        match value {
            Value::Number(n) => {
                match (n.fract() == 0.0 && *n > 0.0)
                    .then(|| char::from_u32(*n as u32))
                    .flatten()
                {
                    Some(ch) => text.push(ch),
                    None => self.warn(format!("chr(): {n} is not a valid code point")),
                }
                Ok(())
            }
            Value::Vector(items) => {
                for item in items.iter() {
                    self.push_chars(item, text)?;
                }
                Ok(())
            }
            Value::Range(range) => {
                for n in range.iter() {
                    self.push_chars(&Value::Number(n), text)?;
                }
                Ok(())
            }
            other => Err(EvalError::type_mismatch(
                "chr",
                format!("expected numbers, got {}", other.type_name()),
            )),
        }
    }

    fn ord<'a>(&mut self, bound: &Bound<'a>) -> EvalResult<Value<'a>> {
        let value = required(bound, "s")?;
        let Some(text) = value.as_str() else {
            return Err(EvalError::type_mismatch(
                "ord",
                format!("expected a string, got {}", value.type_name()),
            ));
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Value::Number(ch as u32 as f64)),
            _ => {
                self.warn(format!("ord() needs a single character, got {value}"));
                Ok(Value::Undef)
            }
        }
    }

    /// `rands(min, max, count[, seed])`. Without a seed the evaluator's
    /// generator is used, which is itself seeded, so runs are repeatable.
    fn rands<'a>(&mut self, bound: &Bound<'a>) -> EvalResult<Value<'a>> {
        let low = required_number(bound, "min_value")?;
        let high = required_number(bound, "max_value")?;
        let count = required_number(bound, "value_count")?;
        if !(low.is_finite() && high.is_finite()) {
            return Err(bound.invalid("min_value", "bounds must be finite"));
        }
        if !count.is_finite() || count < 0.0 {
            return Err(bound.invalid("value_count", "must be a non-negative number"));
        }
        let count = count.floor();
        if count > self.config.max_list_elements as f64 {
            return Err(EvalError::new(
                EvalErrorKind::RangeTooLarge {
                    count: count as u64,
                    limit: self.config.max_list_elements,
                },
                None,
            ));
        }
        let (low, high) = if low <= high { (low, high) } else { (high, low) };

        let mut seeded = bound
            .opt_number("seed_value")?
            .map(|seed| StdRng::seed_from_u64(seed.to_bits()));
        let rng = match seeded.as_mut() {
            Some(rng) => rng,
            None => &mut self.rng,
        };
        let values = (0..count as usize)
            .map(|_| {
                let n = if low == high { low } else { rng.gen_range(low..high) };
                Value::Number(n)
            })
            .collect();
        Ok(Value::vector(values))
    }

    /// First-match `search()`.
    fn search<'a>(&mut self, bound: &Bound<'a>) -> EvalResult<Value<'a>> {
        let needle = required(bound, "match_value")?;
        let table = required(bound, "string_or_vector")?;
        let limit = bound.number_or("num_returns_per_match", 1.0)?.max(0.0) as usize;
        let column = bound.number_or("index_col_num", 0.0)?.max(0.0) as usize;

        let haystack: Vec<Value<'a>> = match table {
            Value::String(text) => text.chars().map(|ch| Value::string(ch.to_string())).collect(),
            Value::Vector(items) => items
                .iter()
                .map(|item| match item {
                    Value::Vector(row) => row.get(column).cloned().unwrap_or_default(),
                    other => other.clone(),
                })
                .collect(),
            other => {
                return Err(EvalError::type_mismatch(
                    "search",
                    format!("cannot search in {}", other.type_name()),
                ))
            }
        };
        let find = |target: &Value<'a>| -> Vec<Value<'a>> {
            let hits = haystack
                .iter()
                .enumerate()
                .filter(|(_, candidate)| *candidate == target)
                .map(|(index, _)| Value::Number(index as f64));
            match limit {
                0 => hits.collect(),
                n => hits.take(n).collect(),
            }
        };

        match needle {
            Value::String(text) => {
                let mut result = Vec::new();
                for ch in text.chars() {
                    let hits = find(&Value::string(ch.to_string()));
                    if limit == 1 {
                        match hits.into_iter().next() {
                            Some(hit) => result.push(hit),
                            None => self.warn(format!("search(): '{ch}' not found")),
                        }
                    } else {
                        result.push(Value::vector(hits));
                    }
                }
                Ok(Value::vector(result))
            }
            Value::Vector(targets) => Ok(Value::vector(
                targets
                    .iter()
                    .map(|target| {
                        let hits = find(target);
                        match (limit, hits.first()) {
                            (1, Some(hit)) => hit.clone(),
                            _ => Value::vector(hits),
                        }
                    })
                    .collect(),
            )),
            scalar => Ok(Value::vector(find(scalar))),
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn required<'b, 'a>(bound: &'b Bound<'a>, param: &str) -> EvalResult<&'b Value<'a>> {
    bound.get(param).ok_or_else(|| bound.invalid(param, "missing"))
}

fn required_number(bound: &Bound<'_>, param: &str) -> EvalResult<f64> {
    match required(bound, param)? {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::type_mismatch(
            format!("{}()", bound.callee()),
            format!("'{param}' must be a number, got {}", other.type_name()),
        )),
    }
}

fn required_numbers(bound: &Bound<'_>, param: &str) -> EvalResult<Vec<f64>> {
    let value = required(bound, param)?;
    value.as_numbers().ok_or_else(|| {
        EvalError::type_mismatch(
            format!("{}()", bound.callee()),
            format!("'{param}' must be a vector of numbers, got {}", value.type_name()),
        )
    })
}

fn unary_math<'a>(bound: &Bound<'a>, apply: impl Fn(f64) -> f64) -> EvalResult<Value<'a>> {
    let x = required_number(bound, "x")?;
    Ok(Value::Number(apply(x)))
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// `min`/`max` of one vector or of several numbers; `undef` when empty.
fn extremum<'a>(name: &str, args: &[Value<'a>], pick: fn(f64, f64) -> f64) -> EvalResult<Value<'a>> {
    let values: Vec<f64> = match args {
        [Value::Vector(items)] => items
            .iter()
            .map(Value::as_number)
            .collect::<Option<_>>()
            .ok_or_else(|| EvalError::type_mismatch(name, "vector elements must be numbers"))?,
        _ => args
            .iter()
            .map(Value::as_number)
            .collect::<Option<_>>()
            .ok_or_else(|| EvalError::type_mismatch(name, "arguments must be numbers"))?,
    };
    Ok(values
        .into_iter()
        .reduce(pick)
        .map(Value::Number)
        .unwrap_or_default())
}

fn cross<'a>(bound: &Bound<'a>) -> EvalResult<Value<'a>> {
    let a = required_numbers(bound, "a")?;
    let b = required_numbers(bound, "b")?;
    match (a.as_slice(), b.as_slice()) {
        ([ax, ay], [bx, by]) => Ok(Value::Number(ax * by - ay * bx)),
        ([ax, ay, az], [bx, by, bz]) => Ok(Value::numbers(&[
            ay * bz - az * by,
            az * bx - ax * bz,
            ax * by - ay * bx,
        ])),
        _ => Err(EvalError::type_mismatch(
            "cross()",
            format!("needs two 2D or two 3D vectors, got lengths {} and {}", a.len(), b.len()),
        )),
    }
}

/// Piecewise linear interpolation over `[[key, value], ...]`, clamped at
/// both ends.
fn lookup<'a>(bound: &Bound<'a>) -> EvalResult<Value<'a>> {
    let key = required_number(bound, "key")?;
    let table = required(bound, "table")?;
    let rows: Vec<(f64, f64)> = table
        .as_vector()
        .and_then(|rows| {
            rows.iter()
                .map(|row| match row.as_numbers()?.as_slice() {
                    [k, v, ..] => Some((*k, *v)),
                    _ => None,
                })
                .collect()
        })
        .ok_or_else(|| EvalError::type_mismatch("lookup()", "table must be a list of [key, value] pairs"))?;

    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Ok(Value::Undef);
    };
    if key <= first.0 {
        return Ok(Value::Number(first.1));
    }
    if key >= last.0 {
        return Ok(Value::Number(last.1));
    }
    for pair in rows.windows(2) {
        let ((k0, v0), (k1, v1)) = (pair[0], pair[1]);
        if key >= k0 && key <= k1 {
            let t = if k1 == k0 { 0.0 } else { (key - k0) / (k1 - k0) };
            return Ok(Value::Number(v0 + t * (v1 - v0)));
        }
    }
    Ok(Value::Number(last.1))
}
