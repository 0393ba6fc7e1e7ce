//! Formula evaluation over a [`CellSource`]

use std::cmp::Ordering;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::{FormulaError, FormulaResult};
use crate::cell::{CellAddress, CellValue};
use crate::range::CellRange;

pub const DIV0: &str = "#DIV/0!";
pub const VALUE: &str = "#VALUE!";
pub const NUM: &str = "#NUM!";
pub const REF: &str = "#REF!";

/// A single value produced while evaluating
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl Scalar {
    fn error(code: &str) -> Self {
        Scalar::Error(code.to_string())
    }

    /// Numeric coercion as the arithmetic operators apply it
    fn to_number(&self) -> Result<f64, Scalar> {
        match self {
            Scalar::Empty => Ok(0.0),
            Scalar::Number(n) => Ok(*n),
            Scalar::Boolean(b) => Ok(f64::from(u8::from(*b))),
            Scalar::Text(s) => s.trim().parse().map_err(|_| Scalar::error(VALUE)),
            Scalar::Error(_) => Err(self.clone()),
        }
    }

    fn to_bool(&self) -> Result<bool, Scalar> {
        match self {
            Scalar::Empty => Ok(false),
            Scalar::Boolean(b) => Ok(*b),
            Scalar::Number(n) => Ok(*n != 0.0),
            Scalar::Text(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
            Scalar::Text(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
            Scalar::Text(_) => Err(Scalar::error(VALUE)),
            Scalar::Error(_) => Err(self.clone()),
        }
    }

    fn to_text(&self) -> Result<String, Scalar> {
        match self {
            Scalar::Empty => Ok(String::new()),
            Scalar::Number(n) => Ok(number_text(*n)),
            Scalar::Text(s) => Ok(s.clone()),
            Scalar::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Scalar::Error(_) => Err(self.clone()),
        }
    }

    /// Stored cell value as seen by a formula; formulas contribute their cached result
    pub fn from_cell(value: &CellValue) -> Self {
        match value.effective() {
            CellValue::Empty => Scalar::Empty,
            CellValue::Boolean(b) => Scalar::Boolean(*b),
            CellValue::Number(n) => Scalar::Number(*n),
            CellValue::Text(s) => Scalar::Text(s.clone()),
            CellValue::DateTime(dt) => Scalar::Number(crate::cell::excel_serial(dt)),
            CellValue::Error(code) => Scalar::Error(code.clone()),
            CellValue::Formula { .. } => Scalar::Empty,
        }
    }

    /// Value to cache on the formula cell; a bare reference to a blank cell shows 0
    pub fn into_cell(self) -> CellValue {
        match self {
            Scalar::Empty => CellValue::Number(0.0),
            Scalar::Number(n) => CellValue::Number(n),
            Scalar::Text(s) => CellValue::Text(s),
            Scalar::Boolean(b) => CellValue::Boolean(b),
            Scalar::Error(code) => CellValue::Error(code),
        }
    }
}

/// Whole numbers print without a fraction, as the application displays them
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Where referenced cells come from
pub trait CellSource {
    /// Value of one cell; an unknown sheet yields `#REF!`
    fn cell(&mut self, sheet: Option<&str>, address: CellAddress) -> Scalar;

    /// Values of the non-empty cells of a range, row-major
    fn range(&mut self, sheet: Option<&str>, range: &CellRange) -> Result<Vec<Scalar>, Scalar>;
}

/// Intermediate result: ranges only survive as function arguments
enum Operand {
    Scalar(Scalar),
    Range(Vec<Scalar>),
}

/// Evaluate an expression to the value a cell would show.
///
/// Spreadsheet errors (`#DIV/0!` and friends) are ordinary results; `Err` means
/// the formula uses something this evaluator does not know.
pub fn evaluate(expr: &Expr, source: &mut dyn CellSource) -> FormulaResult<Scalar> {
    scalar(expr, source)
}

fn scalar(expr: &Expr, source: &mut dyn CellSource) -> FormulaResult<Scalar> {
    match operand(expr, source)? {
        Operand::Scalar(value) => Ok(value),
        // no implicit intersection
        Operand::Range(_) => Ok(Scalar::error(VALUE)),
    }
}

fn operand(expr: &Expr, source: &mut dyn CellSource) -> FormulaResult<Operand> {
    let value = match expr {
        Expr::Number(n) => Scalar::Number(*n),
        Expr::Text(s) => Scalar::Text(s.clone()),
        Expr::Boolean(b) => Scalar::Boolean(*b),
        Expr::Error(code) => Scalar::Error(code.clone()),
        Expr::Cell { sheet, address } => source.cell(sheet.as_deref(), *address),
        Expr::Range { sheet, range } => {
            return Ok(match source.range(sheet.as_deref(), range) {
                Ok(values) => Operand::Range(values),
                Err(error) => Operand::Scalar(error),
            })
        }
        Expr::Unary { op, operand } => {
            let value = scalar(operand, source)?;
            match value.to_number() {
                Ok(n) => Scalar::Number(match op {
                    UnaryOp::Negate => -n,
                    UnaryOp::Percent => n / 100.0,
                }),
                Err(error) => error,
            }
        }
        Expr::Binary { op, left, right } => {
            let left = scalar(left, source)?;
            let right = scalar(right, source)?;
            binary(*op, &left, &right)
        }
        Expr::Function { name, args } => function(name, args, source)?,
    };
    Ok(Operand::Scalar(value))
}

fn binary(op: BinaryOp, left: &Scalar, right: &Scalar) -> Scalar {
    if let Scalar::Error(_) = left {
        return left.clone();
    }
    if let Scalar::Error(_) = right {
        return right.clone();
    }
    let ordering = |accept: fn(Ordering) -> bool| Scalar::Boolean(accept(compare(left, right)));
    match op {
        BinaryOp::Equal => ordering(Ordering::is_eq),
        BinaryOp::NotEqual => ordering(Ordering::is_ne),
        BinaryOp::Less => ordering(Ordering::is_lt),
        BinaryOp::LessEqual => ordering(Ordering::is_le),
        BinaryOp::Greater => ordering(Ordering::is_gt),
        BinaryOp::GreaterEqual => ordering(Ordering::is_ge),
        BinaryOp::Concat => match (left.to_text(), right.to_text()) {
            (Ok(l), Ok(r)) => Scalar::Text(l + &r),
            (Err(e), _) | (_, Err(e)) => e,
        },
        arithmetic => {
            let (l, r) = match (left.to_number(), right.to_number()) {
                (Ok(l), Ok(r)) => (l, r),
                (Err(e), _) | (_, Err(e)) => return e,
            };
            let result = match arithmetic {
                BinaryOp::Add => l + r,
                BinaryOp::Subtract => l - r,
                BinaryOp::Multiply => l * r,
                BinaryOp::Divide if r == 0.0 => return Scalar::error(DIV0),
                BinaryOp::Divide => l / r,
                _ => l.powf(r),
            };
            finite(result)
        }
    }
}

fn finite(n: f64) -> Scalar {
    if n.is_finite() {
        Scalar::Number(n)
    } else {
        Scalar::error(NUM)
    }
}

/// Blank compares as 0 or "", numbers < text < booleans, text ignores case
fn compare(left: &Scalar, right: &Scalar) -> Ordering {
    fn rank(value: &Scalar) -> u8 {
        match value {
            Scalar::Number(_) | Scalar::Empty => 0,
            Scalar::Text(_) => 1,
            Scalar::Boolean(_) => 2,
            Scalar::Error(_) => 3,
        }
    }
    match (left, right) {
        (Scalar::Empty, Scalar::Text(s)) => "".cmp(s.to_lowercase().as_str()),
        (Scalar::Text(s), Scalar::Empty) => s.to_lowercase().as_str().cmp(""),
        (Scalar::Text(l), Scalar::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (Scalar::Boolean(l), Scalar::Boolean(r)) => l.cmp(r),
        (l, r) if rank(l) == 0 && rank(r) == 0 => {
            let (l, r) = (l.to_number().unwrap_or(0.0), r.to_number().unwrap_or(0.0));
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (l, r) => rank(l).cmp(&rank(r)),
    }
}

// === Functions ===

fn round_half_away(n: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let scaled = n * factor;
    // 2.345 * 100 is 234.49999999999997
    let scaled = if scaled.abs() < 1e15 {
        (scaled * 1e6).round() / 1e6
    } else {
        scaled
    };
    scaled.round() / factor
}

fn arity(name: &str, args: &[Expr], min: usize, max: usize) -> FormulaResult<()> {
    if args.len() < min || args.len() > max {
        return Err(FormulaError::Arguments(format!(
            "{name} takes {min} to {max} arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Every argument's values, ranges flattened; `direct` marks values computed
/// in the argument itself rather than read from cells
fn values(args: &[Expr], source: &mut dyn CellSource) -> FormulaResult<Vec<(Scalar, bool)>> {
    let mut out = Vec::new();
    for arg in args {
        let direct = !matches!(arg, Expr::Cell { .. });
        match operand(arg, source)? {
            Operand::Scalar(value) => out.push((value, direct)),
            Operand::Range(values) => out.extend(values.into_iter().map(|v| (v, false))),
        }
    }
    Ok(out)
}

/// Numbers for SUM-style functions: range cells count only when numeric,
/// direct arguments are coerced
fn numbers(args: &[Expr], source: &mut dyn CellSource) -> FormulaResult<Result<Vec<f64>, Scalar>> {
    let mut out = Vec::new();
    for (value, direct) in values(args, source)? {
        match (value, direct) {
            (Scalar::Error(code), _) => return Ok(Err(Scalar::Error(code))),
            (Scalar::Number(n), _) => out.push(n),
            (other, true) => match other.to_number() {
                Ok(n) => out.push(n),
                Err(e) => return Ok(Err(e)),
            },
            (_, false) => {}
        }
    }
    Ok(Ok(out))
}

fn function(name: &str, args: &[Expr], source: &mut dyn CellSource) -> FormulaResult<Scalar> {
    let aggregate = |f: fn(&[f64]) -> Scalar, source: &mut dyn CellSource| -> FormulaResult<Scalar> {
        Ok(match numbers(args, source)? {
            Ok(ns) => f(&ns),
            Err(e) => e,
        })
    };
    match name {
        "SUM" => aggregate(|ns| finite(ns.iter().sum()), source),
        "PRODUCT" => aggregate(|ns| finite(ns.iter().product()), source),
        "AVERAGE" => aggregate(
            |ns| {
                if ns.is_empty() {
                    Scalar::error(DIV0)
                } else {
                    finite(ns.iter().sum::<f64>() / ns.len() as f64)
                }
            },
            source,
        ),
        "MIN" => aggregate(|ns| Scalar::Number(ns.iter().copied().reduce(f64::min).unwrap_or(0.0)), source),
        "MAX" => aggregate(|ns| Scalar::Number(ns.iter().copied().reduce(f64::max).unwrap_or(0.0)), source),
        "COUNT" => {
            let count = values(args, source)?
                .iter()
                .filter(|(value, direct)| match value {
                    Scalar::Number(_) => true,
                    Scalar::Text(_) | Scalar::Boolean(_) if *direct => value.to_number().is_ok(),
                    _ => false,
                })
                .count();
            Ok(Scalar::Number(count as f64))
        }
        "COUNTA" => {
            let count = values(args, source)?
                .iter()
                .filter(|(value, _)| !matches!(value, Scalar::Empty))
                .count();
            Ok(Scalar::Number(count as f64))
        }
        "IF" => {
            arity(name, args, 2, 3)?;
            let condition = match scalar(&args[0], source)?.to_bool() {
                Ok(b) => b,
                Err(e) => return Ok(e),
            };
            match (condition, args.get(2)) {
                (true, _) => scalar(&args[1], source),
                (false, Some(otherwise)) => scalar(otherwise, source),
                (false, None) => Ok(Scalar::Boolean(false)),
            }
        }
        "IFERROR" => {
            arity(name, args, 2, 2)?;
            match scalar(&args[0], source)? {
                Scalar::Error(_) => scalar(&args[1], source),
                value => Ok(value),
            }
        }
        "AND" | "OR" => {
            let mut flags = Vec::new();
            for (value, direct) in values(args, source)? {
                match value {
                    Scalar::Error(_) => return Ok(value),
                    Scalar::Empty => {}
                    Scalar::Text(_) if !direct => {}
                    other => match other.to_bool() {
                        Ok(b) => flags.push(b),
                        Err(e) => return Ok(e),
                    },
                }
            }
            if flags.is_empty() {
                return Ok(Scalar::error(VALUE));
            }
            let result = if name == "AND" {
                flags.iter().all(|b| *b)
            } else {
                flags.iter().any(|b| *b)
            };
            Ok(Scalar::Boolean(result))
        }
        "NOT" => {
            arity(name, args, 1, 1)?;
            Ok(match scalar(&args[0], source)?.to_bool() {
                Ok(b) => Scalar::Boolean(!b),
                Err(e) => e,
            })
        }
        "ABS" | "INT" | "SQRT" => {
            arity(name, args, 1, 1)?;
            let n = match scalar(&args[0], source)?.to_number() {
                Ok(n) => n,
                Err(e) => return Ok(e),
            };
            Ok(match name {
                "ABS" => Scalar::Number(n.abs()),
                "INT" => Scalar::Number(n.floor()),
                _ if n < 0.0 => Scalar::error(NUM),
                _ => Scalar::Number(n.sqrt()),
            })
        }
        "ROUND" | "MOD" | "POWER" => {
            arity(name, args, 2, 2)?;
            let (a, b) = match (
                scalar(&args[0], source)?.to_number(),
                scalar(&args[1], source)?.to_number(),
            ) {
                (Ok(a), Ok(b)) => (a, b),
                (Err(e), _) | (_, Err(e)) => return Ok(e),
            };
            Ok(match name {
                "ROUND" => finite(round_half_away(a, b.trunc() as i32)),
                "MOD" if b == 0.0 => Scalar::error(DIV0),
                // result takes the divisor's sign
                "MOD" => Scalar::Number(a - b * (a / b).floor()),
                _ => finite(a.powf(b)),
            })
        }
        "CONCATENATE" | "CONCAT" => {
            let mut text = String::new();
            for (value, _) in values(args, source)? {
                match value.to_text() {
                    Ok(part) => text.push_str(&part),
                    Err(e) => return Ok(e),
                }
            }
            Ok(Scalar::Text(text))
        }
        "LEN" | "UPPER" | "LOWER" | "TRIM" => {
            arity(name, args, 1, 1)?;
            let text = match scalar(&args[0], source)?.to_text() {
                Ok(text) => text,
                Err(e) => return Ok(e),
            };
            Ok(match name {
                "LEN" => Scalar::Number(text.chars().count() as f64),
                "UPPER" => Scalar::Text(text.to_uppercase()),
                "LOWER" => Scalar::Text(text.to_lowercase()),
                _ => Scalar::Text(text.split_whitespace().collect::<Vec<_>>().join(" ")),
            })
        }
        "LEFT" | "RIGHT" => {
            arity(name, args, 1, 2)?;
            let text = match scalar(&args[0], source)?.to_text() {
                Ok(text) => text,
                Err(e) => return Ok(e),
            };
            let count = match args.get(1) {
                Some(arg) => match scalar(arg, source)?.to_number() {
                    Ok(n) if n < 0.0 => return Ok(Scalar::error(VALUE)),
                    Ok(n) => n as usize,
                    Err(e) => return Ok(e),
                },
                None => 1,
            };
            let chars: Vec<char> = text.chars().collect();
            let count = count.min(chars.len());
            let part: String = if name == "LEFT" {
                chars[..count].iter().collect()
            } else {
                chars[chars.len() - count..].iter().collect()
            };
            Ok(Scalar::Text(part))
        }
        other => Err(FormulaError::Unsupported(format!("function {other}"))),
    }
}
