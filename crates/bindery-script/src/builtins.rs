//! Builtin functions available to every module.
//!
//! Builtins resolve last: a user function with the same name shadows them.

use bindery_core::{TypeName, Value};

use crate::error::ScriptError;
use crate::interp::compare;

const BUILTINS: &[&str] = &[
    "abs", "bool", "column", "concat", "float", "int", "len", "lower", "max", "min", "range",
    "round", "rows", "str", "sum", "upper",
];

#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Names of all builtins, sorted.
#[must_use]
pub fn builtin_names() -> &'static [&'static str] {
    BUILTINS
}

fn arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), ScriptError> {
    if args.len() < min || args.len() > max {
        return Err(ScriptError::Arity {
            function: name.to_string(),
            expected: min,
            received: args.len(),
        });
    }
    Ok(())
}

fn type_error(name: &str, value: &Value) -> ScriptError {
    ScriptError::Type(format!("{name}() does not accept {}", value.type_label()))
}

fn convert(ty: TypeName, value: Value) -> Result<Value, ScriptError> {
    ty.coerce(value).map_err(|e| ScriptError::Type(e.to_string()))
}

/// Elements to fold over: a single list argument, or the arguments themselves.
fn operands(args: Vec<Value>) -> Vec<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

pub fn call_builtin(name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
    match name {
        "len" => {
            arity(name, &args, 1, 1)?;
            let n = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(map) => map.len(),
                Value::Table(t) => t.num_rows(),
                other => return Err(type_error(name, other)),
            };
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "str" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Str(args[0].to_string()))
        }
        "int" | "float" => {
            arity(name, &args, 1, 1)?;
            let ty = if name == "int" { TypeName::Int } else { TypeName::Float };
            convert(ty, args.into_iter().next().unwrap_or_default())
        }
        "bool" => {
            arity(name, &args, 1, 1)?;
            Ok(Value::Bool(args[0].truthy()))
        }
        "upper" | "lower" => {
            arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) if name == "upper" => Ok(Value::Str(s.to_uppercase())),
                Value::Str(s) => Ok(Value::Str(s.to_lowercase())),
                other => Err(type_error(name, other)),
            }
        }
        "concat" => Ok(Value::Str(args.iter().map(ToString::to_string).collect())),
        "sum" => {
            let mut total = Value::Int(0);
            for v in operands(args) {
                total = match (&total, &v) {
                    (Value::Int(a), Value::Int(b)) => a
                        .checked_add(*b)
                        .map(Value::Int)
                        .ok_or_else(|| ScriptError::Type("integer overflow in sum()".into()))?,
                    (a, b) => match (a.as_f64(), b.as_f64()) {
                        (Some(a), Some(b)) => Value::Float(a + b),
                        _ => return Err(type_error(name, &v)),
                    },
                };
            }
            Ok(total)
        }
        "min" | "max" => {
            let items = operands(args);
            let mut best: Option<Value> = None;
            for v in items {
                best = Some(match best {
                    None => v,
                    Some(b) => {
                        let ord = compare(&v, &b)?;
                        let take = if name == "min" { ord.is_lt() } else { ord.is_gt() };
                        if take { v } else { b }
                    }
                });
            }
            best.ok_or_else(|| ScriptError::Index(format!("{name}() of an empty sequence")))
        }
        "round" => {
            arity(name, &args, 1, 2)?;
            let x = args[0].as_f64().ok_or_else(|| type_error(name, &args[0]))?;
            match args.get(1) {
                None => Ok(Value::Int(x.round() as i64)),
                Some(Value::Int(digits)) => {
                    let scale = 10f64.powi(i32::try_from(*digits).unwrap_or(i32::MAX));
                    Ok(Value::Float((x * scale).round() / scale))
                }
                Some(other) => Err(type_error(name, other)),
            }
        }
        "abs" => {
            arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Int(i) => i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or_else(|| ScriptError::Type("integer overflow in abs()".into())),
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => Err(type_error(name, other)),
            }
        }
        "range" => {
            arity(name, &args, 1, 2)?;
            let ints: Vec<i64> = args
                .iter()
                .map(|v| v.as_i64().ok_or_else(|| type_error(name, v)))
                .collect::<Result<_, _>>()?;
            let (start, end) = match ints.as_slice() {
                [end] => (0, *end),
                [start, end] => (*start, *end),
                _ => (0, 0),
            };
            Ok(Value::List((start..end).map(Value::Int).collect()))
        }
        "column" => {
            arity(name, &args, 2, 2)?;
            match (&args[0], &args[1]) {
                (Value::Table(t), Value::Str(col)) => t
                    .column(col)
                    .map(Value::List)
                    .ok_or_else(|| ScriptError::Index(format!("missing column {col:?}"))),
                (other, _) => Err(type_error(name, other)),
            }
        }
        "rows" => {
            arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Table(t) => Ok(Value::List(
                    t.rows().iter().cloned().map(Value::List).collect(),
                )),
                other => Err(type_error(name, other)),
            }
        }
        other => Err(ScriptError::UnknownFunction(other.to_string())),
    }
}
