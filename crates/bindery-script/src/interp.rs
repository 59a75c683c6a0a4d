//! Tree-walking evaluator.

use std::cmp::Ordering;

use bindery_core::Value;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::builtins;
use crate::error::ScriptError;
use crate::module::{CallTarget, FnDef, Program};

pub(crate) struct Interpreter<'p> {
    program: &'p Program,
    depth: usize,
}

type Env = Vec<(String, Value)>;

impl<'p> Interpreter<'p> {
    pub(crate) fn new(program: &'p Program) -> Self {
        Self { program, depth: 0 }
    }

    /// Bind positional `args` (filling trailing defaults) and evaluate.
    pub(crate) fn call_def(&mut self, def: &FnDef, mut args: Vec<Value>) -> Result<Value, ScriptError> {
        let required = def.params.iter().filter(|p| p.default.is_none()).count();
        if args.len() < required || args.len() > def.params.len() {
            return Err(ScriptError::Arity {
                function: def.name.clone(),
                expected: def.params.len(),
                received: args.len(),
            });
        }
        for param in &def.params[args.len()..] {
            args.push(param.default.clone().unwrap_or_default());
        }
        if self.depth >= self.program.max_depth() {
            return Err(ScriptError::Depth(self.program.max_depth()));
        }
        self.depth += 1;
        let mut env: Env = def
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(args)
            .collect();
        let out = self.eval(&def.body, &def.module, &mut env);
        self.depth -= 1;
        out
    }

    fn eval(&mut self, expr: &Expr, module: &str, env: &mut Env) -> Result<Value, ScriptError> {
        match expr {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Var(name) => env
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| ScriptError::UnknownVariable(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|e| self.eval(e, module, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Map(entries) => {
                let mut map = indexmap::IndexMap::with_capacity(entries.len());
                for (k, e) in entries {
                    map.insert(k.clone(), self.eval(e, module, env)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|e| self.eval(e, module, env))
                    .collect::<Result<Vec<_>, _>>()?;
                self.dispatch(module, name, args)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target, module, env)?;
                let index = self.eval(index, module, env)?;
                index_value(target, &index)
            }
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, module, env)?;
                match (op, v) {
                    (UnaryOp::Not, v) => Ok(Value::Bool(!v.truthy())),
                    (UnaryOp::Neg, Value::Int(i)) => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| ScriptError::Type("integer overflow".into())),
                    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnaryOp::Neg, other) => Err(ScriptError::Type(format!(
                        "cannot negate {}",
                        other.type_label()
                    ))),
                }
            }
            Expr::Binary { op, lhs, rhs } => match op {
                BinaryOp::And => {
                    let l = self.eval(lhs, module, env)?;
                    if l.truthy() {
                        self.eval(rhs, module, env)
                    } else {
                        Ok(l)
                    }
                }
                BinaryOp::Or => {
                    let l = self.eval(lhs, module, env)?;
                    if l.truthy() {
                        Ok(l)
                    } else {
                        self.eval(rhs, module, env)
                    }
                }
                _ => {
                    let l = self.eval(lhs, module, env)?;
                    let r = self.eval(rhs, module, env)?;
                    binary(*op, l, r)
                }
            },
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond, module, env)?.truthy() {
                    self.eval(then, module, env)
                } else {
                    self.eval(otherwise, module, env)
                }
            }
            Expr::Block { lets, tail } => {
                let mark = env.len();
                for (name, e) in lets {
                    let v = match self.eval(e, module, env) {
                        Ok(v) => v,
                        Err(err) => {
                            env.truncate(mark);
                            return Err(err);
                        }
                    };
                    env.push((name.clone(), v));
                }
                let out = self.eval(tail, module, env);
                env.truncate(mark);
                out
            }
        }
    }

    fn dispatch(&mut self, module: &str, name: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        let program = self.program;
        match program.resolve_call(module, name) {
            CallTarget::Module(path) => {
                let def = program
                    .lookup(&path)
                    .ok_or_else(|| ScriptError::UnknownFunction(path.to_string()))?;
                self.call_def(def, args)
            }
            CallTarget::Root(name) => {
                let def = program
                    .root()
                    .function(&name)
                    .ok_or(ScriptError::UnknownFunction(name.clone()))?;
                self.call_def(def, args)
            }
            CallTarget::Builtin(name) => builtins::call_builtin(&name, args),
            CallTarget::Unknown => Err(ScriptError::UnknownFunction(name.to_string())),
        }
    }
}

fn index_value(target: Value, index: &Value) -> Result<Value, ScriptError> {
    match (target, index) {
        (Value::List(items), Value::Int(i)) => {
            let at = list_position(items.len(), *i)?;
            Ok(items.into_iter().nth(at).unwrap_or_default())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let at = list_position(chars.len(), *i)?;
            Ok(Value::Str(chars[at].to_string()))
        }
        (Value::Map(map), Value::Str(key)) => map
            .get(key)
            .cloned()
            .ok_or_else(|| ScriptError::Index(format!("missing key {key:?}"))),
        (Value::Table(table), Value::Str(name)) => table
            .column(name)
            .map(Value::List)
            .ok_or_else(|| ScriptError::Index(format!("missing column {name:?}"))),
        (Value::Table(table), Value::Int(i)) => {
            let at = list_position(table.num_rows(), *i)?;
            Ok(Value::List(table.rows()[at].clone()))
        }
        (target, index) => Err(ScriptError::Type(format!(
            "cannot index {} with {}",
            target.type_label(),
            index.type_label()
        ))),
    }
}

/// Resolve a possibly negative index against `len`.
fn list_position(len: usize, i: i64) -> Result<usize, ScriptError> {
    let n = i64::try_from(len).unwrap_or(i64::MAX);
    let at = if i < 0 { n + i } else { i };
    if (0..n).contains(&at) {
        Ok(at as usize)
    } else {
        Err(ScriptError::Index(format!("index {i} out of range for length {len}")))
    }
}

fn overflow(op: BinaryOp) -> ScriptError {
    ScriptError::Type(format!("integer overflow in '{}'", op.symbol()))
}

fn binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, ScriptError> {
    use BinaryOp as B;
    match op {
        B::Eq => Ok(Value::Bool(values_equal(&l, &r))),
        B::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
        B::Lt | B::Le | B::Gt | B::Ge => {
            let ord = compare(&l, &r)?;
            Ok(Value::Bool(match op {
                B::Lt => ord == Ordering::Less,
                B::Le => ord != Ordering::Greater,
                B::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        B::Add => match (l, r) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (l, r) => arith(op, &l, &r),
        },
        B::Sub | B::Mul | B::Div | B::Rem => arith(op, &l, &r),
        B::And | B::Or => Ok(if l.truthy() == (op == B::And) { r } else { l }),
    }
}

fn arith(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, ScriptError> {
    use BinaryOp as B;
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        let (a, b) = (*a, *b);
        return match op {
            B::Add => a.checked_add(b).map(Value::Int).ok_or_else(|| overflow(op)),
            B::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow(op)),
            B::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow(op)),
            B::Rem if b == 0 => Err(ScriptError::DivisionByZero),
            B::Rem => a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow(op)),
            B::Div if b == 0 => Err(ScriptError::DivisionByZero),
            B::Div => Ok(Value::Float(a as f64 / b as f64)),
            _ => Err(ScriptError::Type(format!("'{}' is not arithmetic", op.symbol()))),
        };
    }
    let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
        return Err(ScriptError::Type(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            l.type_label(),
            r.type_label()
        )));
    };
    match op {
        B::Add => Ok(Value::Float(a + b)),
        B::Sub => Ok(Value::Float(a - b)),
        B::Mul => Ok(Value::Float(a * b)),
        B::Div | B::Rem if b == 0.0 => Err(ScriptError::DivisionByZero),
        B::Div => Ok(Value::Float(a / b)),
        B::Rem => Ok(Value::Float(a % b)),
        _ => Err(ScriptError::Type(format!("'{}' is not arithmetic", op.symbol()))),
    }
}

pub(crate) fn values_equal(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            l.as_f64() == r.as_f64()
        }
        _ => l == r,
    }
}

pub(crate) fn compare(l: &Value, r: &Value) -> Result<Ordering, ScriptError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| ScriptError::Type("cannot order NaN".into())),
            _ => Err(ScriptError::Type(format!(
                "cannot compare {} with {}",
                l.type_label(),
                r.type_label()
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> Result<Value, ScriptError> {
        let mut p = Program::new();
        p.load_root(&format!("fn main() -> any = {src}")).unwrap();
        p.call(&crate::FnPath::root("main"), vec![])
    }

    #[test]
    fn arithmetic_promotes_and_checks() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(eval("1 + 0.5").unwrap(), Value::Float(1.5));
        assert_eq!(eval("7 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(eval("7 % 3").unwrap(), Value::Int(1));
        assert_eq!(eval("1 / 0").unwrap_err(), ScriptError::DivisionByZero);
        assert!(matches!(
            eval("9223372036854775807 + 1").unwrap_err(),
            ScriptError::Type(_)
        ));
    }

    #[test]
    fn concatenation() {
        assert_eq!(eval("\"a\" + \"b\"").unwrap(), Value::from("ab"));
        assert_eq!(
            eval("[1] + [2]").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn indexing() {
        assert_eq!(eval("[1, 2, 3][-1]").unwrap(), Value::Int(3));
        assert_eq!(eval("{\"k\": 4}[\"k\"]").unwrap(), Value::Int(4));
        assert!(matches!(eval("[1][5]").unwrap_err(), ScriptError::Index(_)));
    }

    #[test]
    fn short_circuit_skips_rhs() {
        assert_eq!(eval("false && missing()").unwrap(), Value::Bool(false));
        assert_eq!(eval("1 || missing()").unwrap(), Value::Int(1));
    }

    #[test]
    fn block_scopes_do_not_leak() {
        assert_eq!(
            eval("{ let a = 2; let b = a * a; b + a }").unwrap(),
            Value::Int(6)
        );
        assert_eq!(eval("if 1 == 1.0 { \"eq\" } else { \"ne\" }").unwrap(), Value::from("eq"));
    }

    #[test]
    fn recursion_hits_depth_limit() {
        let mut p = Program::new().with_max_depth(16);
        p.load_root("fn down(n: int) -> int = down(n + 1)").unwrap();
        let err = p
            .call(&crate::FnPath::root("down"), vec![Value::Int(0)])
            .unwrap_err();
        assert_eq!(err, ScriptError::Depth(16));
    }

    #[test]
    fn defaults_fill_missing_arguments() {
        let mut p = Program::new();
        p.load_root("fn scale(x: int, by: int = 10) -> int = x * by").unwrap();
        let path = crate::FnPath::root("scale");
        assert_eq!(p.call(&path, vec![Value::Int(2)]).unwrap(), Value::Int(20));
        assert_eq!(
            p.call(&path, vec![Value::Int(2), Value::Int(3)]).unwrap(),
            Value::Int(6)
        );
        assert!(matches!(
            p.call(&path, vec![]).unwrap_err(),
            ScriptError::Arity { .. }
        ));
    }
}
