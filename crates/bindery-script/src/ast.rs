//! Syntax tree.
//!
//! The tree is serde-serializable: a portable function body is shipped as
//! its parsed definition, so the executing side never has to re-parse.

use std::collections::BTreeSet;
use std::ops::Range;

use bindery_core::{TypeName, Value};
use serde::{Deserialize, Serialize};

/// Byte range into the source text.
pub type Span = Range<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Lit(Value),
    Var(String),
    List(Vec<Expr>),
    Map(Vec<(String, Expr)>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `{ let a = x; let b = y; tail }`
    Block {
        lets: Vec<(String, Expr)>,
        tail: Box<Expr>,
    },
}

impl Expr {
    /// Collect the names of every function this expression calls.
    pub fn collect_calls(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Lit(_) | Self::Var(_) => {}
            Self::List(items) => items.iter().for_each(|e| e.collect_calls(out)),
            Self::Map(entries) => entries.iter().for_each(|(_, e)| e.collect_calls(out)),
            Self::Call { name, args } => {
                out.insert(name.clone());
                args.iter().for_each(|e| e.collect_calls(out));
            }
            Self::Index { target, index } => {
                target.collect_calls(out);
                index.collect_calls(out);
            }
            Self::Unary { expr, .. } => expr.collect_calls(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_calls(out);
                rhs.collect_calls(out);
            }
            Self::If {
                cond,
                then,
                otherwise,
            } => {
                cond.collect_calls(out);
                then.collect_calls(out);
                otherwise.collect_calls(out);
            }
            Self::Block { lets, tail } => {
                lets.iter().for_each(|(_, e)| e.collect_calls(out));
                tail.collect_calls(out);
            }
        }
    }

    /// Fold a constant expression (literals, negated numbers, lists and maps
    /// of constants) to a value.
    #[must_use]
    pub fn const_value(&self) -> Option<Value> {
        match self {
            Self::Lit(v) => Some(v.clone()),
            Self::Unary {
                op: UnaryOp::Neg,
                expr,
            } => match expr.const_value()? {
                Value::Int(i) => i.checked_neg().map(Value::Int),
                Value::Float(f) => Some(Value::Float(-f)),
                _ => None,
            },
            Self::List(items) => items
                .iter()
                .map(Expr::const_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Self::Map(entries) => entries
                .iter()
                .map(|(k, e)| e.const_value().map(|v| (k.clone(), v)))
                .collect::<Option<_>>()
                .map(Value::Map),
            _ => None,
        }
    }
}

/// One declared parameter of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
    pub default: Option<Value>,
}

/// A parsed `fn` item before it is placed in a module.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub result: TypeName,
    pub body: Expr,
    /// Span of the whole item in its source.
    pub span: Span,
}

/// A parsed `use module::name;` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_calls_walks_nested_expressions() {
        let expr = Expr::If {
            cond: Box::new(Expr::Call {
                name: "ready".into(),
                args: vec![],
            }),
            then: Box::new(Expr::Block {
                lets: vec![(
                    "x".into(),
                    Expr::Call {
                        name: "scale".into(),
                        args: vec![Expr::Var("n".into())],
                    },
                )],
                tail: Box::new(Expr::Var("x".into())),
            }),
            otherwise: Box::new(Expr::Lit(Value::Null)),
        };
        let mut calls = BTreeSet::new();
        expr.collect_calls(&mut calls);
        assert_eq!(
            calls.into_iter().collect::<Vec<_>>(),
            vec!["ready".to_string(), "scale".to_string()]
        );
    }

    #[test]
    fn const_value_folds_negation_and_lists() {
        let expr = Expr::List(vec![
            Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(Expr::Lit(Value::Int(2))),
            },
            Expr::Lit(Value::from("a")),
        ]);
        assert_eq!(
            expr.const_value(),
            Some(Value::List(vec![Value::Int(-2), Value::from("a")]))
        );
        assert_eq!(Expr::Var("x".into()).const_value(), None);
    }
}
