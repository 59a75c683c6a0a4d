#![forbid(unsafe_code)]

//! Reference resolver: classify `bind` arguments and compute triggers.
//!
//! # Invariants
//!
//! 1. Arity is checked before any argument is looked at.
//! 2. Triggers keep first-seen order: argument references first, then
//!    explicit triggers, without duplicates.
//! 3. `triggers ∩ mute = ∅` (mute wins).

use bindery_core::{NodeId, Value};
use bindery_script::FnDef;

use super::codec::{encode_literal, ensure_finite};
use super::error::BindError;
use super::record::{Reference, SeqItem};

/// One positional argument to `bind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Node(NodeId),
    Seq(Vec<SeqArg>),
    Value(Value),
}

/// One element of a sequence argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SeqArg {
    Node(NodeId),
    Value(Value),
}

impl From<NodeId> for Arg {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&NodeId> for Arg {
    fn from(id: &NodeId) -> Self {
        Self::Node(id.clone())
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Vec<SeqArg>> for Arg {
    fn from(items: Vec<SeqArg>) -> Self {
        Self::Seq(items)
    }
}

impl From<NodeId> for SeqArg {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&NodeId> for SeqArg {
    fn from(id: &NodeId) -> Self {
        Self::Node(id.clone())
    }
}

impl From<Value> for SeqArg {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// Per-call options of `bind`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindOptions {
    pub triggers: Vec<NodeId>,
    pub mute: Vec<NodeId>,
    /// `None` defers to the engine default.
    pub on_init: Option<bool>,
}

impl BindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trigger(mut self, id: &NodeId) -> Self {
        self.triggers.push(id.clone());
        self
    }

    #[must_use]
    pub fn mute(mut self, id: &NodeId) -> Self {
        self.mute.push(id.clone());
        self
    }

    #[must_use]
    pub fn on_init(mut self, on_init: bool) -> Self {
        self.on_init = Some(on_init);
        self
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub references: Vec<Reference>,
    pub triggers: Vec<NodeId>,
}

/// Classify `args` against `def` and compute the final trigger set.
///
/// `exists` reports whether a node id is known; unknown ids in arguments,
/// triggers or mute fail with [`BindError::UnknownNode`].
pub fn resolve(
    def: &FnDef,
    args: Vec<Arg>,
    options: &BindOptions,
    exists: impl Fn(&NodeId) -> bool,
) -> Result<Resolved, BindError> {
    if args.len() > def.params.len() {
        return Err(BindError::Arity {
            function: def.name.clone(),
            expected: def.params.len(),
            received: args.len(),
        });
    }
    let check = |id: &NodeId| {
        if exists(id) {
            Ok(())
        } else {
            Err(BindError::UnknownNode(id.clone()))
        }
    };
    options.mute.iter().try_for_each(&check)?;

    let mut candidates: Vec<NodeId> = Vec::new();
    let mut references = Vec::with_capacity(args.len());
    for arg in args {
        let reference = match arg {
            Arg::Node(id) => {
                check(&id)?;
                candidates.push(id.clone());
                Reference::Node { id }
            }
            Arg::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(match item {
                        SeqArg::Node(id) => {
                            check(&id)?;
                            candidates.push(id.clone());
                            SeqItem::Node { id }
                        }
                        SeqArg::Value(v) => {
                            ensure_finite(&v)?;
                            SeqItem::Literal(v)
                        }
                    });
                }
                Reference::Sequence { items: out }
            }
            Arg::Value(v) => Reference::Literal {
                value: encode_literal(&v)?,
                pickled: true,
            },
        };
        references.push(reference);
    }
    for id in &options.triggers {
        check(id)?;
        candidates.push(id.clone());
    }

    let mut triggers: Vec<NodeId> = Vec::with_capacity(candidates.len());
    for id in candidates {
        if options.mute.contains(&id) {
            tracing::debug!(node = %id, "trigger muted");
            continue;
        }
        if !triggers.contains(&id) {
            triggers.push(id);
        }
    }
    Ok(Resolved {
        references,
        triggers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::codec::CodecError;
    use bindery_script::ROOT;

    fn def(src: &str) -> FnDef {
        FnDef::compile(src, ROOT).unwrap()
    }

    fn any(_: &NodeId) -> bool {
        true
    }

    #[test]
    fn arity_is_checked_first() {
        let f = def("fn f(a: int) -> int = a");
        let err = resolve(
            &f,
            vec![Arg::Value(Value::Int(1)), Arg::Node(NodeId::new("ghost"))],
            &BindOptions::new(),
            |_| false,
        )
        .unwrap_err();
        assert!(matches!(err, BindError::Arity { expected: 1, received: 2, .. }));
    }

    #[test]
    fn classifies_each_argument() {
        let f = def("fn f(a: int, b: list, c: str) -> int = a");
        let a = NodeId::new("a");
        let b = NodeId::new("b");
        let out = resolve(
            &f,
            vec![
                Arg::from(&a),
                Arg::Seq(vec![SeqArg::from(&b), SeqArg::Value(Value::Int(2))]),
                Arg::Value(Value::from("x")),
            ],
            &BindOptions::new(),
            any,
        )
        .unwrap();
        assert_eq!(out.references[0], Reference::Node { id: a.clone() });
        assert!(matches!(out.references[1], Reference::Sequence { ref items } if items.len() == 2));
        assert!(matches!(out.references[2], Reference::Literal { pickled: true, .. }));
        assert_eq!(out.triggers, vec![a, b]);
    }

    #[test]
    fn explicit_triggers_union_and_dedupe() {
        let f = def("fn f(a: int) -> int = a");
        let a = NodeId::new("a");
        let c = NodeId::new("c");
        let out = resolve(
            &f,
            vec![Arg::from(&a)],
            &BindOptions::new().trigger(&c).trigger(&a),
            any,
        )
        .unwrap();
        assert_eq!(out.triggers, vec![a, c]);
    }

    #[test]
    fn mute_wins_over_argument_and_trigger() {
        let f = def("fn f(a: int) -> int = a");
        let a = NodeId::new("a");
        let out = resolve(
            &f,
            vec![Arg::from(&a)],
            &BindOptions::new().trigger(&a).mute(&a),
            any,
        )
        .unwrap();
        assert!(out.triggers.is_empty());
        assert_eq!(out.references, vec![Reference::Node { id: a }]);
    }

    #[test]
    fn non_finite_literals_fail_to_bind() {
        let f = def("fn f(a: float, b: list) -> float = a");
        let err = resolve(
            &f,
            vec![Arg::Value(Value::Float(f64::NAN))],
            &BindOptions::new(),
            any,
        )
        .unwrap_err();
        assert!(matches!(err, BindError::Serialize(CodecError::NonFinite(_))));

        let err = resolve(
            &f,
            vec![
                Arg::Value(Value::Float(1.5)),
                Arg::Seq(vec![SeqArg::Value(Value::Float(f64::INFINITY))]),
            ],
            &BindOptions::new(),
            any,
        )
        .unwrap_err();
        assert!(matches!(err, BindError::Serialize(CodecError::NonFinite(_))));
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let f = def("fn f(a: int) -> int = a");
        let err = resolve(
            &f,
            vec![],
            &BindOptions::new().trigger(&NodeId::new("nope")),
            |id| id.as_str() != "nope",
        )
        .unwrap_err();
        assert!(matches!(err, BindError::UnknownNode(_)));
    }
}
