#![forbid(unsafe_code)]

//! Reactive bindings between nodes.
//!
//! A binding attaches a script function to a target node. Its arguments are
//! other nodes (live references), sequences mixing nodes and literals, or
//! plain literals. Whenever a trigger node changes, an external transport
//! asks the [`Executor`] to re-run the binding and the result replaces the
//! target's state.
//!
//! - [`resolver`]: classifies `bind` arguments and computes triggers.
//! - [`cycle`]: one-hop trigger loop guard.
//! - [`adapt`]: decides how a result reaches the target ([`ReturnWrap`]).
//! - [`portability`]: rehomes helpers and captures a [`PortableBody`].
//! - [`record`]: the [`BindingRecord`] wire shape.
//! - [`table`]: the per-application [`FunctionTable`].
//! - [`coerce`]: argument defaults and type coercion at execution.
//! - [`executor`]: remote execution contract.
//! - [`eager`]: best-effort evaluation at bind time.
//!
//! # Architecture
//!
//! Authoring and execution share nothing but the function table and node
//! values. Everything a body needs to run is captured at bind time, encoded
//! (`JSON -> zlib -> base64`) into `serBody`, and decoded into a fresh
//! program on the executing side.
//!
//! # Invariants
//!
//! 1. A failed `bind` leaves the target node and the function table
//!    unchanged.
//! 2. Every `bind` call gets a fresh [`BodyId`].
//! 3. `triggers ∩ mute = ∅`.

pub mod adapt;
pub mod codec;
pub mod coerce;
pub mod cycle;
pub mod eager;
pub mod error;
pub mod executor;
pub mod portability;
pub mod record;
pub mod resolver;
pub mod table;

pub use adapt::ReturnWrap;
pub use codec::CodecError;
pub use coerce::{ArgValue, coerce_args};
pub use eager::EagerOutcome;
pub use error::{BindError, ExecError, PortabilityWarning, RehomeFailure};
pub use executor::{Executor, NodeGraph};
pub use portability::PortableBody;
pub use record::{BindingRecord, BodyId, NodeBinding, Parameter, Provider, Reference, SeqItem};
pub use resolver::{Arg, BindOptions, Resolved, SeqArg};
pub use table::{FunctionEntry, FunctionTable};
