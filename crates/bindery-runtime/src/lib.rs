#![forbid(unsafe_code)]

//! Reactive binding engine for Bindery.
//!
//! # Role in Bindery
//! `bindery-runtime` turns authoring-time `bind` calls into self-contained
//! binding records that a separate process can execute. It owns the
//! reference resolver, the cycle guard, the portability transform, the
//! function table, registration stores and the executor contract.
//!
//! # Primary responsibilities
//! - **App**: per-application registry of nodes, bindings and functions.
//! - **reactive**: everything between `bind` and a node state patch.
//! - **store**: persisting registered applications and function bodies.
//! - **config**: TOML-loaded engine tunables.
//!
//! # How it fits in the system
//! Nodes and values come from `bindery-core`; functions are written in the
//! `bindery-script` language. A transport layer outside this crate decides
//! when to run a binding and calls [`Executor::execute`] (or
//! [`App::execute`] in-process).

pub mod app;
pub mod config;
pub mod reactive;
pub mod store;

pub use app::{App, BindReport, NodeStore};
pub use config::{ConfigError, EngineConfig};
pub use reactive::{
    Arg, BindError, BindOptions, BindingRecord, BodyId, EagerOutcome, ExecError, Executor,
    FunctionEntry, FunctionTable, NodeBinding, NodeGraph, PortabilityWarning, PortableBody,
    Provider, Reference, RehomeFailure, ReturnWrap, SeqArg,
};
pub use store::{AppKey, AppStore, JsonFileStore, MemoryStore, StoreError};
