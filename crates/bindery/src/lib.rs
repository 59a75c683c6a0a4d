#![forbid(unsafe_code)]

//! Bindery public facade.
//!
//! Bindery builds data applications out of nodes whose values are kept in
//! sync by bindings: script functions attached to a target node and re-run
//! whenever one of their trigger nodes changes.
//!
//! ```ignore
//! use bindery::prelude::*;
//!
//! let mut app = App::new("temperatures");
//! let slider = app.add_node(Slider::new().range(-40, 120));
//! let label = app.add_node(Text::empty());
//! app.load_root("fn celsius(f: int) -> str = str(round((f - 32) * 5 / 9)) + \" C\"")?;
//! app.bind(&label, "celsius", vec![Arg::from(&slider)], BindOptions::new())?;
//! ```
//!
//! # Crates
//!
//! - [`bindery_core`]: values, type names, the node contract.
//! - [`bindery_script`]: the function language.
//! - [`bindery_runtime`]: binding, registration and execution.
//! - `bindery_widgets`: stock node kinds (feature `widgets`, on by default).

pub use bindery_core;
pub use bindery_runtime;
pub use bindery_script;
#[cfg(feature = "widgets")]
pub use bindery_widgets;

pub use bindery_core::{Node, NodeId, TypeName, Value};
pub use bindery_runtime::{
    App, AppKey, AppStore, Arg, BindError, BindOptions, BindReport, EngineConfig, ExecError,
    Executor, JsonFileStore, MemoryStore, SeqArg,
};

/// Everything needed to author an application.
pub mod prelude {
    pub use bindery_core::{
        Adapter, ArtifactId, ArtifactStore, MemoryArtifacts, Node, NodeId, NodeKind, NodeState,
        Table, TypeName, Value,
    };
    pub use bindery_runtime::{
        App, AppKey, AppStore, Arg, BindError, BindOptions, BindReport, BodyId, EagerOutcome,
        EngineConfig, ExecError, Executor, FunctionTable, JsonFileStore, MemoryStore, NodeGraph,
        PortabilityWarning, SeqArg,
    };
    pub use bindery_script::{FnDef, FnPath, Program, ScriptError};
    #[cfg(feature = "widgets")]
    pub use bindery_widgets::{Checkbox, NumberInput, Selector, Slider, TableView, Text};
}
