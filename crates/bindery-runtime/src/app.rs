#![forbid(unsafe_code)]

//! Applications: the registry that owns nodes, their bindings, the script
//! program and the function table.
//!
//! An [`App`] replaces a process-global function table with an explicit
//! per-application registry. Authoring code adds nodes, loads script
//! modules and calls [`App::bind`]. Once [`App::register`] attaches a
//! backing [`AppStore`], every new body id is persisted as it is created;
//! ids created before registration are queued and flushed at registration.
//!
//! # Invariants
//!
//! 1. A failed `bind` leaves every node's bind list and the function table
//!    unchanged.
//! 2. Every body id in the function table reaches the store at least once
//!    after registration, whichever side of `register` it was created on.
//!
//! # Failure Modes
//!
//! - A store write during `bind` does not fail the bind. The id stays in the
//!   unsynced queue and is retried by [`App::flush`].

use std::fmt;
use std::sync::Arc;

use bindery_core::{ArtifactStore, MemoryArtifacts, Node, NodeId, NodeState, Value};
use bindery_script::{FnPath, Program, ScriptError};
use indexmap::IndexMap;

use crate::config::EngineConfig;
use crate::reactive::codec::encode_body;
use crate::reactive::eager::{self, EagerOutcome};
use crate::reactive::portability::{capture, rehome};
use crate::reactive::resolver::{Arg, BindOptions, resolve};
use crate::reactive::{
    BindError, BindingRecord, BodyId, ExecError, Executor, FunctionEntry, FunctionTable,
    NodeBinding, NodeGraph, Parameter, PortabilityWarning, Provider, ReturnWrap, cycle,
};
use crate::store::{AppKey, AppStore, StoreError};

/// What a successful `bind` produced.
#[derive(Debug)]
pub struct BindReport {
    pub body_id: BodyId,
    /// Helpers that could not be made portable.
    pub warnings: Vec<PortabilityWarning>,
    pub eager: EagerOutcome,
}

struct NodeSlot {
    node: Box<dyn Node>,
    bindings: Vec<NodeBinding>,
    providers: Vec<Provider>,
}

/// Nodes in insertion order, each with its bind list.
#[derive(Default)]
pub struct NodeStore {
    slots: IndexMap<NodeId, NodeSlot>,
}

impl NodeStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.slots.keys()
    }

    /// Function bindings attached to `id`.
    #[must_use]
    pub fn records(&self, id: &NodeId) -> Vec<&BindingRecord> {
        self.slots
            .get(id)
            .map(|slot| {
                slot.bindings
                    .iter()
                    .filter_map(NodeBinding::as_record)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find_record(&self, body: &BodyId) -> Option<&BindingRecord> {
        self.slots
            .values()
            .flat_map(|slot| slot.bindings.iter().filter_map(NodeBinding::as_record))
            .find(|record| &record.body_id == body)
    }
}

impl NodeGraph for NodeStore {
    fn node(&self, id: &NodeId) -> Option<&dyn Node> {
        self.slots.get(id).map(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut dyn Node> {
        let slot = self.slots.get_mut(id)?;
        Some(slot.node.as_mut())
    }
}

impl fmt::Debug for NodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.slots
                    .iter()
                    .map(|(id, slot)| (id.as_str(), slot.node.kind())),
            )
            .finish()
    }
}

enum Registration {
    /// Not yet registered; ids wait for the store.
    Pending(Vec<BodyId>),
    Registered {
        store: Arc<dyn AppStore>,
        key: AppKey,
        /// Ids whose persistence failed and awaits a retry.
        unsynced: Vec<BodyId>,
    },
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(ids) => f.debug_tuple("Pending").field(&ids.len()).finish(),
            Self::Registered { key, unsynced, .. } => f
                .debug_struct("Registered")
                .field("key", key)
                .field("unsynced", &unsynced.len())
                .finish(),
        }
    }
}

/// A data application: nodes, bindings and their shared function table.
pub struct App {
    name: String,
    description: Option<String>,
    version: (u32, u32),
    tags: Vec<String>,
    nodes: NodeStore,
    program: Program,
    functions: FunctionTable,
    registration: Registration,
    config: EngineConfig,
    artifacts: Arc<dyn ArtifactStore>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("nodes", &self.nodes)
            .field("functions", &self.functions.len())
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

impl App {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let config = EngineConfig::default();
        Self {
            name: name.into(),
            description: None,
            version: (1, 0),
            tags: Vec::new(),
            nodes: NodeStore::default(),
            program: Program::new().with_max_depth(config.max_call_depth),
            functions: FunctionTable::new(),
            registration: Registration::Pending(Vec::new()),
            config,
            artifacts: Arc::new(MemoryArtifacts::new()),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.program.set_max_depth(config.max_call_depth);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, major: u32, minor: u32) -> Self {
        self.version = (major, minor);
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> AppKey {
        AppKey::new(self.name.clone(), self.version.0, self.version.1)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    #[must_use]
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self.registration, Registration::Registered { .. })
    }

    /// Ids created but not yet confirmed by a store.
    #[must_use]
    pub fn unsynced(&self) -> &[BodyId] {
        match &self.registration {
            Registration::Pending(ids) => ids,
            Registration::Registered { unsynced, .. } => unsynced,
        }
    }

    // ── Authoring ─────────────────────────────────────────────────────

    /// Add a node and return its id. A node with the same id is replaced
    /// together with its bind list.
    pub fn add_node(&mut self, node: impl Node + 'static) -> NodeId {
        let id = node.id().clone();
        tracing::debug!(node = %id, kind = %node.kind(), "node added");
        self.nodes.slots.insert(
            id.clone(),
            NodeSlot {
                node: Box::new(node),
                bindings: Vec::new(),
                providers: Vec::new(),
            },
        );
        id
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&dyn Node> {
        self.nodes.node(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut dyn Node> {
        self.nodes.node_mut(id)
    }

    #[must_use]
    pub fn value(&self, id: &NodeId) -> Option<Value> {
        self.nodes.value_of(id)
    }

    /// Simulate user input on a node.
    pub fn set_value(&mut self, id: &NodeId, value: impl Into<Value>) -> Result<(), BindError> {
        let node = self
            .nodes
            .node_mut(id)
            .ok_or_else(|| BindError::UnknownNode(id.clone()))?;
        node.set_value(value.into());
        Ok(())
    }

    pub fn load_module(&mut self, name: &str, source: &str) -> Result<Vec<String>, ScriptError> {
        self.program.load_module(name, source)
    }

    pub fn load_root(&mut self, source: &str) -> Result<Vec<String>, ScriptError> {
        self.program.load_root(source)
    }

    #[must_use]
    pub fn bindings(&self, id: &NodeId) -> &[NodeBinding] {
        self.nodes
            .slots
            .get(id)
            .map_or(&[][..], |slot| slot.bindings.as_slice())
    }

    #[must_use]
    pub fn records(&self, id: &NodeId) -> Vec<&BindingRecord> {
        self.nodes.records(id)
    }

    /// Bodies that must re-run when `changed` changes, in node order.
    #[must_use]
    pub fn dependents(&self, changed: &NodeId) -> Vec<BodyId> {
        self.nodes
            .slots
            .values()
            .flat_map(|slot| slot.bindings.iter().filter_map(NodeBinding::as_record))
            .filter(|record| record.is_triggered_by(changed))
            .map(|record| record.body_id.clone())
            .collect()
    }

    /// Attach `function` (`"name"` or `"module::name"`) to `target`.
    ///
    /// Validation runs in this order: function and target lookup, arity,
    /// argument node lookup, return compatibility, trigger cycles. Helpers
    /// are rehomed into a staged copy of the program, which replaces the
    /// live one only once the body has been encoded.
    pub fn bind(
        &mut self,
        target: &NodeId,
        function: &str,
        args: Vec<Arg>,
        options: BindOptions,
    ) -> Result<BindReport, BindError> {
        let span = tracing::debug_span!("bind", target = %target, function);
        let _guard = span.enter();

        let path = FnPath::parse(function);
        let def = self
            .program
            .lookup(&path)
            .cloned()
            .ok_or_else(|| BindError::UnknownFunction(path.to_string()))?;
        let target_node = self
            .nodes
            .node(target)
            .ok_or_else(|| BindError::UnknownNode(target.clone()))?;

        let resolved = resolve(&def, args, &options, |id| self.nodes.contains(id))?;
        let wrap = ReturnWrap::plan(&def.result, target_node)?;
        cycle::check(
            target,
            &resolved.triggers,
            self.config.self_trigger_is_cycle,
            |id| self.nodes.records(id),
        )?;

        let mut staged = self.program.clone();
        let warnings = rehome(&mut staged, &def);
        let body = capture(&staged, &def, wrap, target.clone());
        let ser_body = encode_body(&body, self.config.compression_level)?;
        self.program = staged;

        let body_id = BodyId::generate();
        let parameters: Vec<Parameter> = def.params.iter().map(Parameter::from).collect();
        let record = BindingRecord {
            body_id: body_id.clone(),
            result: def.result.clone(),
            parameters: parameters.clone(),
            triggers: resolved.triggers,
            references: resolved.references,
            portable_body: ser_body.clone(),
        };
        self.functions.insert(FunctionEntry {
            body: body_id.clone(),
            parameters,
            result: def.result,
            ser_body,
        });
        if let Some(slot) = self.nodes.slots.get_mut(target) {
            slot.bindings.push(NodeBinding::Function(record.clone()));
        }
        tracing::debug!(body = %body_id, triggers = record.triggers.len(), "binding created");
        self.track(body_id.clone());

        let eager = if options.on_init.unwrap_or(self.config.eager_by_default) {
            eager::evaluate(
                &mut self.nodes,
                &record,
                &body,
                self.artifacts.as_ref(),
                self.config.max_call_depth,
            )
        } else {
            EagerOutcome::Skipped
        };

        Ok(BindReport {
            body_id,
            warnings,
            eager,
        })
    }

    /// Attach a raw property expression to `target`'s bind list.
    pub fn bind_props(&mut self, target: &NodeId, props: serde_json::Value) -> Result<(), BindError> {
        let slot = self
            .nodes
            .slots
            .get_mut(target)
            .ok_or_else(|| BindError::UnknownNode(target.clone()))?;
        slot.bindings.push(NodeBinding::Props(props));
        Ok(())
    }

    /// Record that `attribute` of `target` is fed by `provider`.
    pub fn add_provider(
        &mut self,
        target: &NodeId,
        provider: &NodeId,
        attribute: impl Into<String>,
    ) -> Result<(), BindError> {
        if !self.nodes.contains(provider) {
            return Err(BindError::UnknownNode(provider.clone()));
        }
        let slot = self
            .nodes
            .slots
            .get_mut(target)
            .ok_or_else(|| BindError::UnknownNode(target.clone()))?;
        slot.providers.push(Provider {
            id: provider.clone(),
            target: attribute.into(),
        });
        Ok(())
    }

    // ── Registration ──────────────────────────────────────────────────

    fn track(&mut self, id: BodyId) {
        match &mut self.registration {
            Registration::Pending(ids) => ids.push(id),
            Registration::Registered {
                store,
                key,
                unsynced,
            } => {
                let result = persist(store.as_ref(), key, &self.functions, std::slice::from_ref(&id));
                if let Err(error) = result {
                    tracing::warn!(app = %key, body = %id, %error, "body id not persisted; queued for retry");
                    unsynced.push(id);
                }
            }
        }
    }

    /// Register with `store` and flush every queued body id.
    ///
    /// On a flush failure the app stays registered and the ids remain
    /// queued for [`App::flush`].
    pub fn register(&mut self, store: Arc<dyn AppStore>) -> Result<(), StoreError> {
        let key = self.key();
        let spec = self.to_json()?;
        store.register(&key, &spec)?;
        tracing::debug!(app = %key, "application registered");

        let queued = match std::mem::replace(&mut self.registration, Registration::Pending(Vec::new())) {
            Registration::Pending(ids) => ids,
            Registration::Registered { unsynced, .. } => unsynced,
        };
        self.registration = Registration::Registered {
            store,
            key,
            unsynced: queued,
        };
        self.flush().map(|_| ())
    }

    /// Retry persisting queued ids. Returns how many were written.
    pub fn flush(&mut self) -> Result<usize, StoreError> {
        let Registration::Registered {
            store,
            key,
            unsynced,
        } = &mut self.registration
        else {
            return Ok(0);
        };
        if unsynced.is_empty() {
            return Ok(0);
        }
        persist(store.as_ref(), key, &self.functions, unsynced)?;
        let flushed = unsynced.len();
        unsynced.clear();
        tracing::debug!(app = %key, flushed, "queued body ids persisted");
        Ok(flushed)
    }

    /// Remove the application's bodies from its store and unregister it.
    ///
    /// The local function table and every function binding are cleared;
    /// the app may be registered again afterwards.
    pub fn delete(&mut self) -> Result<Vec<BodyId>, StoreError> {
        let ids: Vec<BodyId> = self.functions.ids().cloned().collect();
        if let Registration::Registered { store, key, .. } = &self.registration {
            store.remove_data(key, &ids)?;
            store.unregister(key)?;
            tracing::debug!(app = %key, removed = ids.len(), "application deleted");
        }
        self.functions.clear();
        for slot in self.nodes.slots.values_mut() {
            slot.bindings
                .retain(|binding| matches!(binding, NodeBinding::Props(_)));
        }
        self.registration = Registration::Pending(Vec::new());
        Ok(ids)
    }

    // ── Execution ─────────────────────────────────────────────────────

    /// Run one binding locally, as the executing side would.
    pub fn execute(&mut self, body: &BodyId) -> Result<NodeState, ExecError> {
        let record = self
            .nodes
            .find_record(body)
            .cloned()
            .ok_or_else(|| ExecError::UnknownBody(body.clone()))?;
        Executor::new(&self.functions, self.artifacts.as_ref())
            .with_max_depth(self.config.max_call_depth)
            .execute(&mut self.nodes, &record)
    }

    /// Run every binding triggered by `changed`, in node order.
    pub fn propagate(&mut self, changed: &NodeId) -> Vec<(BodyId, Result<NodeState, ExecError>)> {
        self.dependents(changed)
            .into_iter()
            .map(|body| {
                let outcome = self.execute(&body);
                if let Err(error) = &outcome {
                    tracing::warn!(body = %body, %error, "binding failed");
                }
                (body, outcome)
            })
            .collect()
    }

    // ── Export ────────────────────────────────────────────────────────

    /// Application description with function bodies stripped.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for slot in self.nodes.slots.values() {
            let mut bind = slot
                .bindings
                .iter()
                .map(NodeBinding::to_json)
                .collect::<Result<Vec<_>, _>>()?;
            if !slot.providers.is_empty() {
                bind.push(serde_json::json!({ "providers": slot.providers }));
            }
            let mut widget = slot.node.to_dict_widget();
            if let serde_json::Value::Object(map) = &mut widget {
                map.insert("bind".into(), serde_json::Value::Array(bind));
            }
            nodes.push(widget);
        }
        Ok(serde_json::json!({
            "name": self.name,
            "description": self.description,
            "version": { "major": self.version.0, "minor": self.version.1 },
            "tags": self.tags,
            "nodes": nodes,
            "functions": self.functions.to_json_stripped(),
        }))
    }
}

fn persist(
    store: &dyn AppStore,
    key: &AppKey,
    functions: &FunctionTable,
    ids: &[BodyId],
) -> Result<(), StoreError> {
    let entries: Vec<FunctionEntry> = ids
        .iter()
        .filter_map(|id| functions.get(id).cloned())
        .collect();
    store.save_functions(key, &entries)?;
    store.add_data(key, ids)
}
