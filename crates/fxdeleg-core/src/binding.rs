//! Binding results the telemetry layer may consult.
//!
//! A real binder records far more per node; telemetry needs two lookups:
//! which function a call node resolved to, and what a first name refers to.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::functions::FunctionRef;
use crate::id::NodeId;
use crate::syntax::Ident;

/// What a first name resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameKind {
    /// Column of the row scope introduced by a table function.
    LambdaField,
    Global,
    Resource,
    DataSource,
}

/// Resolved reference for a `FirstName` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstNameInfo {
    pub node: NodeId,
    pub name: Ident,
    pub kind: NameKind,
}

impl FirstNameInfo {
    pub fn new(node: NodeId, name: impl Into<Ident>, kind: NameKind) -> Self {
        Self {
            node,
            name: name.into(),
            kind,
        }
    }
}

/// Resolution of one call node. `function` is `None` when the head did not
/// resolve (unknown function, or binding errors upstream).
#[derive(Clone)]
pub struct CallInfo {
    pub node: NodeId,
    pub function: Option<FunctionRef>,
}

impl fmt::Debug for CallInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallInfo")
            .field("node", &self.node)
            .field("function", &self.function.as_ref().map(|func| func.name()))
            .finish()
    }
}

pub trait Binding: Send + Sync {
    fn call_info(&self, node: NodeId) -> Option<&CallInfo>;

    fn first_name_info(&self, node: NodeId) -> Option<&FirstNameInfo>;
}

/// Map-backed binding used by the DSL, tests, and simple embedders.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    calls: HashMap<NodeId, CallInfo>,
    names: HashMap<NodeId, FirstNameInfo>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the resolution of a call node; a later call for the same node wins.
    pub fn bind_call(&mut self, node: NodeId, function: Option<FunctionRef>) -> &mut Self {
        self.calls.insert(node, CallInfo { node, function });
        self
    }

    pub fn bind_name(&mut self, info: FirstNameInfo) -> &mut Self {
        self.names.insert(info.node, info);
        self
    }

    pub fn len(&self) -> usize {
        self.calls.len() + self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty() && self.names.is_empty()
    }
}

impl Binding for BindingTable {
    fn call_info(&self, node: NodeId) -> Option<&CallInfo> {
        self.calls.get(&node)
    }

    fn first_name_info(&self, node: NodeId) -> Option<&FirstNameInfo> {
        self.names.get(&node)
    }
}
