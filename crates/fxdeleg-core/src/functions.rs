//! Function handles as seen by the binder.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A callable the binder resolved a call node to.
pub trait TexlFunction: Send + Sync + fmt::Debug {
    /// Invariant name, e.g. `Filter` or `LookUp`.
    fn name(&self) -> &str;
}

/// Shared handle stored in bindings.
pub type FunctionRef = Arc<dyn TexlFunction>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinFunction {
    pub name: String,
}

impl BuiltinFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn into_ref(self) -> FunctionRef {
        Arc::new(self)
    }
}

impl TexlFunction for BuiltinFunction {
    fn name(&self) -> &str {
        &self.name
    }
}
