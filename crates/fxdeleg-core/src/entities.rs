//! External data-source handles.
//!
//! The binder hands telemetry a `&dyn ExternalDataSource`; only the name is
//! read. Query capabilities belong to the provider, not here.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSourceKind {
    Table,
    View,
    Service,
    Connector,
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataSourceKind::Table => "Table",
            DataSourceKind::View => "View",
            DataSourceKind::Service => "Service",
            DataSourceKind::Connector => "Connector",
        };
        f.write_str(s)
    }
}

/// A named provider of queryable data the binder may delegate to.
pub trait ExternalDataSource: Send + Sync {
    /// Display name as the author wrote it in formulas.
    fn name(&self) -> &str;

    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Table
    }
}

/// Plain data-source handle for binders that only need a name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularDataSource {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: DataSourceKind,
}

fn default_kind() -> DataSourceKind {
    DataSourceKind::Table
}

impl TabularDataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DataSourceKind::Table,
        }
    }

    pub fn with_kind(mut self, kind: DataSourceKind) -> Self {
        self.kind = kind;
        self
    }
}

impl ExternalDataSource for TabularDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DataSourceKind {
        self.kind
    }
}
