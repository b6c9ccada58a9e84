//! YAML → delegation events.
//!
//! Replays binder decisions without a binder: declare the data sources and
//! functions once, then list one entry per decision.
//!
//! Example:
//! ```yaml
//! data_sources:
//!   - name: Accounts
//! functions:
//!   - name: Filter
//! events:
//!   - event: binary_op_not_supported
//!     op: "<>"
//!   - event: impure_node
//!     node: { expr: { call: { head: Rand } } }
//!     binding: { callee: null }
//!   - event: delegation_successful
//!     data_source: Accounts
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fxdeleg_core::binding::{BindingTable, FirstNameInfo, NameKind};
use fxdeleg_core::config::TelemetryOverlay;
use fxdeleg_core::entities::{ExternalDataSource, TabularDataSource};
use fxdeleg_core::error::Error as CoreError;
use fxdeleg_core::functions::{BuiltinFunction, FunctionRef};
use fxdeleg_core::syntax::{BinaryOp, Node, UnaryOp};
use fxdeleg_core::types::DType;

use crate::descriptor::DelegationTelemetryInfo;
use crate::error::Result;
use crate::status::DelegationStatus;
use crate::tracker::DelegationEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFile {
    #[serde(default)]
    pub config: Option<TelemetryOverlay>,
    #[serde(default)]
    pub data_sources: Vec<TabularDataSource>,
    #[serde(default)]
    pub functions: Vec<BuiltinFunction>,
    pub events: Vec<EventDef>,
}

/// Binding for the event's node: `callee: null` means the binder saw the
/// call but could not resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallBindingDef {
    #[serde(default)]
    pub callee: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum EventDef {
    Empty,

    BinaryOpNotSupported {
        op: String,
    },

    UnaryOpNotSupported {
        op: String,
    },

    DataSourceNotDelegatable {
        data_source: String,
    },

    UndelegatableFunction {
        #[serde(default)]
        function: Option<String>,
    },

    /// With `name_kind` the column is reported as a resolved reference,
    /// without it as a literal name.
    ColumnNotDelegatable {
        column: String,
        #[serde(default)]
        name_kind: Option<NameKind>,
    },

    ImpureNode {
        node: Node,
        #[serde(default)]
        binding: Option<CallBindingDef>,
    },

    DelegationSuccessful {
        #[serde(default)]
        data_source: Option<String>,
    },

    UnsupportedSortArg {
        node: Node,
        #[serde(default)]
        data_source: Option<String>,
    },

    InvalidArgType {
        arg_type: DType,
        #[serde(default)]
        data_source: Option<String>,
    },
}

/// Parse and validate an event file. Names are resolved later, per event.
pub fn parse_yaml_events(yaml: &str) -> Result<EventFile> {
    let file: EventFile = serde_yaml::from_str(yaml)?;
    if let Some(cfg) = &file.config {
        cfg.validate()?;
    }
    Ok(file)
}

/// Name → handle tables built from the file's declarations.
struct Catalog<'a> {
    data_sources: HashMap<&'a str, &'a TabularDataSource>,
    functions: HashMap<&'a str, FunctionRef>,
}

impl<'a> Catalog<'a> {
    fn new(file: &'a EventFile) -> Self {
        Self {
            data_sources: file
                .data_sources
                .iter()
                .map(|ds| (ds.name.as_str(), ds))
                .collect(),
            functions: file
                .functions
                .iter()
                .map(|f| (f.name.as_str(), f.clone().into_ref()))
                .collect(),
        }
    }

    fn data_source(&self, name: &str) -> Result<&'a TabularDataSource> {
        self.data_sources
            .get(name)
            .copied()
            .ok_or_else(|| {
                CoreError::Resolve(format!("data source '{}' is not declared", name)).into()
            })
    }

    fn optional_data_source(&self, name: Option<&str>) -> Result<Option<&'a TabularDataSource>> {
        name.map(|n| self.data_source(n)).transpose()
    }

    fn function(&self, name: &str) -> Result<FunctionRef> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CoreError::Resolve(format!("function '{}' is not declared", name)).into()
            })
    }
}

fn as_dyn(ds: Option<&TabularDataSource>) -> Option<&dyn ExternalDataSource> {
    ds.map(|d| d as &dyn ExternalDataSource)
}

impl EventFile {
    /// Build one event per entry, in file order. Stops at the first entry
    /// that names something undeclared or carries an invalid operator.
    pub fn events(&self) -> Result<Vec<DelegationEvent>> {
        let catalog = Catalog::new(self);
        self.events
            .iter()
            .map(|def| build_event(&catalog, def))
            .collect()
    }
}

fn build_event(catalog: &Catalog<'_>, def: &EventDef) -> Result<DelegationEvent> {
    use DelegationStatus as S;
    use DelegationTelemetryInfo as D;

    let event = match def {
        // The no-info descriptor is what an unknown function reports.
        EventDef::Empty => DelegationEvent::new(S::UndelegatableFunction, D::empty()),
        EventDef::BinaryOpNotSupported { op } => {
            let op: BinaryOp = op.parse()?;
            DelegationEvent::new(S::BinaryOpNotSupported, D::binary_op_not_supported(op))
        }
        EventDef::UnaryOpNotSupported { op } => {
            let op: UnaryOp = op.parse()?;
            DelegationEvent::new(S::UnaryOpNotSupported, D::unary_op_not_supported(op))
        }
        EventDef::DataSourceNotDelegatable { data_source } => {
            let ds = catalog.data_source(data_source)?;
            DelegationEvent::new(S::DataSourceNotDelegatable, D::data_source_not_delegatable(ds))
        }
        EventDef::UndelegatableFunction { function } => {
            let func = function.as_deref().map(|f| catalog.function(f)).transpose()?;
            DelegationEvent::new(
                S::UndelegatableFunction,
                D::undelegatable_function(func.as_deref()),
            )
            .with_function(func.as_deref())
        }
        EventDef::ColumnNotDelegatable { column, name_kind } => {
            if column.is_empty() {
                return Err(CoreError::Syntax(
                    "column_not_delegatable needs a non-empty column".into(),
                )
                .into());
            }
            let info = match name_kind {
                Some(kind) => {
                    let name = FirstNameInfo::new(Default::default(), column.as_str(), *kind);
                    D::column_not_delegatable(&name)
                }
                None => D::column_name_not_delegatable(column),
            };
            DelegationEvent::new(S::NoDelegationSupportByColumn, info)
        }
        EventDef::ImpureNode { node, binding } => {
            let info = match binding {
                Some(def) => {
                    let callee = def.callee.as_deref().map(|c| catalog.function(c)).transpose()?;
                    let mut table = BindingTable::new();
                    table.bind_call(node.id, callee);
                    D::impure_node(node, Some(&table))
                }
                None => D::impure_node(node, None),
            };
            DelegationEvent::new(S::ImpureNode, info).with_node(node)
        }
        EventDef::DelegationSuccessful { data_source } => {
            let ds = catalog.optional_data_source(data_source.as_deref())?;
            DelegationEvent::new(S::DelegationSuccessful, D::delegation_successful(as_dyn(ds)))
        }
        EventDef::UnsupportedSortArg { node, data_source } => {
            let ds = catalog.optional_data_source(data_source.as_deref())?;
            DelegationEvent::new(S::UnsupportedSortArg, D::unsupported_sort_arg(node, as_dyn(ds)))
                .with_node(node)
        }
        EventDef::InvalidArgType { arg_type, data_source } => {
            let ds = catalog.optional_data_source(data_source.as_deref())?;
            DelegationEvent::new(S::InvalidArgType, D::invalid_arg_type(arg_type, as_dyn(ds)))
        }
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn undeclared_data_source_is_a_resolve_error() {
        let yaml = r#"
events:
  - event: delegation_successful
    data_source: Ghost
"#;
        let file = parse_yaml_events(yaml).unwrap();
        let err = file.events().unwrap_err();
        assert!(matches!(err, Error::Core(CoreError::Resolve(_))));
    }

    #[test]
    fn empty_column_is_rejected_before_construction() {
        let yaml = r#"
events:
  - event: column_not_delegatable
    column: ""
"#;
        let file = parse_yaml_events(yaml).unwrap();
        assert!(matches!(file.events(), Err(Error::Core(CoreError::Syntax(_)))));
    }

    #[test]
    fn bad_operator_is_a_syntax_error() {
        let yaml = r#"
events:
  - event: unary_op_not_supported
    op: "~"
"#;
        let file = parse_yaml_events(yaml).unwrap();
        assert!(matches!(file.events(), Err(Error::Core(CoreError::Syntax(_)))));
    }

    #[test]
    fn invalid_config_block_fails_parse() {
        let yaml = r#"
config:
  max_events: 0
events: []
"#;
        assert!(matches!(
            parse_yaml_events(yaml),
            Err(Error::Core(CoreError::Config(_)))
        ));
    }
}
