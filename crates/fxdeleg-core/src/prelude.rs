//! Convenient re-exports for downstream crates.

pub use crate::binding::{Binding, BindingTable, CallInfo, FirstNameInfo, NameKind};
pub use crate::config::{TelemetryConfig, TelemetryOverlay};
pub use crate::entities::{DataSourceKind, ExternalDataSource, TabularDataSource};
pub use crate::error::{Error, Result};
pub use crate::functions::{BuiltinFunction, FunctionRef, TexlFunction};
pub use crate::id::{NodeId, NodeIdGen};
pub use crate::syntax::{BinaryOp, CallNode, Expr, Ident, Node, NodeKind, UnaryOp};
pub use crate::types::{DKind, DType};
