//! Delegation telemetry descriptor.
//!
//! One immutable value per delegation decision: `info` names the construct
//! that blocked (or was involved in) delegation, `data_source_name` names the
//! source when the event concerns one. Each constructor below is the single
//! way to build the descriptor for its event category.
//!
//! Contract violations (e.g. an empty column name) are programming errors in
//! the binder and panic. Absent optional handles are not errors: they fall
//! back to `""` / `None`.

use std::fmt;

use fxdeleg_core::binding::{Binding, FirstNameInfo};
use fxdeleg_core::entities::ExternalDataSource;
use fxdeleg_core::functions::TexlFunction;
use fxdeleg_core::hash::{Fingerprint, Hash256};
use fxdeleg_core::syntax::{BinaryOp, Node, NodeKind, UnaryOp};
use fxdeleg_core::types::DType;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DelegationTelemetryInfo {
    info: String,
    data_source_name: Option<String>,
}

impl DelegationTelemetryInfo {
    fn new(info: impl Into<String>, data_source_name: Option<String>) -> Self {
        Self {
            info: info.into(),
            data_source_name,
        }
    }

    /// Label of the offending construct; `""` when nothing more is known.
    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn data_source_name(&self) -> Option<&str> {
        self.data_source_name.as_deref()
    }

    /// True for the no-info descriptor.
    pub fn is_empty(&self) -> bool {
        self.info.is_empty() && self.data_source_name.is_none()
    }

    /// Stable digest of both fields. Sinks use it to dedupe repeated reports.
    pub fn fingerprint(&self) -> Hash256 {
        self.digest_into(Fingerprint::new()).finish()
    }

    /// Append both fields to `fp`, for keys that combine the descriptor with
    /// other event data.
    pub fn digest_into(&self, fp: Fingerprint) -> Fingerprint {
        fp.field(&self.info).optional(self.data_source_name())
    }

    pub fn empty() -> Self {
        Self::new(String::new(), None)
    }

    pub fn binary_op_not_supported(op: BinaryOp) -> Self {
        Self::new(op.to_string(), None)
    }

    pub fn unary_op_not_supported(op: UnaryOp) -> Self {
        Self::new(op.to_string(), None)
    }

    /// The source name goes into `info`; this event is about the source
    /// itself, not about an operation that ran against it.
    pub fn data_source_not_delegatable(data_source: &dyn ExternalDataSource) -> Self {
        Self::new(data_source.name(), None)
    }

    /// `None` is the unknown-function case and yields the no-info descriptor.
    pub fn undelegatable_function(function: Option<&dyn TexlFunction>) -> Self {
        match function {
            Some(func) => Self::new(func.name(), None),
            None => Self::empty(),
        }
    }

    pub fn column_not_delegatable(name: &FirstNameInfo) -> Self {
        Self::new(name.name.as_str(), None)
    }

    /// # Panics
    ///
    /// If `column_name` is empty.
    pub fn column_name_not_delegatable(column_name: &str) -> Self {
        assert!(
            !column_name.is_empty(),
            "column_name_not_delegatable: column name must be non-empty"
        );
        Self::new(column_name, None)
    }

    /// Calls report the resolved callee when a binding is available (`""` if
    /// the callee did not resolve). Every other node kind, and calls without
    /// a binding, report the node's formula text.
    pub fn impure_node(node: &Node, binding: Option<&dyn Binding>) -> Self {
        match node.kind() {
            NodeKind::Call => match (node.as_call(), binding) {
                (Some(call), Some(binding)) => {
                    let name = binding
                        .call_info(call.id)
                        .and_then(|info| info.function.as_ref())
                        .map(|func| func.name().to_string())
                        .unwrap_or_default();
                    Self::new(name, None)
                }
                _ => Self::new(node.to_string(), None),
            },
            NodeKind::Blank
            | NodeKind::BoolLit
            | NodeKind::NumLit
            | NodeKind::StrLit
            | NodeKind::StrInterp
            | NodeKind::FirstName
            | NodeKind::DottedName
            | NodeKind::Parent
            | NodeKind::SelfRef
            | NodeKind::BinaryOp
            | NodeKind::UnaryOp
            | NodeKind::List
            | NodeKind::Record
            | NodeKind::Table
            | NodeKind::As
            | NodeKind::Error => Self::new(node.to_string(), None),
        }
    }

    pub fn delegation_successful(data_source: Option<&dyn ExternalDataSource>) -> Self {
        Self::new(String::new(), data_source_name(data_source))
    }

    pub fn unsupported_sort_arg(
        arg: &Node,
        data_source: Option<&dyn ExternalDataSource>,
    ) -> Self {
        Self::new(arg.kind().tag(), data_source_name(data_source))
    }

    pub fn invalid_arg_type(
        arg_type: &DType,
        data_source: Option<&dyn ExternalDataSource>,
    ) -> Self {
        Self::new(arg_type.kind.tag(), data_source_name(data_source))
    }
}

fn data_source_name(data_source: Option<&dyn ExternalDataSource>) -> Option<String> {
    data_source.map(|ds| ds.name().to_string())
}

impl Default for DelegationTelemetryInfo {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for DelegationTelemetryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data_source_name {
            Some(ds) => write!(f, "{}@{}", self.info, ds),
            None => f.write_str(&self.info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxdeleg_core::binding::{BindingTable, NameKind};
    use fxdeleg_core::entities::TabularDataSource;
    use fxdeleg_core::functions::BuiltinFunction;
    use fxdeleg_core::id::NodeId;
    use fxdeleg_core::syntax::Expr;
    use fxdeleg_core::types::DKind;

    fn call(id: u32, head: &str) -> Node {
        Node::new(
            NodeId::new(id),
            Expr::Call {
                head: head.into(),
                args: vec![],
            },
        )
    }

    #[test]
    fn empty_has_no_info_and_no_source() {
        let d = DelegationTelemetryInfo::empty();
        assert_eq!(d.info(), "");
        assert_eq!(d.data_source_name(), None);
        assert!(d.is_empty());
        assert_eq!(d, DelegationTelemetryInfo::default());
    }

    #[test]
    fn operators_use_their_names() {
        let b = DelegationTelemetryInfo::binary_op_not_supported(BinaryOp::ExactIn);
        assert_eq!(b.info(), "ExactIn");
        let u = DelegationTelemetryInfo::unary_op_not_supported(UnaryOp::Not);
        assert_eq!(u.info(), "Not");
        assert_eq!(u.data_source_name(), None);
    }

    #[test]
    fn data_source_name_lands_in_info() {
        let ds = TabularDataSource::new("Accounts");
        let d = DelegationTelemetryInfo::data_source_not_delegatable(&ds);
        assert_eq!(d.info(), "Accounts");
        assert_eq!(d.data_source_name(), None);
    }

    #[test]
    fn unknown_function_is_empty() {
        assert_eq!(
            DelegationTelemetryInfo::undelegatable_function(None),
            DelegationTelemetryInfo::empty()
        );
        let f = BuiltinFunction::new("LookUp");
        assert_eq!(
            DelegationTelemetryInfo::undelegatable_function(Some(&f)).info(),
            "LookUp"
        );
    }

    #[test]
    fn column_by_reference_and_literal() {
        let name = FirstNameInfo::new(NodeId::new(4), "Price", NameKind::LambdaField);
        assert_eq!(DelegationTelemetryInfo::column_not_delegatable(&name).info(), "Price");
        assert_eq!(
            DelegationTelemetryInfo::column_name_not_delegatable("Owner").info(),
            "Owner"
        );
    }

    #[test]
    #[should_panic(expected = "column name must be non-empty")]
    fn empty_column_name_is_a_contract_failure() {
        let _ = DelegationTelemetryInfo::column_name_not_delegatable("");
    }

    #[test]
    fn impure_call_reports_resolved_callee() {
        let node = call(1, "Filter");
        let mut binding = BindingTable::new();
        binding.bind_call(node.id, Some(BuiltinFunction::new("Filter").into_ref()));
        let d = DelegationTelemetryInfo::impure_node(&node, Some(&binding));
        assert_eq!(d.info(), "Filter");
        assert_eq!(d.data_source_name(), None);
    }

    #[test]
    fn impure_call_without_resolution_is_empty() {
        let node = call(1, "Rand");
        let mut binding = BindingTable::new();
        binding.bind_call(node.id, None);
        assert_eq!(DelegationTelemetryInfo::impure_node(&node, Some(&binding)).info(), "");

        // No entry for the node at all behaves the same.
        let unrelated = BindingTable::new();
        assert_eq!(DelegationTelemetryInfo::impure_node(&node, Some(&unrelated)).info(), "");
    }

    #[test]
    fn impure_call_without_binding_renders_text() {
        let node = call(1, "Now");
        assert_eq!(DelegationTelemetryInfo::impure_node(&node, None).info(), "Now()");
    }

    #[test]
    fn success_carries_only_the_source() {
        let ds = TabularDataSource::new("Accounts");
        let d = DelegationTelemetryInfo::delegation_successful(Some(&ds));
        assert_eq!(d.info(), "");
        assert_eq!(d.data_source_name(), Some("Accounts"));
        assert!(!d.is_empty());
        assert_eq!(d.to_string(), "@Accounts");
        assert_eq!(DelegationTelemetryInfo::delegation_successful(None).data_source_name(), None);
    }

    #[test]
    fn sort_arg_and_arg_type_use_kind_tags() {
        let ds = TabularDataSource::new("Orders");
        let node = call(2, "Rand");
        let s = DelegationTelemetryInfo::unsupported_sort_arg(&node, Some(&ds));
        assert_eq!(s.info(), "Call");
        assert_eq!(s.data_source_name(), Some("Orders"));

        let t = DelegationTelemetryInfo::invalid_arg_type(&DType::scalar(DKind::Guid), None);
        assert_eq!(t.info(), "Guid");
        assert_eq!(t.data_source_name(), None);
    }

    #[test]
    fn fingerprint_separates_info_from_source() {
        let ds = TabularDataSource::new("b");
        let a = DelegationTelemetryInfo::column_name_not_delegatable("ab");
        let b = DelegationTelemetryInfo::unsupported_sort_arg(&call(0, "x"), Some(&ds));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            a.fingerprint(),
            DelegationTelemetryInfo::column_name_not_delegatable("ab").fingerprint()
        );
    }

    #[test]
    fn serializes_both_fields() {
        let d = DelegationTelemetryInfo::delegation_successful(None);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"info":"","data_source_name":null}"#);
    }
}
