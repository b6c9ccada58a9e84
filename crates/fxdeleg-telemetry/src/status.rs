//! Delegation outcomes a descriptor is filed under.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    DataSourceNotDelegatable,
    BinaryOpNotSupported,
    UnaryOpNotSupported,
    UndelegatableFunction,
    NoDelegationSupportByColumn,
    ImpureNode,
    UnsupportedSortArg,
    InvalidArgType,
    DelegationSuccessful,
}

impl DelegationStatus {
    pub const ALL: [DelegationStatus; 9] = [
        DelegationStatus::DataSourceNotDelegatable,
        DelegationStatus::BinaryOpNotSupported,
        DelegationStatus::UnaryOpNotSupported,
        DelegationStatus::UndelegatableFunction,
        DelegationStatus::NoDelegationSupportByColumn,
        DelegationStatus::ImpureNode,
        DelegationStatus::UnsupportedSortArg,
        DelegationStatus::InvalidArgType,
        DelegationStatus::DelegationSuccessful,
    ];

    pub fn is_success(self) -> bool {
        self == DelegationStatus::DelegationSuccessful
    }

    /// Stable snake_case tag, matching the serde form.
    pub fn tag(self) -> &'static str {
        use DelegationStatus::*;
        match self {
            DataSourceNotDelegatable => "data_source_not_delegatable",
            BinaryOpNotSupported => "binary_op_not_supported",
            UnaryOpNotSupported => "unary_op_not_supported",
            UndelegatableFunction => "undelegatable_function",
            NoDelegationSupportByColumn => "no_delegation_support_by_column",
            ImpureNode => "impure_node",
            UnsupportedSortArg => "unsupported_sort_arg",
            InvalidArgType => "invalid_arg_type",
            DelegationSuccessful => "delegation_successful",
        }
    }
}

impl fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}
