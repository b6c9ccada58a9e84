//! Resolved formula types. Pure data.
//!
//! Telemetry only ever reads `DType::kind`; the column map exists so binders
//! can describe record/table arguments faithfully.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DKind {
    Error,
    Blank,
    Boolean,
    Number,
    Decimal,
    String,
    Hyperlink,
    Image,
    Media,
    Color,
    Currency,
    Date,
    Time,
    DateTime,
    Guid,
    Record,
    Table,
    OptionSetValue,
    Polymorphic,
    UntypedObject,
    Void,
    // TODO: Enum/ViewValue kinds once the binder models views.
}

impl DKind {
    pub fn tag(self) -> &'static str {
        use DKind::*;
        match self {
            Error => "Error",
            Blank => "Blank",
            Boolean => "Boolean",
            Number => "Number",
            Decimal => "Decimal",
            String => "String",
            Hyperlink => "Hyperlink",
            Image => "Image",
            Media => "Media",
            Color => "Color",
            Currency => "Currency",
            Date => "Date",
            Time => "Time",
            DateTime => "DateTime",
            Guid => "Guid",
            Record => "Record",
            Table => "Table",
            OptionSetValue => "OptionSetValue",
            Polymorphic => "Polymorphic",
            UntypedObject => "UntypedObject",
            Void => "Void",
        }
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, DKind::Record | DKind::Table)
    }
}

impl fmt::Display for DKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DType {
    pub kind: DKind,
    /// Column types for `Record`/`Table`; empty for scalars.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, DType>,
}

impl DType {
    pub fn scalar(kind: DKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
        }
    }

    pub fn record(fields: impl IntoIterator<Item = (String, DType)>) -> Self {
        Self {
            kind: DKind::Record,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn table(fields: impl IntoIterator<Item = (String, DType)>) -> Self {
        Self {
            kind: DKind::Table,
            fields: fields.into_iter().collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&DType> {
        self.fields.get(name)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.kind.is_aggregate() {
            return f.write_str(self.kind.tag());
        }
        let (open, close) = if self.kind == DKind::Table {
            ("*[", "]")
        } else {
            ("![", "]")
        };
        f.write_str(open)?;
        for (i, (name, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", name, ty)?;
        }
        f.write_str(close)
    }
}
