//! Formula syntax: operators, node kinds, and the expression tree.
//!
//! Only the surface telemetry needs is modelled here. A node knows its kind
//! and how to render itself back to formula text; resolution lives in
//! `binding`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error as CoreError;
use crate::id::NodeId;

/// Infix operators of the formula language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Concat,
    Add,
    Mul,
    Div,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    ExactIn,
    Error,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 16] = [
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::Concat,
        BinaryOp::Add,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Power,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::Less,
        BinaryOp::LessEqual,
        BinaryOp::Greater,
        BinaryOp::GreaterEqual,
        BinaryOp::In,
        BinaryOp::ExactIn,
        BinaryOp::Error,
    ];

    /// Stable operator name, used as the telemetry label.
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Or => "Or",
            BinaryOp::And => "And",
            BinaryOp::Concat => "Concat",
            BinaryOp::Add => "Add",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Power => "Power",
            BinaryOp::Equal => "Equal",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::Less => "Less",
            BinaryOp::LessEqual => "LessEqual",
            BinaryOp::Greater => "Greater",
            BinaryOp::GreaterEqual => "GreaterEqual",
            BinaryOp::In => "In",
            BinaryOp::ExactIn => "ExactIn",
            BinaryOp::Error => "Error",
        }
    }

    /// Punctuator used when rendering formula text.
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Concat => "&",
            BinaryOp::Add => "+",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Power => "^",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::ExactIn => "exactin",
            BinaryOp::Error => "<error>",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either the operator name (`Equal`) or its punctuator (`=`).
impl FromStr for BinaryOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BinaryOp::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s) || op.token() == s)
            .ok_or_else(|| CoreError::Syntax(format!("unknown binary operator '{}'", s)))
    }
}

/// Prefix and postfix operators of the formula language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Minus,
    Percent,
    Error,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 4] = [UnaryOp::Not, UnaryOp::Minus, UnaryOp::Percent, UnaryOp::Error];

    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Not => "Not",
            UnaryOp::Minus => "Minus",
            UnaryOp::Percent => "Percent",
            UnaryOp::Error => "Error",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Minus => "-",
            UnaryOp::Percent => "%",
            UnaryOp::Error => "<error>",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::Percent)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnaryOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        UnaryOp::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s) || op.token() == s)
            .ok_or_else(|| CoreError::Syntax(format!("unknown unary operator '{}'", s)))
    }
}

/// Identifier as written in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Plain identifiers render bare; anything else is single-quoted.
    fn needs_quotes(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return true,
        }
        !chars.all(|c| c.is_alphanumeric() || c == '_')
    }
}

impl From<&str> for Ident {
    fn from(s: &str) -> Self {
        Ident::new(s)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.needs_quotes() {
            write!(f, "'{}'", self.0.replace('\'', "''"))
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Syntactic kind of a node. Closed: every `Expr` variant maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Blank,
    BoolLit,
    NumLit,
    StrLit,
    StrInterp,
    FirstName,
    DottedName,
    Parent,
    #[serde(rename = "Self")]
    SelfRef,
    Call,
    BinaryOp,
    UnaryOp,
    List,
    Record,
    Table,
    As,
    Error,
}

impl NodeKind {
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Blank => "Blank",
            NodeKind::BoolLit => "BoolLit",
            NodeKind::NumLit => "NumLit",
            NodeKind::StrLit => "StrLit",
            NodeKind::StrInterp => "StrInterp",
            NodeKind::FirstName => "FirstName",
            NodeKind::DottedName => "DottedName",
            NodeKind::Parent => "Parent",
            NodeKind::SelfRef => "Self",
            NodeKind::Call => "Call",
            NodeKind::BinaryOp => "BinaryOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::List => "List",
            NodeKind::Record => "Record",
            NodeKind::Table => "Table",
            NodeKind::As => "As",
            NodeKind::Error => "Error",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    pub name: Ident,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Blank,
    BoolLit(bool),
    NumLit(f64),
    StrLit(String),
    StrInterp(Vec<Node>),
    FirstName(Ident),
    DottedName {
        left: Box<Node>,
        right: Ident,
    },
    Parent,
    #[serde(rename = "self")]
    SelfRef,
    Call {
        head: Ident,
        #[serde(default)]
        args: Vec<Node>,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOp,
        child: Box<Node>,
    },
    List(Vec<Node>),
    Record(Vec<RecordField>),
    Table(Vec<Node>),
    As {
        left: Box<Node>,
        name: Ident,
    },
    Error,
}

/// One node of a parsed formula.
///
/// `id` is what bindings key on; two structurally equal nodes with different
/// ids are different call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    pub expr: Expr,
}

/// Borrowed view of a call node.
#[derive(Debug, Clone, Copy)]
pub struct CallNode<'a> {
    pub id: NodeId,
    pub head: &'a Ident,
    pub args: &'a [Node],
}

impl Node {
    pub fn new(id: NodeId, expr: Expr) -> Self {
        Self { id, expr }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.expr {
            Expr::Blank => NodeKind::Blank,
            Expr::BoolLit(_) => NodeKind::BoolLit,
            Expr::NumLit(_) => NodeKind::NumLit,
            Expr::StrLit(_) => NodeKind::StrLit,
            Expr::StrInterp(_) => NodeKind::StrInterp,
            Expr::FirstName(_) => NodeKind::FirstName,
            Expr::DottedName { .. } => NodeKind::DottedName,
            Expr::Parent => NodeKind::Parent,
            Expr::SelfRef => NodeKind::SelfRef,
            Expr::Call { .. } => NodeKind::Call,
            Expr::BinaryOp { .. } => NodeKind::BinaryOp,
            Expr::UnaryOp { .. } => NodeKind::UnaryOp,
            Expr::List(_) => NodeKind::List,
            Expr::Record(_) => NodeKind::Record,
            Expr::Table(_) => NodeKind::Table,
            Expr::As { .. } => NodeKind::As,
            Expr::Error => NodeKind::Error,
        }
    }

    pub fn as_call(&self) -> Option<CallNode<'_>> {
        match &self.expr {
            Expr::Call { head, args } => Some(CallNode {
                id: self.id,
                head,
                args,
            }),
            _ => None,
        }
    }

    /// Operand of an infix operator or `As`.
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_wrapped(f, &[NodeKind::BinaryOp, NodeKind::As])
    }

    /// Operand of a unary operator or the record side of a dotted name.
    /// These bind tighter than anything compound, nested unaries included.
    fn fmt_tight_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_wrapped(f, &[NodeKind::BinaryOp, NodeKind::UnaryOp, NodeKind::As])
    }

    fn fmt_wrapped(&self, f: &mut fmt::Formatter<'_>, wrap: &[NodeKind]) -> fmt::Result {
        if wrap.contains(&self.kind()) {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

fn fmt_joined(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", n)?;
    }
    Ok(())
}

/// Renders the node back to formula text.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expr {
            Expr::Blank => f.write_str("Blank()"),
            Expr::BoolLit(b) => write!(f, "{}", b),
            Expr::NumLit(n) => write!(f, "{}", n),
            Expr::StrLit(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Expr::StrInterp(parts) => {
                f.write_str("$\"")?;
                for part in parts {
                    match &part.expr {
                        Expr::StrLit(s) => f.write_str(
                            &s.replace('"', "\"\"").replace('{', "{{").replace('}', "}}"),
                        )?,
                        _ => write!(f, "{{{}}}", part)?,
                    }
                }
                f.write_str("\"")
            }
            Expr::FirstName(name) => write!(f, "{}", name),
            Expr::DottedName { left, right } => {
                left.fmt_tight_operand(f)?;
                write!(f, ".{}", right)
            }
            Expr::Parent => f.write_str("Parent"),
            Expr::SelfRef => f.write_str("Self"),
            Expr::Call { head, args } => {
                write!(f, "{}(", head)?;
                fmt_joined(f, args)?;
                f.write_str(")")
            }
            Expr::BinaryOp { op, left, right } => {
                left.fmt_operand(f)?;
                write!(f, " {} ", op.token())?;
                right.fmt_operand(f)
            }
            Expr::UnaryOp { op, child } => {
                if op.is_postfix() {
                    child.fmt_tight_operand(f)?;
                    f.write_str(op.token())
                } else {
                    f.write_str(op.token())?;
                    child.fmt_tight_operand(f)
                }
            }
            Expr::List(items) => {
                f.write_str("(")?;
                fmt_joined(f, items)?;
                f.write_str(")")
            }
            Expr::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            Expr::Table(rows) => {
                f.write_str("[")?;
                fmt_joined(f, rows)?;
                f.write_str("]")
            }
            Expr::As { left, name } => {
                left.fmt_operand(f)?;
                write!(f, " As {}", name)
            }
            Expr::Error => f.write_str("<error>"),
        }
    }
}
