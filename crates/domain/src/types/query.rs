//! Query descriptor wire types.
//!
//! A [`QueryDescriptor`] is the backend-agnostic representation of one query,
//! serialized to JSON and POSTed to the generic query endpoint. It is built
//! through the fluent builder in `fluxbase-client`; nothing here performs
//! I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::FluxbaseError;

/// A result row: column name to JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Statement kind carried by a descriptor.
///
/// The builder starts out implicitly `Select`; an explicit write kind is a
/// one-way transition per builder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator for condition nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "ilike")]
    Ilike,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "is null")]
    IsNull,
    #[serde(rename = "is not null")]
    IsNotNull,
}

impl Operator {
    /// Wire spelling of the operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "like",
            Self::Ilike => "ilike",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Between => "between",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
        }
    }

    /// Whether the operator expects an operand value.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FluxbaseError;

    /// Parse a wire spelling. Used by callers that receive operators
    /// dynamically; the builder API itself takes the enum directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "=" | "eq" => Ok(Self::Eq),
            "!=" | "<>" | "ne" => Ok(Self::Ne),
            ">" | "gt" => Ok(Self::Gt),
            ">=" | "gte" => Ok(Self::Gte),
            "<" | "lt" => Ok(Self::Lt),
            "<=" | "lte" => Ok(Self::Lte),
            "like" => Ok(Self::Like),
            "ilike" => Ok(Self::Ilike),
            "in" => Ok(Self::In),
            "not in" => Ok(Self::NotIn),
            "between" => Ok(Self::Between),
            "is null" => Ok(Self::IsNull),
            "is not null" => Ok(Self::IsNotNull),
            other => Err(FluxbaseError::InvalidInput(format!(
                "unsupported query operator: {other}"
            ))),
        }
    }
}

/// AND/OR combinator joining a condition node to the one before it.
///
/// The first node's combinator is carried on the wire but ignored by
/// convention (nothing precedes it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One node of a WHERE/HAVING condition tree.
///
/// Serialized untagged: raw nodes carry a `raw` key, grouped sub-trees a
/// `group` key, and plain comparisons a `column` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    /// Opaque pass-through condition; the backend interprets the fragment.
    Raw {
        raw: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<Value>,
        boolean: Combinator,
    },
    /// Nested sub-tree, preserving its internal AND/OR structure.
    Group {
        group: Vec<ConditionNode>,
        boolean: Combinator,
    },
    /// A single column comparison.
    Expr {
        column: String,
        operator: Operator,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        boolean: Combinator,
    },
}

impl ConditionNode {
    /// The combinator joining this node to the previous one.
    pub fn boolean(&self) -> Combinator {
        match self {
            Self::Raw { boolean, .. }
            | Self::Group { boolean, .. }
            | Self::Expr { boolean, .. } => *boolean,
        }
    }
}

/// Join kind, in application order relative to other joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
        }
    }
}

/// A single join clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    pub table: String,
    pub first_column: String,
    pub operator: Operator,
    pub second_column: String,
    pub kind: JoinKind,
}

/// Sort direction for an ORDER BY entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY entry; multiple entries form a multi-column sort in call
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

/// Insert payload: a single row mapping or a batch of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertData {
    One(Row),
    Many(Vec<Row>),
}

/// The wire-level representation of one query.
///
/// Fields irrelevant to the final `type` are never populated by the builder,
/// and empty collections are omitted from the JSON body entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub table: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub distinct: bool,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clause: Vec<ConditionNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub having: Vec<ConditionNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub returning: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_data: Option<InsertData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_data: Option<Row>,
}

impl QueryDescriptor {
    /// An empty select descriptor for the given table.
    pub fn select(table: impl Into<String>) -> Self {
        Self {
            query_type: QueryType::Select,
            table: table.into(),
            columns: Vec::new(),
            distinct: false,
            where_clause: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            returning: Vec::new(),
            insert_data: None,
            update_data: None,
        }
    }
}

/// Response envelope returned by the generic query endpoint.
///
/// Unknown envelope fields are tolerated; missing fields default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub row_count: u64,
}

fn is_false(value: &bool) -> bool {
    !*value
}
