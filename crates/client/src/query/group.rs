//! Condition accumulation primitive shared by WHERE, HAVING and grouped
//! sub-clauses.

use fluxbase_domain::{Combinator, ConditionNode, Operator};
use serde_json::Value;

/// An ordered list of condition nodes under construction.
///
/// Conditions are strictly additive and keep call order; each node carries
/// the combinator that joins it to the node before it (the first node's
/// combinator is inert by convention). A fresh group is obtained from
/// [`ConditionGroup::new`] or handed to the closures of
/// [`QueryBuilder::or_group`](crate::query::QueryBuilder::or_group).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionGroup {
    nodes: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_nodes(self) -> Vec<ConditionNode> {
        self.nodes
    }

    pub(crate) fn nodes(&self) -> &[ConditionNode] {
        &self.nodes
    }

    pub(crate) fn push_node(&mut self, node: ConditionNode) {
        self.nodes.push(node);
    }

    fn push(mut self, column: &str, operator: Operator, value: Option<Value>, boolean: Combinator) -> Self {
        self.nodes.push(ConditionNode::Expr {
            column: column.to_string(),
            operator,
            value: if operator.takes_value() { value } else { None },
            boolean,
        });
        self
    }

    // ==================== general forms ====================

    /// Add a condition joined with AND.
    pub fn filter(self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(column, operator, Some(value.into()), Combinator::And)
    }

    /// Add a condition joined with OR.
    pub fn or_filter(self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(column, operator, Some(value.into()), Combinator::Or)
    }

    // ==================== AND shorthands ====================

    /// column = value
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Eq, value)
    }

    /// column != value
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Ne, value)
    }

    /// column > value
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Gt, value)
    }

    /// column >= value
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Gte, value)
    }

    /// column < value
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Lt, value)
    }

    /// column <= value
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, Operator::Lte, value)
    }

    /// column LIKE pattern
    pub fn like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(column, Operator::Like, pattern.into())
    }

    /// column ILIKE pattern (case-insensitive)
    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(column, Operator::Ilike, pattern.into())
    }

    /// column IN (values...)
    pub fn in_list<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, Operator::In, list)
    }

    /// column NOT IN (values...)
    pub fn not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(column, Operator::NotIn, list)
    }

    /// column BETWEEN from AND to
    pub fn between(self, column: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.filter(column, Operator::Between, vec![from.into(), to.into()])
    }

    /// column IS NULL
    pub fn is_null(self, column: &str) -> Self {
        self.push(column, Operator::IsNull, None, Combinator::And)
    }

    /// column IS NOT NULL
    pub fn is_not_null(self, column: &str) -> Self {
        self.push(column, Operator::IsNotNull, None, Combinator::And)
    }

    // ==================== OR shorthands ====================

    /// OR column = value
    pub fn or_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Eq, value)
    }

    /// OR column != value
    pub fn or_ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Ne, value)
    }

    /// OR column > value
    pub fn or_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Gt, value)
    }

    /// OR column >= value
    pub fn or_gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Gte, value)
    }

    /// OR column < value
    pub fn or_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Lt, value)
    }

    /// OR column <= value
    pub fn or_lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Lte, value)
    }

    /// OR column LIKE pattern
    pub fn or_like(self, column: &str, pattern: impl Into<String>) -> Self {
        self.or_filter(column, Operator::Like, pattern.into())
    }

    /// OR column ILIKE pattern
    pub fn or_ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.or_filter(column, Operator::Ilike, pattern.into())
    }

    /// OR column IN (values...)
    pub fn or_in_list<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.or_filter(column, Operator::In, list)
    }

    /// OR column NOT IN (values...)
    pub fn or_not_in<T: Into<Value>>(self, column: &str, values: Vec<T>) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.or_filter(column, Operator::NotIn, list)
    }

    /// OR column BETWEEN from AND to
    pub fn or_between(self, column: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.or_filter(column, Operator::Between, vec![from.into(), to.into()])
    }

    /// OR column IS NULL
    pub fn or_is_null(self, column: &str) -> Self {
        self.push(column, Operator::IsNull, None, Combinator::Or)
    }

    /// OR column IS NOT NULL
    pub fn or_is_not_null(self, column: &str) -> Self {
        self.push(column, Operator::IsNotNull, None, Combinator::Or)
    }

    // ==================== raw & nested ====================

    /// Add an opaque pass-through condition; the backend interprets the
    /// fragment. Ordering relative to structured conditions follows call
    /// order.
    pub fn raw(mut self, fragment: impl Into<String>, params: Vec<Value>) -> Self {
        self.nodes.push(ConditionNode::Raw {
            raw: fragment.into(),
            params,
            boolean: Combinator::And,
        });
        self
    }

    /// OR variant of [`ConditionGroup::raw`].
    pub fn or_raw(mut self, fragment: impl Into<String>, params: Vec<Value>) -> Self {
        self.nodes.push(ConditionNode::Raw {
            raw: fragment.into(),
            params,
            boolean: Combinator::Or,
        });
        self
    }

    /// Nest a sub-group joined with AND. Empty sub-groups are dropped.
    pub fn group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(ConditionGroup) -> ConditionGroup,
    {
        let sub = build(ConditionGroup::new());
        if !sub.is_empty() {
            self.nodes.push(ConditionNode::Group { group: sub.into_nodes(), boolean: Combinator::And });
        }
        self
    }

    /// Nest a sub-group joined with OR. Empty sub-groups are dropped.
    pub fn or_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(ConditionGroup) -> ConditionGroup,
    {
        let sub = build(ConditionGroup::new());
        if !sub.is_empty() {
            self.nodes.push(ConditionNode::Group { group: sub.into_nodes(), boolean: Combinator::Or });
        }
        self
    }
}
