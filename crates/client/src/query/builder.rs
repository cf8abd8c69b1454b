//! Fluent query builder.
//!
//! A builder is created per logical query via
//! [`Client::table`](crate::client::Client::table), mutated through chained
//! calls, and consumed exactly once by a terminal operation (`execute`,
//! `get`, `first`, `value`, `exists`, `count`). Clause calls are strictly
//! additive; clone the builder before a terminal call to branch.

use std::fmt;
use std::sync::Arc;

use fluxbase_domain::{
    Combinator, ConditionNode, FluxbaseError, InsertData, Join, JoinKind, Operator, OrderBy,
    OrderDirection, QueryDescriptor, QueryResponse, QueryType, Result, Row,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::http::HttpClient;

use super::group::ConditionGroup;
use super::sql::render_sql;

/// Chainable builder for one query against the generic query endpoint.
#[derive(Clone)]
pub struct QueryBuilder {
    http: Arc<HttpClient>,
    endpoint: String,
    table: String,
    /// Set only by `insert`/`update`/`delete`; a builder without an explicit
    /// type serializes as a select. The transition is one-way per instance.
    explicit_type: Option<QueryType>,
    columns: Vec<String>,
    distinct: bool,
    where_group: ConditionGroup,
    joins: Vec<Join>,
    group_by: Vec<String>,
    having_group: ConditionGroup,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    returning: Vec<String>,
    insert_data: Option<InsertData>,
    update_data: Option<Row>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("descriptor", &self.to_query())
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    pub(crate) fn new(http: Arc<HttpClient>, endpoint: String, table: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            table: table.into(),
            explicit_type: None,
            columns: Vec::new(),
            distinct: false,
            where_group: ConditionGroup::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having_group: ConditionGroup::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            returning: Vec::new(),
            insert_data: None,
            update_data: None,
        }
    }

    // ==================== projection ====================

    /// Append columns to the projection. An empty projection means all
    /// columns.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Request distinct rows.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    // ==================== conditions ====================

    /// Add a WHERE condition joined with AND.
    pub fn filter(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.filter(column, operator, value);
        self
    }

    /// Add a WHERE condition joined with OR.
    pub fn or_filter(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_filter(column, operator, value);
        self
    }

    /// WHERE column = value
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.eq(column, value);
        self
    }

    /// WHERE column != value
    pub fn ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.ne(column, value);
        self
    }

    /// WHERE column > value
    pub fn gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.gt(column, value);
        self
    }

    /// WHERE column >= value
    pub fn gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.gte(column, value);
        self
    }

    /// WHERE column < value
    pub fn lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.lt(column, value);
        self
    }

    /// WHERE column <= value
    pub fn lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.lte(column, value);
        self
    }

    /// WHERE column LIKE pattern
    pub fn like(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_group = self.where_group.like(column, pattern);
        self
    }

    /// WHERE column ILIKE pattern
    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_group = self.where_group.ilike(column, pattern);
        self
    }

    /// WHERE column IN (values...)
    pub fn in_list<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group = self.where_group.in_list(column, values);
        self
    }

    /// WHERE column NOT IN (values...)
    pub fn not_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group = self.where_group.not_in(column, values);
        self
    }

    /// WHERE column BETWEEN from AND to
    pub fn between(mut self, column: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.where_group = self.where_group.between(column, from, to);
        self
    }

    /// WHERE column IS NULL
    pub fn is_null(mut self, column: &str) -> Self {
        self.where_group = self.where_group.is_null(column);
        self
    }

    /// WHERE column IS NOT NULL
    pub fn is_not_null(mut self, column: &str) -> Self {
        self.where_group = self.where_group.is_not_null(column);
        self
    }

    /// OR column = value
    pub fn or_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_eq(column, value);
        self
    }

    /// OR column != value
    pub fn or_ne(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_ne(column, value);
        self
    }

    /// OR column > value
    pub fn or_gt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_gt(column, value);
        self
    }

    /// OR column >= value
    pub fn or_gte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_gte(column, value);
        self
    }

    /// OR column < value
    pub fn or_lt(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_lt(column, value);
        self
    }

    /// OR column <= value
    pub fn or_lte(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_lte(column, value);
        self
    }

    /// OR column LIKE pattern
    pub fn or_like(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_group = self.where_group.or_like(column, pattern);
        self
    }

    /// OR column ILIKE pattern
    pub fn or_ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.where_group = self.where_group.or_ilike(column, pattern);
        self
    }

    /// OR column IN (values...)
    pub fn or_in_list<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group = self.where_group.or_in_list(column, values);
        self
    }

    /// OR column NOT IN (values...)
    pub fn or_not_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.where_group = self.where_group.or_not_in(column, values);
        self
    }

    /// OR column BETWEEN from AND to
    pub fn or_between(mut self, column: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        self.where_group = self.where_group.or_between(column, from, to);
        self
    }

    /// OR column IS NULL
    pub fn or_is_null(mut self, column: &str) -> Self {
        self.where_group = self.where_group.or_is_null(column);
        self
    }

    /// OR column IS NOT NULL
    pub fn or_is_not_null(mut self, column: &str) -> Self {
        self.where_group = self.where_group.or_is_not_null(column);
        self
    }

    /// Add an opaque pass-through WHERE fragment (AND).
    pub fn filter_raw(mut self, fragment: impl Into<String>, params: Vec<Value>) -> Self {
        self.where_group = self.where_group.raw(fragment, params);
        self
    }

    /// Add an opaque pass-through WHERE fragment (OR).
    pub fn or_filter_raw(mut self, fragment: impl Into<String>, params: Vec<Value>) -> Self {
        self.where_group = self.where_group.or_raw(fragment, params);
        self
    }

    /// Append one grouped OR node built from the given sub-builders.
    ///
    /// Each [`ConditionGroup`] keeps its internal AND/OR structure; with
    /// more than one group the result is a single OR-tagged node whose
    /// children are the independent sub-trees, never a flattened list.
    pub fn or<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = ConditionGroup>,
    {
        let mut subs: Vec<ConditionGroup> = groups.into_iter().filter(|g| !g.is_empty()).collect();
        match subs.len() {
            0 => {}
            1 => {
                let sub = subs.remove(0);
                self.where_group.push_node(ConditionNode::Group {
                    group: sub.into_nodes(),
                    boolean: Combinator::Or,
                });
            }
            _ => {
                let children = subs
                    .into_iter()
                    .enumerate()
                    .map(|(i, sub)| ConditionNode::Group {
                        group: sub.into_nodes(),
                        boolean: if i == 0 { Combinator::And } else { Combinator::Or },
                    })
                    .collect();
                self.where_group.push_node(ConditionNode::Group {
                    group: children,
                    boolean: Combinator::Or,
                });
            }
        }
        self
    }

    /// Closure form of [`QueryBuilder::or`] for a single grouped OR node.
    pub fn or_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(ConditionGroup) -> ConditionGroup,
    {
        self.where_group = self.where_group.or_group(build);
        self
    }

    /// Append a grouped AND node built from a sub-builder closure.
    pub fn and_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(ConditionGroup) -> ConditionGroup,
    {
        self.where_group = self.where_group.group(build);
        self
    }

    // ==================== joins, grouping, ordering ====================

    /// Append an INNER JOIN. Joins apply in call order.
    pub fn join(self, table: &str, first: &str, operator: Operator, second: &str) -> Self {
        self.push_join(table, first, operator, second, JoinKind::Inner)
    }

    /// Append a LEFT JOIN.
    pub fn left_join(self, table: &str, first: &str, operator: Operator, second: &str) -> Self {
        self.push_join(table, first, operator, second, JoinKind::Left)
    }

    /// Append a RIGHT JOIN.
    pub fn right_join(self, table: &str, first: &str, operator: Operator, second: &str) -> Self {
        self.push_join(table, first, operator, second, JoinKind::Right)
    }

    /// Append a FULL JOIN.
    pub fn full_join(self, table: &str, first: &str, operator: Operator, second: &str) -> Self {
        self.push_join(table, first, operator, second, JoinKind::Full)
    }

    fn push_join(
        mut self,
        table: &str,
        first: &str,
        operator: Operator,
        second: &str,
        kind: JoinKind,
    ) -> Self {
        self.joins.push(Join {
            table: table.to_string(),
            first_column: first.to_string(),
            operator,
            second_column: second.to_string(),
            kind,
        });
        self
    }

    /// Append GROUP BY columns.
    pub fn group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add a HAVING condition joined with AND.
    pub fn having(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.having_group = self.having_group.filter(column, operator, value);
        self
    }

    /// Add a HAVING condition joined with OR.
    pub fn or_having(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.having_group = self.having_group.or_filter(column, operator, value);
        self
    }

    /// Append an ORDER BY entry; repeated calls build a multi-column sort
    /// evaluated in call order.
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy { column: column.to_string(), direction });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set `limit = per_page` and `offset = (page - 1) * per_page`.
    ///
    /// `page` is 1-based; values below 1 are clamped to the first page.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let page = page.max(1);
        self.limit(per_page).offset((page - 1) * per_page)
    }

    /// Append RETURNING columns for write queries.
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    // ==================== write types ====================

    /// Turn the builder into an insert of a single row.
    ///
    /// # Errors
    /// Fails immediately if the payload does not serialize to a JSON object
    /// or if a different write type was already set on this instance.
    pub fn insert(mut self, data: impl Serialize) -> Result<Self> {
        self.set_write_type(QueryType::Insert)?;
        let row = to_row(data, "insert")?;
        match self.insert_data.take() {
            None => self.insert_data = Some(InsertData::One(row)),
            Some(InsertData::One(existing)) => {
                self.insert_data = Some(InsertData::Many(vec![existing, row]));
            }
            Some(InsertData::Many(mut rows)) => {
                rows.push(row);
                self.insert_data = Some(InsertData::Many(rows));
            }
        }
        Ok(self)
    }

    /// Turn the builder into a batch insert.
    ///
    /// # Errors
    /// Same contract as [`QueryBuilder::insert`].
    pub fn insert_many<T: Serialize>(mut self, rows: Vec<T>) -> Result<Self> {
        self.set_write_type(QueryType::Insert)?;
        let mut collected = match self.insert_data.take() {
            None => Vec::new(),
            Some(InsertData::One(existing)) => vec![existing],
            Some(InsertData::Many(existing)) => existing,
        };
        for row in rows {
            collected.push(to_row(row, "insert")?);
        }
        self.insert_data = Some(InsertData::Many(collected));
        Ok(self)
    }

    /// Turn the builder into an update. Accumulated WHERE conditions scope
    /// the update.
    ///
    /// # Errors
    /// Fails immediately if the payload does not serialize to a JSON object
    /// or if a different write type was already set on this instance.
    pub fn update(mut self, data: impl Serialize) -> Result<Self> {
        self.set_write_type(QueryType::Update)?;
        self.update_data = Some(to_row(data, "update")?);
        Ok(self)
    }

    /// Turn the builder into a delete. Accumulated WHERE conditions scope
    /// the delete.
    ///
    /// # Errors
    /// Fails immediately if a different write type was already set on this
    /// instance.
    pub fn delete(mut self) -> Result<Self> {
        self.set_write_type(QueryType::Delete)?;
        Ok(self)
    }

    /// One-way type transition: setting two different write types on the
    /// same instance is a usage error, not a silent overwrite.
    fn set_write_type(&mut self, query_type: QueryType) -> Result<()> {
        match self.explicit_type {
            None => {
                self.explicit_type = Some(query_type);
                Ok(())
            }
            Some(current) if current == query_type => Ok(()),
            Some(current) => Err(FluxbaseError::InvalidInput(format!(
                "query is already a {current}; cannot change it to a {query_type}"
            ))),
        }
    }

    // ==================== aggregates ====================

    /// Replace the projection with `sum(column)`.
    pub fn sum(self, column: &str) -> Self {
        self.aggregate("sum", column)
    }

    /// Replace the projection with `avg(column)`.
    pub fn avg(self, column: &str) -> Self {
        self.aggregate("avg", column)
    }

    /// Replace the projection with `min(column)`.
    pub fn min(self, column: &str) -> Self {
        self.aggregate("min", column)
    }

    /// Replace the projection with `max(column)`.
    pub fn max(self, column: &str) -> Self {
        self.aggregate("max", column)
    }

    fn aggregate(mut self, function: &str, column: &str) -> Self {
        self.columns = vec![format!("{function}({column}) as {function}")];
        self
    }

    // ==================== introspection ====================

    /// The descriptor as composed so far, without executing. Pure:
    /// repeated calls return structurally equal descriptors.
    ///
    /// Fields irrelevant to the final query type are left out entirely.
    pub fn to_query(&self) -> QueryDescriptor {
        let query_type = self.explicit_type.unwrap_or(QueryType::Select);
        let mut descriptor = QueryDescriptor::select(self.table.clone());
        descriptor.query_type = query_type;

        match query_type {
            QueryType::Select => {
                descriptor.columns = self.columns.clone();
                descriptor.distinct = self.distinct;
                descriptor.where_clause = self.where_group.nodes().to_vec();
                descriptor.joins = self.joins.clone();
                descriptor.group_by = self.group_by.clone();
                descriptor.having = self.having_group.nodes().to_vec();
                descriptor.order_by = self.order_by.clone();
                descriptor.limit = self.limit;
                descriptor.offset = self.offset;
            }
            QueryType::Insert => {
                descriptor.insert_data = self.insert_data.clone();
                descriptor.returning = self.returning.clone();
            }
            QueryType::Update => {
                descriptor.update_data = self.update_data.clone();
                descriptor.where_clause = self.where_group.nodes().to_vec();
                descriptor.returning = self.returning.clone();
            }
            QueryType::Delete => {
                descriptor.where_clause = self.where_group.nodes().to_vec();
                descriptor.returning = self.returning.clone();
            }
        }

        descriptor
    }

    /// Best-effort SQL-like rendering for debugging. Never sent to the
    /// server.
    pub fn to_sql(&self) -> String {
        render_sql(&self.to_query())
    }

    // ==================== terminal operations ====================

    /// Serialize the descriptor and issue the query, returning the raw
    /// response envelope.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn execute(self) -> Result<QueryResponse> {
        let descriptor = self.to_query();
        debug!(query_type = %descriptor.query_type, "executing query");

        let request = self.http.request(Method::POST, &self.endpoint).json(&descriptor);
        self.http.send_json(request).await
    }

    /// Execute and return all rows.
    pub async fn get(self) -> Result<Vec<Row>> {
        Ok(self.execute().await?.rows)
    }

    /// Execute and return the first row, or `None` when the result set is
    /// empty. Applies `limit 1` unless a limit was already set.
    pub async fn first(mut self) -> Result<Option<Row>> {
        if self.limit.is_none() {
            self.limit = Some(1);
        }
        Ok(self.execute().await?.rows.into_iter().next())
    }

    /// Execute and return the named column of the first row, or `None` when
    /// the result set is empty or the column is absent.
    pub async fn value(self, column: &str) -> Result<Option<Value>> {
        Ok(self.first().await?.and_then(|row| row.get(column).cloned()))
    }

    /// Execute with `limit 1` and report whether any row matched.
    pub async fn exists(mut self) -> Result<bool> {
        self.limit = Some(1);
        let response = self.execute().await?;
        Ok(!response.rows.is_empty() || response.row_count > 0)
    }

    /// Execute a `count(*)` aggregate and return the count, `0` when the
    /// result set is empty.
    pub async fn count(mut self) -> Result<u64> {
        self.columns = vec!["count(*) as count".to_string()];
        let response = self.execute().await?;
        Ok(response
            .rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

fn to_row(data: impl Serialize, what: &str) -> Result<Row> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(FluxbaseError::InvalidInput(format!(
            "{what} payload must serialize to a JSON object"
        ))),
        Err(e) => {
            Err(FluxbaseError::InvalidInput(format!("failed to serialize {what} payload: {e}")))
        }
    }
}
