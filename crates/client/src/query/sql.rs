//! Diagnostic SQL rendering of a query descriptor.
//!
//! The output is a human-readable approximation for logs and debugging; it
//! is never sent to the server and makes no promise of being executable on
//! any particular database.

use fluxbase_domain::{ConditionNode, InsertData, Operator, QueryDescriptor, QueryType, Row};
use serde_json::Value;

/// Render a descriptor as a SQL-like string.
pub fn render_sql(descriptor: &QueryDescriptor) -> String {
    match descriptor.query_type {
        QueryType::Select => render_select(descriptor),
        QueryType::Insert => render_insert(descriptor),
        QueryType::Update => render_update(descriptor),
        QueryType::Delete => render_delete(descriptor),
    }
}

fn render_select(descriptor: &QueryDescriptor) -> String {
    let mut sql = String::from("SELECT ");
    if descriptor.distinct {
        sql.push_str("DISTINCT ");
    }
    if descriptor.columns.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&descriptor.columns.join(", "));
    }
    sql.push_str(" FROM ");
    sql.push_str(&descriptor.table);

    for join in &descriptor.joins {
        sql.push(' ');
        sql.push_str(join.kind.as_sql());
        sql.push(' ');
        sql.push_str(&join.table);
        sql.push_str(" ON ");
        sql.push_str(&join.first_column);
        sql.push(' ');
        sql.push_str(&render_operator(join.operator));
        sql.push(' ');
        sql.push_str(&join.second_column);
    }

    push_where(&mut sql, &descriptor.where_clause);

    if !descriptor.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&descriptor.group_by.join(", "));
    }
    if !descriptor.having.is_empty() {
        sql.push_str(" HAVING ");
        sql.push_str(&render_conditions(&descriptor.having));
    }
    if !descriptor.order_by.is_empty() {
        let entries: Vec<String> = descriptor
            .order_by
            .iter()
            .map(|entry| format!("{} {}", entry.column, entry.direction.as_sql()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&entries.join(", "));
    }
    if let Some(limit) = descriptor.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = descriptor.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    sql
}

fn render_insert(descriptor: &QueryDescriptor) -> String {
    let rows: Vec<&Row> = match &descriptor.insert_data {
        Some(InsertData::One(row)) => vec![row],
        Some(InsertData::Many(rows)) => rows.iter().collect(),
        None => Vec::new(),
    };

    let mut sql = format!("INSERT INTO {}", descriptor.table);

    if let Some(first) = rows.first() {
        let columns: Vec<&str> = first.keys().map(String::as_str).collect();
        sql.push_str(&format!(" ({})", columns.join(", ")));
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<String> = columns
                    .iter()
                    .map(|col| row.get(*col).map_or_else(|| "NULL".to_string(), render_value))
                    .collect();
                format!("({})", values.join(", "))
            })
            .collect();
        sql.push_str(" VALUES ");
        sql.push_str(&tuples.join(", "));
    } else {
        sql.push_str(" DEFAULT VALUES");
    }

    push_returning(&mut sql, &descriptor.returning);
    sql
}

fn render_update(descriptor: &QueryDescriptor) -> String {
    let mut sql = format!("UPDATE {} SET ", descriptor.table);
    match &descriptor.update_data {
        Some(row) => {
            let assignments: Vec<String> =
                row.iter().map(|(col, value)| format!("{} = {}", col, render_value(value))).collect();
            sql.push_str(&assignments.join(", "));
        }
        None => sql.push_str("/* no assignments */"),
    }
    push_where(&mut sql, &descriptor.where_clause);
    push_returning(&mut sql, &descriptor.returning);
    sql
}

fn render_delete(descriptor: &QueryDescriptor) -> String {
    let mut sql = format!("DELETE FROM {}", descriptor.table);
    push_where(&mut sql, &descriptor.where_clause);
    push_returning(&mut sql, &descriptor.returning);
    sql
}

fn push_where(sql: &mut String, nodes: &[ConditionNode]) {
    if !nodes.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&render_conditions(nodes));
    }
}

fn push_returning(sql: &mut String, returning: &[String]) {
    if !returning.is_empty() {
        sql.push_str(" RETURNING ");
        sql.push_str(&returning.join(", "));
    }
}

/// Walk the node list depth-first; the first node's combinator is skipped,
/// nested groups are parenthesized.
fn render_conditions(nodes: &[ConditionNode]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(node.boolean().as_str());
            out.push(' ');
        }
        match node {
            ConditionNode::Raw { raw, .. } => out.push_str(raw),
            ConditionNode::Group { group, .. } => {
                out.push('(');
                out.push_str(&render_conditions(group));
                out.push(')');
            }
            ConditionNode::Expr { column, operator, value, .. } => {
                out.push_str(&render_expr(column, *operator, value.as_ref()));
            }
        }
    }
    out
}

fn render_expr(column: &str, operator: Operator, value: Option<&Value>) -> String {
    match operator {
        Operator::IsNull | Operator::IsNotNull => {
            format!("{} {}", column, render_operator(operator))
        }
        Operator::In | Operator::NotIn => {
            let list = match value {
                Some(Value::Array(items)) => {
                    items.iter().map(render_value).collect::<Vec<_>>().join(", ")
                }
                Some(other) => render_value(other),
                None => String::new(),
            };
            format!("{} {} ({})", column, render_operator(operator), list)
        }
        Operator::Between => match value {
            Some(Value::Array(pair)) if pair.len() == 2 => format!(
                "{} BETWEEN {} AND {}",
                column,
                render_value(&pair[0]),
                render_value(&pair[1])
            ),
            _ => format!("{} BETWEEN ?", column),
        },
        _ => {
            let operand = value.map_or_else(|| "?".to_string(), render_value);
            format!("{} {} {}", column, render_operator(operator), operand)
        }
    }
}

fn render_operator(operator: Operator) -> String {
    operator.as_str().to_uppercase()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use fluxbase_domain::{Combinator, JoinKind, Operator, OrderBy, OrderDirection};
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_select_with_clauses() {
        let mut descriptor = QueryDescriptor::select("users");
        descriptor.columns = vec!["id".into(), "name".into()];
        descriptor.where_clause = vec![
            ConditionNode::Expr {
                column: "active".into(),
                operator: Operator::Eq,
                value: Some(json!(true)),
                boolean: Combinator::And,
            },
            ConditionNode::Expr {
                column: "age".into(),
                operator: Operator::Gte,
                value: Some(json!(18)),
                boolean: Combinator::Or,
            },
        ];
        descriptor.order_by = vec![OrderBy { column: "created_at".into(), direction: OrderDirection::Desc }];
        descriptor.limit = Some(10);

        assert_eq!(
            render_sql(&descriptor),
            "SELECT id, name FROM users WHERE active = true OR age >= 18 \
             ORDER BY created_at DESC LIMIT 10"
        );
    }

    #[test]
    fn renders_star_for_empty_projection() {
        let descriptor = QueryDescriptor::select("users");
        assert_eq!(render_sql(&descriptor), "SELECT * FROM users");
    }

    #[test]
    fn renders_joins_in_order() {
        let mut descriptor = QueryDescriptor::select("users");
        descriptor.joins = vec![fluxbase_domain::Join {
            table: "orders".into(),
            first_column: "users.id".into(),
            operator: Operator::Eq,
            second_column: "orders.user_id".into(),
            kind: JoinKind::Left,
        }];
        assert_eq!(
            render_sql(&descriptor),
            "SELECT * FROM users LEFT JOIN orders ON users.id = orders.user_id"
        );
    }

    #[test]
    fn renders_nested_groups_with_parentheses() {
        let mut descriptor = QueryDescriptor::select("users");
        descriptor.where_clause = vec![
            ConditionNode::Expr {
                column: "tenant".into(),
                operator: Operator::Eq,
                value: Some(json!("acme")),
                boolean: Combinator::And,
            },
            ConditionNode::Group {
                group: vec![
                    ConditionNode::Expr {
                        column: "role".into(),
                        operator: Operator::Eq,
                        value: Some(json!("admin")),
                        boolean: Combinator::And,
                    },
                    ConditionNode::Expr {
                        column: "role".into(),
                        operator: Operator::Eq,
                        value: Some(json!("owner")),
                        boolean: Combinator::Or,
                    },
                ],
                boolean: Combinator::Or,
            },
        ];

        assert_eq!(
            render_sql(&descriptor),
            "SELECT * FROM users WHERE tenant = 'acme' OR (role = 'admin' OR role = 'owner')"
        );
    }

    #[test]
    fn renders_in_between_and_null_checks() {
        let mut descriptor = QueryDescriptor::select("t");
        descriptor.where_clause = vec![
            ConditionNode::Expr {
                column: "id".into(),
                operator: Operator::In,
                value: Some(json!([1, 2])),
                boolean: Combinator::And,
            },
            ConditionNode::Expr {
                column: "age".into(),
                operator: Operator::Between,
                value: Some(json!([18, 65])),
                boolean: Combinator::And,
            },
            ConditionNode::Expr {
                column: "deleted_at".into(),
                operator: Operator::IsNull,
                value: None,
                boolean: Combinator::And,
            },
        ];

        assert_eq!(
            render_sql(&descriptor),
            "SELECT * FROM t WHERE id IN (1, 2) AND age BETWEEN 18 AND 65 \
             AND deleted_at IS NULL"
        );
    }

    #[test]
    fn renders_raw_fragment_verbatim() {
        let mut descriptor = QueryDescriptor::select("t");
        descriptor.where_clause = vec![ConditionNode::Raw {
            raw: "metadata @> '{\"k\": 1}'".into(),
            params: vec![],
            boolean: Combinator::And,
        }];
        assert_eq!(render_sql(&descriptor), "SELECT * FROM t WHERE metadata @> '{\"k\": 1}'");
    }

    #[test]
    fn renders_insert_update_delete() {
        let mut insert = QueryDescriptor::select("users");
        insert.query_type = QueryType::Insert;
        insert.insert_data =
            Some(InsertData::One(json!({"name": "a"}).as_object().unwrap().clone()));
        insert.returning = vec!["id".into()];
        assert_eq!(render_sql(&insert), "INSERT INTO users (name) VALUES ('a') RETURNING id");

        let mut update = QueryDescriptor::select("users");
        update.query_type = QueryType::Update;
        update.update_data = Some(json!({"name": "b"}).as_object().unwrap().clone());
        update.where_clause = vec![ConditionNode::Expr {
            column: "id".into(),
            operator: Operator::Eq,
            value: Some(json!(7)),
            boolean: Combinator::And,
        }];
        assert_eq!(render_sql(&update), "UPDATE users SET name = 'b' WHERE id = 7");

        let mut delete = QueryDescriptor::select("users");
        delete.query_type = QueryType::Delete;
        assert_eq!(render_sql(&delete), "DELETE FROM users");
    }
}
