//! Parameterised SQL fragments for list filters and ordering.
//!
//! Every value that originates from a request, JSON keys included, is
//! emitted as a `$n` placeholder. Only table names, which come from
//! [`ResourceKind`](clinic_core::ResourceKind), are written into the SQL text.

use clinic_storage::{Filter, ListQuery, MAX_EXPIRY_DAYS, SortParam};
use serde_json::Value;

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
}

/// Accumulates bind parameters and hands out their placeholders.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    params: Vec<SqlParam>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parameter and returns its placeholder.
    pub fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    pub fn push_text(&mut self, text: impl Into<String>) -> String {
        self.push(SqlParam::Text(text.into()))
    }

    pub fn push_integer(&mut self, value: i64) -> String {
        self.push(SqlParam::Integer(value))
    }

    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }

    /// `WHERE` body for the filters, `TRUE` when there are none.
    pub fn where_clause(&mut self, filters: &[Filter]) -> String {
        if filters.is_empty() {
            return "TRUE".to_string();
        }
        filters
            .iter()
            .map(|filter| self.condition(filter))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn condition(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Equals { field, value } => {
                let Some(text) = scalar_text(value) else {
                    return "FALSE".to_string();
                };
                let field = self.push_text(field.as_str());
                let value = self.push_text(text);
                format!("resource ->> {field} = {value}")
            }
            Filter::Contains { fields, needle } => {
                if fields.is_empty() {
                    return "FALSE".to_string();
                }
                let pattern = self.push_text(format!("%{}%", escape_like(needle)));
                let alternatives: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        let field = self.push_text(field.as_str());
                        format!("resource ->> {field} ILIKE {pattern}")
                    })
                    .collect();
                format!("({})", alternatives.join(" OR "))
            }
            Filter::AtMost { field, limit_field } => {
                let field = self.push_text(field.as_str());
                let limit = self.push_text(limit_field.as_str());
                format!(
                    "(CASE WHEN jsonb_typeof(resource -> {field}) = 'number' \
                     AND jsonb_typeof(resource -> {limit}) = 'number' \
                     THEN (resource ->> {field})::numeric <= (resource ->> {limit})::numeric \
                     ELSE FALSE END)"
                )
            }
            // clinic_safe_date() yields NULL for unparseable text, so bad rows drop out
            Filter::ExpiresWithin { field, days } => {
                let field = self.push_text(field.as_str());
                let days = self.push_integer(i64::from((*days).min(MAX_EXPIRY_DAYS)));
                format!(
                    "COALESCE(clinic_safe_date(resource ->> {field}) \
                     <= CURRENT_DATE + {days}::integer, FALSE)"
                )
            }
        }
    }

    /// `ORDER BY` body. Without a sort, rows come back in insertion order.
    pub fn order_clause(&mut self, sort: Option<&SortParam>) -> String {
        match sort {
            Some(sort) => {
                let field = self.push_text(sort.field.as_str());
                if sort.descending {
                    format!("resource ->> {field} DESC NULLS LAST, seq DESC")
                } else {
                    format!("resource ->> {field} ASC NULLS FIRST, seq ASC")
                }
            }
            None => "seq ASC".to_string(),
        }
    }
}

/// Text form of a scalar JSON value, matching what `->>` yields.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Escapes `LIKE` metacharacters so the needle matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A complete statement plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// `SELECT resource` for one page of a list query.
pub fn select_page(table: &str, query: &ListQuery) -> BuiltQuery {
    let mut builder = QueryBuilder::new();
    let where_clause = builder.where_clause(&query.filters);
    let order_clause = builder.order_clause(query.sort.as_ref());
    let limit = builder.push_integer(i64::from(query.limit));
    let offset = builder.push_integer(i64::try_from(query.offset()).unwrap_or(i64::MAX));
    BuiltQuery {
        sql: format!(
            "SELECT resource FROM {table} WHERE {where_clause} \
             ORDER BY {order_clause} LIMIT {limit} OFFSET {offset}"
        ),
        params: builder.into_params(),
    }
}

/// `SELECT COUNT(*)` over the filtered rows.
pub fn select_count(table: &str, filters: &[Filter]) -> BuiltQuery {
    let mut builder = QueryBuilder::new();
    let where_clause = builder.where_clause(filters);
    BuiltQuery {
        sql: format!("SELECT COUNT(*) FROM {table} WHERE {where_clause}"),
        params: builder.into_params(),
    }
}
