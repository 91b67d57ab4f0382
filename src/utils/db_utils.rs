use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlArguments;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{MySql, MySqlPool};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Null,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Binding works the same for `query`, `query_as` and `query_scalar`
pub trait BindSqlValue: Sized {
    fn bind_value(self, value: SqlValue) -> Self;

    fn bind_all(self, values: &[SqlValue]) -> Self {
        values.iter().cloned().fold(self, |q, v| q.bind_value(v))
    }
}

macro_rules! impl_bind_sql_value {
    ($ty:ty $(, $g:ident)*) => {
        impl<'q $(, $g)*> BindSqlValue for $ty {
            fn bind_value(self, value: SqlValue) -> Self {
                match value {
                    SqlValue::String(v) => self.bind(v),
                    SqlValue::U64(v) => self.bind(v),
                    SqlValue::Bool(v) => self.bind(v),
                    SqlValue::Date(v) => self.bind(v),
                    SqlValue::DateTime(v) => self.bind(v),
                    SqlValue::Null => self.bind(None::<String>),
                }
            }
        }
    };
}

impl_bind_sql_value!(Query<'q, MySql, MySqlArguments>);
impl_bind_sql_value!(QueryAs<'q, MySql, O, MySqlArguments>, O);
impl_bind_sql_value!(QueryScalar<'q, MySql, O, MySqlArguments>, O);

/// ===============================
/// WHERE clause builder
/// ===============================
#[derive(Debug, Default)]
pub struct SqlFilter {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `condition` carries one `?` per value, in order
    pub fn push(&mut self, condition: &str, values: Vec<SqlValue>) -> &mut Self {
        debug_assert_eq!(condition.matches('?').count(), values.len());
        self.conditions.push(condition.to_string());
        self.values.extend(values);
        self
    }

    pub fn eq(&mut self, column: &str, value: impl Into<SqlValue>) -> &mut Self {
        self.push(&format!("{column} = ?"), vec![value.into()])
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Prefixes each column of a comma-separated list with a table alias
pub fn qualify(columns: &str, alias: &str) -> String {
    columns
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Unique-key violations only; foreign-key and NOT NULL failures share SQLSTATE 23000
pub fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// `%term%` with LIKE wildcards in the term escaped
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come from typed request structs, never from client-supplied keys.
/// Returns `None` when there is nothing to set.
pub fn build_update_sql(
    table: &str,
    changes: Vec<(&'static str, SqlValue)>,
    id_column: &str,
    id_value: u64,
) -> Option<SqlUpdate> {
    if changes.is_empty() {
        return None;
    }

    let set_clause = changes
        .iter()
        .map(|(column, _)| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {table} SET {set_clause} WHERE {id_column} = ?");

    let mut values: Vec<SqlValue> = changes.into_iter().map(|(_, v)| v).collect();
    values.push(SqlValue::U64(id_value));

    Some(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&update.sql)
        .bind_all(&update.values)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
