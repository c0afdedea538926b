//! SQLite executor for sqlpager
//!
//! Implements the `Executor` and `Statement` traits over rusqlite. Named
//! placeholders are bound through SQLite's own parameter table, and result
//! cells are mapped into `serde_json::Value`.

use async_trait::async_trait;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::{Map, Number, Value};
use sqlpager::{Executor, FetchConfig, PageError, ParamType, Result, Statement};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// SQLite-backed executor.
///
/// Wraps one connection behind an async mutex; statements prepared from
/// this executor serialize their execution on that connection.
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(sqlite_fault)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_fault)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-opened connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    fn executor_type(&self) -> &'static str {
        "sqlite"
    }

    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        // A syntax error or a missing table surfaces here, not at the
        // first fetch.
        {
            let conn = self.conn.lock().await;
            conn.prepare(sql).map_err(sqlite_fault)?;
        }

        debug!("Prepared SQLite statement: {}", sql);

        Ok(Box::new(SqliteStatement {
            conn: self.conn.clone(),
            sql: sql.to_string(),
            binds: Vec::new(),
        }))
    }
}

/// Prepared-statement handle holding the SQL text and its pending binds.
///
/// SQLite statements borrow their connection, so the handle re-prepares
/// under the connection lock when a fetch runs.
struct SqliteStatement {
    conn: Arc<Mutex<Connection>>,
    sql: String,
    binds: Vec<(String, Value, ParamType)>,
}

#[async_trait]
impl Statement for SqliteStatement {
    fn bind_value(&mut self, name: &str, value: Value, param_type: ParamType) {
        self.binds
            .push((name.trim_start_matches(':').to_string(), value, param_type));
    }

    async fn fetch_all(&mut self, fetch: Option<&FetchConfig>) -> Result<Vec<Value>> {
        let conn = self.conn.lock().await;
        let rows = run_query(&conn, &self.sql, &self.binds, None)?;

        debug!("SQLite query returned {} rows: {}", rows.len(), self.sql);

        match fetch {
            None => Ok(rows),
            Some(FetchConfig::Column(column)) => Ok(rows
                .into_iter()
                .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
                .collect()),
        }
    }

    async fn fetch_one(&mut self) -> Result<Option<Value>> {
        let conn = self.conn.lock().await;
        let mut rows = run_query(&conn, &self.sql, &self.binds, Some(1))?;

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }
}

/// Prepare, bind, and materialize up to `max_rows` rows as JSON objects.
fn run_query(
    conn: &Connection,
    sql: &str,
    binds: &[(String, Value, ParamType)],
    max_rows: Option<usize>,
) -> Result<Vec<Value>> {
    let mut stmt = conn.prepare(sql).map_err(sqlite_fault)?;

    for (name, value, param_type) in binds {
        let placeholder = format!(":{}", name);
        let index = stmt
            .parameter_index(&placeholder)
            .map_err(sqlite_fault)?
            .ok_or_else(|| {
                PageError::data_access(format!(
                    "statement has no placeholder named '{}'",
                    placeholder
                ))
            })?;

        let bound = to_sqlite_value(value, *param_type)?;
        stmt.raw_bind_parameter(index, bound).map_err(sqlite_fault)?;
    }

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(sqlite_fault)? {
        let mut object = Map::new();
        for (i, name) in column_names.iter().enumerate() {
            let cell = row.get_ref(i).map_err(sqlite_fault)?;
            object.insert(name.clone(), cell_to_json(cell));
        }
        out.push(Value::Object(object));

        if max_rows.is_some_and(|max| out.len() >= max) {
            break;
        }
    }

    Ok(out)
}

/// Convert a bind value to the SQLite storage type its tag asks for.
fn to_sqlite_value(value: &Value, param_type: ParamType) -> Result<SqlValue> {
    match param_type {
        ParamType::Null => Ok(SqlValue::Null),
        ParamType::Int => match value {
            Value::Null => Ok(SqlValue::Null),
            Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
            Value::Number(n) => n
                .as_i64()
                .map(SqlValue::Integer)
                .ok_or_else(|| bind_mismatch(value, param_type)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(SqlValue::Integer)
                .map_err(|_| bind_mismatch(value, param_type)),
            _ => Err(bind_mismatch(value, param_type)),
        },
        ParamType::Float => match value {
            Value::Null => Ok(SqlValue::Null),
            Value::Number(n) => n
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| bind_mismatch(value, param_type)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .map_err(|_| bind_mismatch(value, param_type)),
            _ => Err(bind_mismatch(value, param_type)),
        },
        ParamType::Bool => match value {
            Value::Null => Ok(SqlValue::Null),
            Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
            Value::Number(n) => n
                .as_i64()
                .map(|v| SqlValue::Integer((v != 0) as i64))
                .ok_or_else(|| bind_mismatch(value, param_type)),
            _ => Err(bind_mismatch(value, param_type)),
        },
        ParamType::Str => Ok(match value {
            Value::Null => SqlValue::Null,
            Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }),
    }
}

/// Map one result cell into JSON. Blobs come back as lossy text.
fn cell_to_json(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::String(String::from_utf8_lossy(blob).into_owned()),
    }
}

fn bind_mismatch(value: &Value, param_type: ParamType) -> PageError {
    PageError::data_access(format!("cannot bind {} as {}", value, param_type))
}

fn sqlite_fault(err: rusqlite::Error) -> PageError {
    error!("SQLite error: {}", err);
    PageError::data_access(err.to_string())
}
