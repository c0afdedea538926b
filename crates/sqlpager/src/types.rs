use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Type tag attached to a bind parameter.
///
/// Tells the executor how to hand the value to the driver. `Str` is the
/// default, matching the behavior of drivers that stringify untagged binds.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Bind as text
    #[default]
    Str,
    /// Bind as a signed integer
    Int,
    /// Bind as a double-precision float
    Float,
    /// Bind as a boolean
    Bool,
    /// Bind as SQL NULL
    Null,
}

impl ParamType {
    /// Pick the tag that matches a JSON value's own type.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => ParamType::Null,
            Value::Bool(_) => ParamType::Bool,
            Value::Number(n) if n.is_f64() => ParamType::Float,
            Value::Number(_) => ParamType::Int,
            _ => ParamType::Str,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Str => write!(f, "str"),
            ParamType::Int => write!(f, "int"),
            ParamType::Float => write!(f, "float"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::Null => write!(f, "null"),
        }
    }
}

/// One named value to substitute into a placeholder at execution time.
///
/// Parameters accumulate on the paginator in insertion order and are replayed
/// against the prepared statement in that order. Duplicate names are kept
/// as-is; whatever the executor does with duplicate binds is passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindParameter {
    /// Placeholder name, stored without the leading ':'
    pub name: String,
    /// Value to bind
    pub value: Value,
    /// How the executor should bind the value
    pub param_type: ParamType,
}

impl BindParameter {
    /// Create a parameter with an explicit type tag.
    ///
    /// The name is accepted with or without the leading ':'.
    pub fn new(name: impl Into<String>, value: impl Into<Value>, param_type: ParamType) -> Self {
        let name = name.into();
        Self {
            name: name.trim_start_matches(':').to_string(),
            value: value.into(),
            param_type,
        }
    }

    /// Create a parameter, inferring the type tag from the value.
    pub fn inferred(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let param_type = ParamType::infer(&value);
        Self::new(name, value, param_type)
    }
}

/// Optional shaping applied when raw rows are materialized into a page.
///
/// With no config, every row is the canonical mapping of column name to
/// value. `Column` reduces each row to the bare value of one named column.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchConfig {
    /// Keep only the named column's value for each row
    Column(String),
}

/// The four pagination facts of a page, as a serializable mapping.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Total row count across all pages
    pub total: u64,
    /// Page size
    pub per_page: u64,
    /// Current page number, 1-based
    pub current_page: u64,
    /// ceil(total / per_page)
    pub total_pages: u64,
}
