//! Export column schema
//!
//! The schema is a fixed, ordered list of column descriptors. Each run
//! resolves the enabled subset once; header and row values are both produced
//! from that subset so they can never drift out of alignment.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{ExportError, ExportResult};
use crate::row::ExportRow;

/// Rendered when an application uses the service-owned key
const AWS_MANAGED_KEY: &str = "AWS Managed";
/// Separator for list cells in CSV output
const LIST_SEPARATOR: &str = "; ";

/// A typed cell value. CSV and JSON render it differently.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
}

impl CellValue {
    /// CSV field text. Missing values become an empty field, never "None" or "null".
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::List(items) => items.join(LIST_SEPARATOR),
        }
    }

    /// Native JSON value
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Integer(n) => Value::from(*n),
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

fn text(value: Option<&str>) -> CellValue {
    value.map_or(CellValue::Empty, |s| CellValue::Text(s.to_string()))
}

fn integer(value: Option<i64>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Integer)
}

fn boolean(value: Option<bool>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Bool)
}

fn timestamp(value: Option<DateTime<Utc>>) -> CellValue {
    value.map_or(CellValue::Empty, |t| {
        CellValue::Text(t.to_rfc3339_opts(SecondsFormat::Secs, true))
    })
}

/// A column descriptor: output name and extraction rule
pub struct Column {
    pub name: &'static str,
    extract: fn(&ExportRow) -> CellValue,
}

impl Column {
    const fn new(name: &'static str, extract: fn(&ExportRow) -> CellValue) -> Self {
        Self { name, extract }
    }

    pub fn extract(&self, row: &ExportRow) -> CellValue {
        (self.extract)(row)
    }
}

impl std::fmt::Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Every exportable column in output order
pub static SCHEMA: [Column; 25] = [
    Column::new("qapp_name", |row| {
        text(row.item.as_ref().map(|i| i.display_name()))
    }),
    Column::new("user_count", |row| {
        integer(row.usage.as_ref().and_then(|u| u.user_count))
    }),
    Column::new("owner_created_by", |row| {
        text(row.usage.as_ref().and_then(|u| u.owner_id.as_deref()))
    }),
    Column::new("qbusiness_app_name", |row| {
        text(Some(row.application.display_name()))
    }),
    Column::new("qbusiness_app_id", |row| {
        text(Some(row.application.id.as_str()))
    }),
    Column::new("qbusiness_status", |row| {
        text(row.application.status.as_deref())
    }),
    Column::new("qbusiness_identity_type", |row| {
        text(row.application.identity_type.as_deref())
    }),
    Column::new("qbusiness_created_at", |row| {
        timestamp(row.application.created_at)
    }),
    Column::new("qbusiness_updated_at", |row| {
        timestamp(row.application.updated_at)
    }),
    Column::new("qbusiness_encryption", |row| {
        text(Some(
            row.application
                .encryption_key_ref
                .as_deref()
                .unwrap_or(AWS_MANAGED_KEY),
        ))
    }),
    Column::new("qapp_library_item_id", |row| {
        text(row.item.as_ref().map(|i| i.library_item_id.as_str()))
    }),
    Column::new("qapp_id", |row| {
        text(row.item.as_ref().and_then(|i| i.app_id.as_deref()))
    }),
    Column::new("qapp_version", |row| {
        integer(row.item.as_ref().and_then(|i| i.version))
    }),
    Column::new("qapp_status", |row| {
        text(row.item.as_ref().and_then(|i| i.status.as_deref()))
    }),
    Column::new("created_at", |row| {
        timestamp(row.item.as_ref().and_then(|i| i.created_at))
    }),
    Column::new("updated_by", |row| {
        text(row.item.as_ref().and_then(|i| i.updated_by.as_deref()))
    }),
    Column::new("updated_at", |row| {
        timestamp(row.item.as_ref().and_then(|i| i.updated_at))
    }),
    Column::new("rating_count", |row| {
        integer(row.usage.as_ref().and_then(|u| u.rating_count))
    }),
    Column::new("is_verified", |row| {
        boolean(row.usage.as_ref().and_then(|u| u.is_verified))
    }),
    Column::new("is_rated_by_user", |row| {
        boolean(row.usage.as_ref().and_then(|u| u.is_rated_by_current_user))
    }),
    Column::new("description", |row| {
        text(row.item.as_ref().and_then(|i| i.description.as_deref()))
    }),
    Column::new("categories", |row| {
        row.usage
            .as_ref()
            .map_or(CellValue::Empty, |u| CellValue::List(u.categories.clone()))
    }),
    Column::new("retrieval_timestamp", |row| {
        timestamp(Some(row.run.retrieval_timestamp))
    }),
    Column::new("aws_region", |row| {
        text(Some(row.run.region.as_str()))
    }),
    Column::new("aws_account", |row| {
        text(row.run.account_id.as_deref())
    }),
];

/// The enabled columns of a run, in schema order
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<&'static Column>,
}

impl ColumnSet {
    /// Every schema column
    pub fn all() -> Self {
        Self {
            columns: SCHEMA.iter().collect(),
        }
    }

    /// Apply `output.columns` overrides. Columns not named stay enabled.
    ///
    /// Names not in the schema are logged and ignored. Disabling every
    /// column is an error.
    pub fn resolve(overrides: &BTreeMap<String, bool>) -> ExportResult<Self> {
        for name in Self::unknown_names(overrides) {
            tracing::warn!(column = %name, "Ignoring unknown column in output.columns");
        }

        let columns: Vec<&'static Column> = SCHEMA
            .iter()
            .filter(|c| overrides.get(c.name).copied().unwrap_or(true))
            .collect();

        if columns.is_empty() {
            return Err(ExportError::NoColumns);
        }
        Ok(Self { columns })
    }

    /// Override keys that do not name a schema column
    pub fn unknown_names(overrides: &BTreeMap<String, bool>) -> Vec<&str> {
        overrides
            .keys()
            .map(String::as_str)
            .filter(|name| !SCHEMA.iter().any(|c| c.name == *name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Column> + '_ {
        self.columns.iter().copied()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|c| c.name == name)
    }

    /// Cell values of `row`, index-aligned with [`ColumnSet::headers`]
    pub fn values(&self, row: &ExportRow) -> Vec<CellValue> {
        self.iter().map(|c| c.extract(row)).collect()
    }
}
