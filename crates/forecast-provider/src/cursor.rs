//! Materialized query results.

use serde_json::{Map, Value as JsonValue};

use crate::uri::ResourceUri;
use crate::values::Value;

/// Rows returned by a query, plus the URI they were read from so callers can
/// watch it for changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    notification_uri: Option<ResourceUri>,
}

impl Cursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            notification_uri: None,
        }
    }

    pub fn set_notification_uri(&mut self, uri: ResourceUri) {
        self.notification_uri = Some(uri);
    }

    pub fn notification_uri(&self) -> Option<&ResourceUri> {
        self.notification_uri.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            cursor: self,
            values,
        })
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            cursor: self,
            values,
        })
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows().map(|row| row.to_json()).collect())
    }
}

/// A borrowed view of one cursor row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    cursor: &'a Cursor,
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.cursor
            .column_index(column)
            .and_then(|index| self.values.get(index))
    }

    pub fn to_json(&self) -> JsonValue {
        let mut object = Map::new();
        for (column, value) in self.cursor.columns.iter().zip(self.values) {
            let json = serde_json::to_value(value).unwrap_or(JsonValue::Null);
            object.insert(column.clone(), json);
        }
        JsonValue::Object(object)
    }
}
