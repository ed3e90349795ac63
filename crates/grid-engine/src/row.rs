//! Rows: typed records with a stable identity and transient grid flags.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::column::Column;
use crate::value::{CellValue, NULL};

/// Stable row identity.
///
/// Backend ids arrive as strings or numbers; both are kept in string form so
/// the id survives round trips through loosely-typed records unchanged.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One record in the grid's in-memory data set.
///
/// Rows are owned exclusively by the grid controller; the filter, sort, and
/// pagination engines only ever see shared references.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    id: RowId,
    values: BTreeMap<String, CellValue>,
    /// Created client-side, not yet confirmed by the backend.
    pub is_new: bool,
    /// Currently in inline-edit mode (rendering hint).
    pub is_editing: bool,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
            is_new: false,
            is_editing: false,
        }
    }

    /// An all-null row for the given columns, used as the default create
    /// factory.
    pub fn blank(id: RowId, columns: &[Column]) -> Self {
        let mut row = Row::new(id);
        for column in columns {
            row.values.insert(column.field.clone(), CellValue::Null);
        }
        row
    }

    pub fn id(&self) -> &RowId {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: RowId) {
        self.id = id;
    }

    /// Field lookup. Absent fields read as null, never as an error.
    pub fn get(&self, field: &str) -> &CellValue {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: impl Into<String>, value: CellValue) {
        self.values.insert(field.into(), value);
    }

    /// Build a row from a raw backend record, typing each declared column's
    /// field. Returns `None` when the record has no usable `id`; such
    /// records cannot participate in updates or deletes and are skipped by
    /// the caller.
    pub fn from_record(record: &JsonValue, columns: &[Column]) -> Option<Self> {
        let object = record.as_object()?;
        let id = record_id(object)?;

        let mut row = Row::new(id);
        for column in columns {
            let raw = object.get(&column.field).unwrap_or(&JsonValue::Null);
            row.values
                .insert(column.field.clone(), CellValue::from_json(raw, column.data_type));
        }
        Some(row)
    }

    /// Serialize the row back into a backend record, including its id.
    pub fn to_record(&self, columns: &[Column]) -> JsonValue {
        let mut object = Map::new();
        object.insert("id".to_string(), JsonValue::String(self.id.as_str().to_string()));
        for column in columns {
            object.insert(column.field.clone(), self.get(&column.field).to_json());
        }
        JsonValue::Object(object)
    }
}

fn record_id(object: &Map<String, JsonValue>) -> Option<RowId> {
    match object.get("id") {
        Some(JsonValue::String(s)) if !s.is_empty() => Some(RowId::new(s.clone())),
        Some(JsonValue::Number(n)) => Some(RowId::new(n.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::value::DataType;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", "Name", DataType::String),
            Column::new("odometer", "Odometer", DataType::Number),
        ]
    }

    #[test]
    fn test_from_record_types_fields() {
        let row = Row::from_record(
            &json!({"id": 3, "name": "Truck 7", "odometer": "120350"}),
            &columns(),
        )
        .unwrap();

        assert_eq!(row.id().as_str(), "3");
        assert_eq!(row.get("name"), &CellValue::Text("Truck 7".to_string()));
        assert_eq!(row.get("odometer"), &CellValue::Number(120_350.0));
    }

    #[test]
    fn test_from_record_without_id_is_rejected() {
        assert!(Row::from_record(&json!({"name": "stray"}), &columns()).is_none());
        assert!(Row::from_record(&json!("not an object"), &columns()).is_none());
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let row = Row::from_record(&json!({"id": "a", "name": "x"}), &columns()).unwrap();
        assert!(row.get("odometer").is_null());
        assert!(row.get("no_such_field").is_null());
    }

    #[test]
    fn test_to_record_round_trip() {
        let cols = columns();
        let row = Row::from_record(&json!({"id": "7", "name": "Van 2", "odometer": 12.5}), &cols)
            .unwrap();
        let record = row.to_record(&cols);

        assert_eq!(record["id"], json!("7"));
        assert_eq!(record["name"], json!("Van 2"));
        assert_eq!(record["odometer"], json!(12.5));
    }
}
