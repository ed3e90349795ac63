//! Static column descriptors.
//!
//! Columns are declarative: identity, display name, data type, edit and
//! filter flags, and an optional render override. They carry no behavior of
//! their own and are immutable for the lifetime of a grid instance. The
//! `field` name is the join key between columns, filter conditions, and row
//! fields.

use std::fmt;
use std::sync::Arc;

use crate::row::Row;
use crate::value::{CellValue, DataType};

/// Horizontal alignment of a column's cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

/// Custom cell renderer: receives the typed value and the whole row, returns
/// the display string.
pub type RenderOverride = Arc<dyn Fn(&CellValue, &Row) -> String + Send + Sync>;

#[derive(Clone)]
pub struct Column {
    pub field: String,
    pub header: String,
    pub data_type: DataType,
    pub editable: bool,
    pub filterable: bool,
    pub width: u16,
    pub alignment: Alignment,
    render_override: Option<RenderOverride>,
}

impl Column {
    /// A read-only, filterable column. Numbers default to right alignment.
    pub fn new(field: impl Into<String>, header: impl Into<String>, data_type: DataType) -> Self {
        let alignment = match data_type {
            DataType::Number => Alignment::Right,
            _ => Alignment::Left,
        };
        Self {
            field: field.into(),
            header: header.into(),
            data_type,
            editable: false,
            filterable: true,
            width: 16,
            alignment,
            render_override: None,
        }
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn render_with(
        mut self,
        render: impl Fn(&CellValue, &Row) -> String + Send + Sync + 'static,
    ) -> Self {
        self.render_override = Some(Arc::new(render));
        self
    }

    /// The display string for this column in the given row, honoring the
    /// render override when present.
    pub fn display_value(&self, row: &Row) -> String {
        let value = row.get(&self.field);
        match &self.render_override {
            Some(render) => render(value, row),
            None => value.display(),
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("field", &self.field)
            .field("header", &self.header)
            .field("data_type", &self.data_type)
            .field("editable", &self.editable)
            .field("filterable", &self.filterable)
            .field("has_render_override", &self.render_override.is_some())
            .finish()
    }
}

/// Look up a column by its field name.
pub fn find_column<'a>(columns: &'a [Column], field: &str) -> Option<&'a Column> {
    columns.iter().find(|c| c.field == field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::RowId;

    #[test]
    fn test_defaults_by_type() {
        let name = Column::new("name", "Name", DataType::String);
        assert!(!name.editable);
        assert!(name.filterable);
        assert_eq!(name.alignment, Alignment::Left);

        let qty = Column::new("qty", "Qty", DataType::Number);
        assert_eq!(qty.alignment, Alignment::Right);
    }

    #[test]
    fn test_render_override_wins() {
        let column = Column::new("active", "Active", DataType::Boolean)
            .render_with(|value, _row| match value.as_bool() {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => "-".to_string(),
            });

        let mut row = Row::new(RowId::new("1"));
        row.set("active", CellValue::Bool(true));
        assert_eq!(column.display_value(&row), "yes");

        row.set("active", CellValue::Null);
        assert_eq!(column.display_value(&row), "-");
    }
}
