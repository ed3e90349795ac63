//! Single-column, type-aware, stable sorting.

use crate::column::{find_column, Column};
use crate::row::Row;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => "^",
            SortDirection::Descending => "v",
        }
    }
}

/// The grid's sort selection: at most one column at a time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortState {
    pub field: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            direction: SortDirection::Descending,
        }
    }

    /// Cycle the sort for a column: unsorted -> ascending -> descending ->
    /// unsorted. Selecting a different column starts at ascending.
    pub fn cycle(&mut self, field: &str) {
        match (&self.field, self.direction) {
            (Some(current), SortDirection::Ascending) if current == field => {
                self.direction = SortDirection::Descending;
            }
            (Some(current), SortDirection::Descending) if current == field => {
                self.field = None;
                self.direction = SortDirection::Ascending;
            }
            _ => {
                self.field = Some(field.to_string());
                self.direction = SortDirection::Ascending;
            }
        }
    }
}

/// Sort row references by the selected column.
///
/// With no sort column the input order is preserved. The sort is stable:
/// equal keys retain their original relative order, and descending reverses
/// the comparator's sign rather than the array.
pub fn sort<'a>(rows: Vec<&'a Row>, state: &SortState, columns: &[Column]) -> Vec<&'a Row> {
    let Some(field) = state.field.as_deref() else {
        return rows;
    };
    let Some(column) = find_column(columns, field) else {
        return rows;
    };

    let mut sorted = rows;
    sorted.sort_by(|a, b| {
        let ordering = a.get(field).compare(b.get(field), column.data_type);
        match state.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{CellValue, DataType};
    use crate::row::RowId;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", "Name", DataType::String),
            Column::new("qty", "Qty", DataType::Number),
        ]
    }

    fn row(id: &str, name: &str, qty: Option<f64>) -> Row {
        let mut row = Row::new(RowId::new(id));
        row.set("name", CellValue::Text(name.to_string()));
        row.set(
            "qty",
            qty.map(CellValue::Number).unwrap_or(CellValue::Null),
        );
        row
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|r| r.id().as_str().to_string()).collect()
    }

    #[test]
    fn test_no_sort_preserves_order() {
        let rows = vec![row("2", "b", None), row("1", "a", None)];
        let refs: Vec<&Row> = rows.iter().collect();
        let sorted = sort(refs, &SortState::none(), &columns());
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_stability_on_equal_keys() {
        let rows = vec![row("1", "X", None), row("2", "X", None), row("3", "A", None)];
        let refs: Vec<&Row> = rows.iter().collect();

        let sorted = sort(refs, &SortState::ascending("name"), &columns());
        assert_eq!(ids(&sorted), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_numeric_sort_is_numeric() {
        let rows = vec![
            row("1", "a", Some(100.0)),
            row("2", "b", Some(20.0)),
            row("3", "c", Some(3.0)),
        ];
        let refs: Vec<&Row> = rows.iter().collect();

        let sorted = sort(refs, &SortState::ascending("qty"), &columns());
        // Lexical order would be 100 < 20 < 3.
        assert_eq!(ids(&sorted), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_missing_numbers_sort_last_ascending() {
        let rows = vec![row("1", "a", None), row("2", "b", Some(1.0))];
        let refs: Vec<&Row> = rows.iter().collect();

        let sorted = sort(refs, &SortState::ascending("qty"), &columns());
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_descending_reverses_comparator() {
        let rows = vec![row("1", "a", Some(1.0)), row("2", "b", Some(2.0))];
        let refs: Vec<&Row> = rows.iter().collect();

        let sorted = sort(refs, &SortState::descending("qty"), &columns());
        assert_eq!(ids(&sorted), vec!["2", "1"]);
    }

    #[test]
    fn test_cycle_asc_desc_none() {
        let mut state = SortState::none();
        state.cycle("qty");
        assert_eq!(state, SortState::ascending("qty"));
        state.cycle("qty");
        assert_eq!(state, SortState::descending("qty"));
        state.cycle("qty");
        assert_eq!(state.field, None);

        state.cycle("qty");
        state.cycle("name");
        assert_eq!(state, SortState::ascending("name"));
    }
}
