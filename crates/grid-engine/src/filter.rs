//! Multi-condition filtering.
//!
//! A filter is an ordered list of `(column, operator, value)` conditions
//! combined with logical AND. Evaluation is a pure function over row
//! references; the canonical row set is never touched. Conditions are
//! edited against a *staged* list and only take effect on an explicit
//! apply, so several edits land atomically.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::column::{find_column, Column};
use crate::error::ValidationError;
use crate::row::Row;
use crate::value::{parse_date, DataType};

/// Comparison operator of a single filter condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    Contains,
    NotContains,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    /// Operators offered for a column of the given type.
    ///
    /// Ordered columns (number/date) get the relational set, booleans only
    /// equality and emptiness, everything else the string-oriented set.
    pub fn available_for(data_type: DataType) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match data_type {
            DataType::Number | DataType::Date => &[
                Equals,
                NotEquals,
                GreaterThan,
                GreaterThanOrEqual,
                LessThan,
                LessThanOrEqual,
                IsEmpty,
                IsNotEmpty,
            ],
            DataType::Boolean => &[Equals, NotEquals, IsEmpty, IsNotEmpty],
            DataType::String => &[
                Contains,
                NotContains,
                Equals,
                NotEquals,
                StartsWith,
                EndsWith,
                IsEmpty,
                IsNotEmpty,
            ],
        }
    }

    /// Whether the operator is meaningless without a comparison value.
    pub fn requires_value(self) -> bool {
        !matches!(self, FilterOperator::IsEmpty | FilterOperator::IsNotEmpty)
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "does not contain",
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "does not equal",
            FilterOperator::StartsWith => "starts with",
            FilterOperator::EndsWith => "ends with",
            FilterOperator::GreaterThan => ">",
            FilterOperator::LessThan => "<",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::IsEmpty => "is empty",
            FilterOperator::IsNotEmpty => "is not empty",
        }
    }
}

static CONDITION_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_condition_id() -> String {
    let seq = CONDITION_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
    format!("f{}-{}", chrono::Utc::now().timestamp_millis(), seq)
}

/// One `(column, operator, value)` predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCondition {
    /// Generation-time unique token, used by the editor to address the
    /// condition while it is being staged.
    pub id: String,
    /// Field name of the target column.
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            id: next_condition_id(),
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// A condition with a required-but-empty value is inactive: it stays in
    /// the editor but is excluded from evaluation.
    pub fn is_active(&self) -> bool {
        !self.operator.requires_value() || !self.value.trim().is_empty()
    }

    /// Check the condition against the column model. Malformed conditions
    /// are caught here, before evaluation, and never reach row data.
    pub fn validate(&self, columns: &[Column]) -> Result<(), ValidationError> {
        let column = find_column(columns, &self.field).ok_or_else(|| ValidationError::UnknownColumn {
            field: self.field.clone(),
        })?;
        if !column.filterable {
            return Err(ValidationError::NotFilterable {
                field: self.field.clone(),
            });
        }
        if !FilterOperator::available_for(column.data_type).contains(&self.operator) {
            return Err(ValidationError::OperatorMismatch {
                field: self.field.clone(),
                operator: self.operator.label(),
                data_type: column.data_type.label(),
            });
        }
        Ok(())
    }

    fn matches(&self, row: &Row, column: &Column) -> bool {
        use FilterOperator::*;

        let cell = row.get(&self.field);

        match self.operator {
            IsEmpty => cell.display().trim().is_empty(),
            IsNotEmpty => !cell.display().trim().is_empty(),

            Contains => self.string_test(row, |hay, needle| hay.contains(needle)),
            NotContains => !self.string_test(row, |hay, needle| hay.contains(needle)),
            StartsWith => self.string_test(row, |hay, needle| hay.starts_with(needle)),
            EndsWith => self.string_test(row, |hay, needle| hay.ends_with(needle)),

            Equals => self.equality_test(row, column),
            NotEquals => !self.equality_test(row, column),

            GreaterThan => self.relational_test(row, column, |ord| ord.is_gt()),
            GreaterThanOrEqual => self.relational_test(row, column, |ord| ord.is_ge()),
            LessThan => self.relational_test(row, column, |ord| ord.is_lt()),
            LessThanOrEqual => self.relational_test(row, column, |ord| ord.is_le()),
        }
    }

    /// Case-insensitive substring-family test on the string form.
    fn string_test(&self, row: &Row, test: impl Fn(&str, &str) -> bool) -> bool {
        let hay = row.get(&self.field).display().to_lowercase();
        let needle = self.value.trim().to_lowercase();
        test(&hay, &needle)
    }

    /// Exact match: numeric/temporal for ordered columns, boolean for
    /// boolean columns, case-insensitive string otherwise. An unparseable
    /// comparison value simply never matches.
    fn equality_test(&self, row: &Row, column: &Column) -> bool {
        let cell = row.get(&self.field);
        let wanted = self.value.trim();
        match column.data_type {
            DataType::Number => match (cell.as_number(), wanted.parse::<f64>().ok()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            DataType::Date => match (cell.as_date(), parse_date(wanted)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            DataType::Boolean => match (cell.as_bool(), wanted.to_lowercase().parse::<bool>().ok()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            DataType::String => cell.display().to_lowercase() == wanted.to_lowercase(),
        }
    }

    /// Ordered comparison. Only number and date columns can satisfy these;
    /// on any other column the condition fails without erroring.
    fn relational_test(
        &self,
        row: &Row,
        column: &Column,
        accept: impl Fn(std::cmp::Ordering) -> bool,
    ) -> bool {
        let cell = row.get(&self.field);
        let wanted = self.value.trim();
        let ordering = match column.data_type {
            DataType::Number => match (cell.as_number(), wanted.parse::<f64>().ok()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
            DataType::Date => match (cell.as_date(), parse_date(wanted)) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
            _ => None,
        };
        ordering.map(accept).unwrap_or(false)
    }
}

/// Evaluate the active conditions against a row set, AND-composed.
///
/// Pure: returns a fresh vector of references and never mutates the input.
/// Conditions referencing columns absent from the model cannot be typed and
/// are skipped, matching the editor's validation.
pub fn evaluate<'a>(
    rows: &'a [Row],
    conditions: &[FilterCondition],
    columns: &[Column],
) -> Vec<&'a Row> {
    let active: Vec<(&FilterCondition, &Column)> = conditions
        .iter()
        .filter(|condition| condition.is_active())
        .filter_map(|condition| find_column(columns, &condition.field).map(|col| (condition, col)))
        .collect();

    rows.iter()
        .filter(|row| active.iter().all(|(condition, column)| condition.matches(row, column)))
        .collect()
}

/// Staged-versus-applied condition lists.
///
/// The editor mutates the staged list freely; nothing affects evaluation
/// until [`FilterSet::apply`]. [`FilterSet::reset`] discards staged edits,
/// [`FilterSet::clear`] empties both lists at once.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    staged: Vec<FilterCondition>,
    applied: Vec<FilterCondition>,
}

impl FilterSet {
    pub fn staged(&self) -> &[FilterCondition] {
        &self.staged
    }

    pub fn applied(&self) -> &[FilterCondition] {
        &self.applied
    }

    pub fn stage_add(&mut self, condition: FilterCondition) {
        self.staged.push(condition);
    }

    pub fn stage_remove(&mut self, id: &str) {
        self.staged.retain(|c| c.id != id);
    }

    /// Replace a staged condition in place, matched by id.
    pub fn stage_replace(&mut self, condition: FilterCondition) {
        if let Some(slot) = self.staged.iter_mut().find(|c| c.id == condition.id) {
            *slot = condition;
        }
    }

    pub fn staged_mut(&mut self, id: &str) -> Option<&mut FilterCondition> {
        self.staged.iter_mut().find(|c| c.id == id)
    }

    /// Validate every staged condition and promote the staged list to the
    /// applied list. On error nothing changes.
    pub fn apply(&mut self, columns: &[Column]) -> Result<(), ValidationError> {
        for condition in &self.staged {
            condition.validate(columns)?;
        }
        self.applied = self.staged.clone();
        Ok(())
    }

    /// Discard staged edits, back to the last applied set.
    pub fn reset(&mut self) {
        self.staged = self.applied.clone();
    }

    /// Drop every condition, staged and applied, effective immediately.
    pub fn clear(&mut self) {
        self.staged.clear();
        self.applied.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.staged != self.applied
    }
}
