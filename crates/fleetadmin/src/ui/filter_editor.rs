//! Filter editor modal.
//!
//! Edits the engine's *staged* condition list: add/remove conditions, cycle
//! a condition's column and operator, type its comparison value. Nothing
//! hits the grid until Enter applies the staged set; Esc discards staged
//! edits back to the last applied set; C clears everything immediately.
//!
//! Operator choices are re-filtered whenever a condition's column changes,
//! and a previously chosen operator that is invalid for the new column is
//! reset to the first valid one.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use tui_textarea::{Input, TextArea};

use grid_engine::{Column, FilterCondition, FilterOperator, FilterSet};

/// The result of handling a key event in the filter editor.
#[derive(Debug, PartialEq, Eq)]
pub enum FilterEditorAction {
    Continue,
    /// Apply the staged conditions.
    Apply,
    /// Close, discarding staged edits.
    Close,
    /// Drop all conditions, staged and applied, immediately.
    ClearAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConditionField {
    Column,
    Operator,
    Value,
}

impl ConditionField {
    fn next(self) -> Self {
        match self {
            ConditionField::Column => ConditionField::Operator,
            ConditionField::Operator => ConditionField::Value,
            ConditionField::Value => ConditionField::Column,
        }
    }

    fn prev(self) -> Self {
        match self {
            ConditionField::Column => ConditionField::Value,
            ConditionField::Operator => ConditionField::Column,
            ConditionField::Value => ConditionField::Operator,
        }
    }
}

pub struct FilterEditor {
    pub active: bool,
    selected: usize,
    focus: ConditionField,
    editing_value: bool,
    value_input: TextArea<'static>,
    error: Option<String>,
}

impl FilterEditor {
    pub fn new() -> Self {
        Self {
            active: false,
            selected: 0,
            focus: ConditionField::Column,
            editing_value: false,
            value_input: TextArea::default(),
            error: None,
        }
    }

    pub fn open(&mut self) {
        self.active = true;
        self.selected = 0;
        self.focus = ConditionField::Column;
        self.editing_value = false;
        self.error = None;
    }

    pub fn close(&mut self) {
        self.active = false;
        self.editing_value = false;
    }

    /// Shown inline after a failed apply.
    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        filters: &mut FilterSet,
        columns: &[Column],
    ) -> FilterEditorAction {
        if self.editing_value {
            return self.handle_value_key(key, filters);
        }

        let count = filters.staged().len();
        self.selected = self.selected.min(count.saturating_sub(1));

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => {
                self.close();
                return FilterEditorAction::Close;
            }
            (KeyCode::Char('C'), _) => {
                self.close();
                return FilterEditorAction::ClearAll;
            }
            (KeyCode::Enter, KeyModifiers::NONE) if self.focus == ConditionField::Value && count > 0 => {
                self.start_value_edit(filters);
            }
            (KeyCode::Enter, KeyModifiers::NONE) => {
                return FilterEditorAction::Apply;
            }
            (KeyCode::Char('i'), KeyModifiers::NONE) if count > 0 => {
                self.focus = ConditionField::Value;
                self.start_value_edit(filters);
            }
            (KeyCode::Char('a'), KeyModifiers::NONE) => {
                if let Some(condition) = default_condition(columns) {
                    filters.stage_add(condition);
                    self.selected = filters.staged().len() - 1;
                    self.error = None;
                }
            }
            (KeyCode::Char('x'), KeyModifiers::NONE) | (KeyCode::Delete, _) => {
                if let Some(condition) = filters.staged().get(self.selected) {
                    let id = condition.id.clone();
                    filters.stage_remove(&id);
                    self.selected = self.selected.min(filters.staged().len().saturating_sub(1));
                    self.error = None;
                }
            }
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.selected = self.selected.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if count > 0 {
                    self.selected = (self.selected + 1).min(count - 1);
                }
            }
            (KeyCode::Tab, _) => {
                self.focus = self.focus.next();
            }
            (KeyCode::BackTab, _) => {
                self.focus = self.focus.prev();
            }
            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                self.cycle_selected(filters, columns, -1);
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                self.cycle_selected(filters, columns, 1);
            }
            _ => {}
        }

        FilterEditorAction::Continue
    }

    fn handle_value_key(&mut self, key: KeyEvent, filters: &mut FilterSet) -> FilterEditorAction {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) | (KeyCode::Esc, _) => {
                let value = self.value_input.lines().join("\n");
                if let Some(condition) = self.selected_mut(filters) {
                    condition.value = value;
                }
                self.editing_value = false;
                self.error = None;
            }
            _ => {
                let input: Input = key.into();
                self.value_input.input(input);
            }
        }
        FilterEditorAction::Continue
    }

    fn start_value_edit(&mut self, filters: &mut FilterSet) {
        let current = filters
            .staged()
            .get(self.selected)
            .map(|c| c.value.clone())
            .unwrap_or_default();
        self.value_input = TextArea::new(vec![current]);
        self.value_input.move_cursor(tui_textarea::CursorMove::End);
        self.editing_value = true;
    }

    fn selected_mut<'a>(&self, filters: &'a mut FilterSet) -> Option<&'a mut FilterCondition> {
        let id = filters.staged().get(self.selected)?.id.clone();
        filters.staged_mut(&id)
    }

    /// Cycle the focused selector of the selected condition.
    fn cycle_selected(&mut self, filters: &mut FilterSet, columns: &[Column], step: isize) {
        let focus = self.focus;
        let Some(condition) = self.selected_mut(filters) else {
            return;
        };

        match focus {
            ConditionField::Column => {
                let filterable: Vec<&Column> = columns.iter().filter(|c| c.filterable).collect();
                if filterable.is_empty() {
                    return;
                }
                let current = filterable
                    .iter()
                    .position(|c| c.field == condition.field)
                    .unwrap_or(0);
                let next = cycle_index(current, filterable.len(), step);
                let column = filterable[next];
                condition.field = column.field.clone();

                // Re-gate the operator for the new column's type.
                let available = FilterOperator::available_for(column.data_type);
                if !available.contains(&condition.operator) {
                    condition.operator = available[0];
                }
            }
            ConditionField::Operator => {
                let Some(column) = grid_engine::find_column(columns, &condition.field) else {
                    return;
                };
                let available = FilterOperator::available_for(column.data_type);
                let current = available
                    .iter()
                    .position(|op| *op == condition.operator)
                    .unwrap_or(0);
                condition.operator = available[cycle_index(current, available.len(), step)];
            }
            ConditionField::Value => {}
        }
        self.error = None;
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, filters: &FilterSet, columns: &[Column]) {
        let width = (area.width * 7 / 10).clamp(30, area.width);
        let height = ((filters.staged().len() as u16) + 7).clamp(9, area.height * 7 / 10);
        let popup = Rect {
            x: (area.width.saturating_sub(width)) / 2,
            y: (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };

        let dirty = if filters.is_dirty() { " [staged]" } else { "" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Filters{dirty} "))
            .border_style(Style::default().fg(Color::Magenta));

        let mut lines: Vec<Line> = Vec::new();
        if filters.staged().is_empty() {
            lines.push(Line::from(Span::styled(
                "(no conditions - press a to add one)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (index, condition) in filters.staged().iter().enumerate() {
            let header = grid_engine::find_column(columns, &condition.field)
                .map(|c| c.header.clone())
                .unwrap_or_else(|| condition.field.clone());

            let is_selected = index == self.selected;
            let field_style = |field: ConditionField| {
                if is_selected && self.focus == field {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else if is_selected {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::Gray)
                }
            };

            let value_text = if self.editing_value && is_selected {
                format!("{}_", self.value_input.lines().join(""))
            } else if condition.operator.requires_value() {
                condition.value.clone()
            } else {
                "-".to_string()
            };

            let mut spans = vec![
                Span::raw(if is_selected { "> " } else { "  " }),
                Span::styled(format!("[{header}] "), field_style(ConditionField::Column)),
                Span::styled(
                    format!("[{}] ", condition.operator.label()),
                    field_style(ConditionField::Operator),
                ),
                Span::styled(format!("[{value_text}]"), field_style(ConditionField::Value)),
            ];
            if !condition.is_active() {
                spans.push(Span::styled(
                    "  (inactive)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(spans));
        }

        lines.push(Line::from(""));
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(Span::styled(
            "a add  x remove  Tab field  h/l change  i value  Enter apply  C clear  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

impl Default for FilterEditor {
    fn default() -> Self {
        Self::new()
    }
}

fn cycle_index(current: usize, len: usize, step: isize) -> usize {
    let len = len as isize;
    (((current as isize + step) % len + len) % len) as usize
}

/// A fresh condition on the first filterable column with its first valid
/// operator.
fn default_condition(columns: &[Column]) -> Option<FilterCondition> {
    let column = columns.iter().find(|c| c.filterable)?;
    let operator = FilterOperator::available_for(column.data_type)[0];
    Some(FilterCondition::new(column.field.clone(), operator, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_engine::DataType;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("name", "Name", DataType::String),
            Column::new("active", "Active", DataType::Boolean),
            Column::new("qty", "Qty", DataType::Number),
        ]
    }

    fn editor_with_one_condition(filters: &mut FilterSet) -> FilterEditor {
        let mut editor = FilterEditor::new();
        editor.open();
        editor.handle_key(key(KeyCode::Char('a')), filters, &columns());
        editor
    }

    #[test]
    fn test_add_uses_first_filterable_column_and_valid_operator() {
        let mut filters = FilterSet::default();
        let _editor = editor_with_one_condition(&mut filters);

        let condition = &filters.staged()[0];
        assert_eq!(condition.field, "name");
        assert!(FilterOperator::available_for(DataType::String).contains(&condition.operator));
        assert!(condition.validate(&columns()).is_ok());
    }

    #[test]
    fn test_column_change_regates_invalid_operator() {
        let mut filters = FilterSet::default();
        let mut editor = editor_with_one_condition(&mut filters);

        // Default is Contains on the string column; cycling to the boolean
        // column must reset it, since booleans do not offer Contains.
        assert_eq!(filters.staged()[0].operator, FilterOperator::Contains);
        editor.handle_key(key(KeyCode::Right), &mut filters, &columns());

        let condition = &filters.staged()[0];
        assert_eq!(condition.field, "active");
        assert_eq!(condition.operator, FilterOperator::Equals);
        assert!(condition.validate(&columns()).is_ok());
    }

    #[test]
    fn test_operator_cycling_stays_in_the_gated_set() {
        let mut filters = FilterSet::default();
        let mut editor = editor_with_one_condition(&mut filters);

        editor.handle_key(key(KeyCode::Tab), &mut filters, &columns());
        for _ in 0..20 {
            editor.handle_key(key(KeyCode::Right), &mut filters, &columns());
            let condition = &filters.staged()[0];
            assert!(condition.validate(&columns()).is_ok());
        }
    }

    #[test]
    fn test_value_editing_updates_the_staged_condition() {
        let mut filters = FilterSet::default();
        let mut editor = editor_with_one_condition(&mut filters);

        editor.handle_key(key(KeyCode::Char('i')), &mut filters, &columns());
        editor.handle_key(key(KeyCode::Char('a')), &mut filters, &columns());
        editor.handle_key(key(KeyCode::Char('b')), &mut filters, &columns());
        editor.handle_key(key(KeyCode::Enter), &mut filters, &columns());

        assert_eq!(filters.staged()[0].value, "ab");
        // Nothing applied yet.
        assert!(filters.applied().is_empty());
    }

    #[test]
    fn test_enter_requests_apply_and_esc_requests_close() {
        let mut filters = FilterSet::default();
        let mut editor = editor_with_one_condition(&mut filters);

        assert_eq!(
            editor.handle_key(key(KeyCode::Enter), &mut filters, &columns()),
            FilterEditorAction::Apply
        );
        assert_eq!(
            editor.handle_key(key(KeyCode::Esc), &mut filters, &columns()),
            FilterEditorAction::Close
        );
    }

    #[test]
    fn test_remove_clamps_selection() {
        let mut filters = FilterSet::default();
        let mut editor = editor_with_one_condition(&mut filters);
        editor.handle_key(key(KeyCode::Char('a')), &mut filters, &columns());
        assert_eq!(filters.staged().len(), 2);

        editor.handle_key(key(KeyCode::Char('x')), &mut filters, &columns());
        editor.handle_key(key(KeyCode::Char('x')), &mut filters, &columns());
        assert!(filters.staged().is_empty());

        // Removing with nothing selected is a no-op.
        editor.handle_key(key(KeyCode::Char('x')), &mut filters, &columns());
    }
}
