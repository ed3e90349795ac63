//! Row detail modal showing every field of a single record.
//!
//! Values are shown in full, unlike the grid's truncated cells. `j/k`
//! moves between fields, `e` jumps into editing the selected field, and
//! `q`/Esc closes.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use grid_engine::{Column, Row, RowId};

/// The result of handling a key event in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDetailAction {
    Continue,
    Close,
    /// Open the inline editor for this field.
    Edit { field: String },
}

pub struct RowDetailModal {
    row_id: RowId,
    /// (header, field, value, editable) per column.
    fields: Vec<(String, String, String, bool)>,
    selected: usize,
    scroll_offset: usize,
}

impl RowDetailModal {
    pub fn new(row: &Row, columns: &[Column]) -> Self {
        let fields = columns
            .iter()
            .map(|column| {
                (
                    column.header.clone(),
                    column.field.clone(),
                    column.display_value(row),
                    column.editable,
                )
            })
            .collect();
        Self {
            row_id: row.id().clone(),
            fields,
            selected: 0,
            scroll_offset: 0,
        }
    }

    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> RowDetailAction {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('q'), KeyModifiers::NONE) => RowDetailAction::Close,
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.selected = self.selected.saturating_sub(1);
                RowDetailAction::Continue
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if !self.fields.is_empty() {
                    self.selected = (self.selected + 1).min(self.fields.len() - 1);
                }
                RowDetailAction::Continue
            }
            (KeyCode::Char('e'), KeyModifiers::NONE) | (KeyCode::Enter, KeyModifiers::NONE) => {
                match self.fields.get(self.selected) {
                    Some((_, field, _, true)) => RowDetailAction::Edit { field: field.clone() },
                    _ => RowDetailAction::Continue,
                }
            }
            _ => RowDetailAction::Continue,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = (area.width * 6 / 10).clamp(30, area.width);
        let height = ((self.fields.len() as u16) + 4).clamp(8, area.height * 7 / 10);
        let popup = Rect {
            x: (area.width.saturating_sub(width)) / 2,
            y: (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };

        let visible = popup.height.saturating_sub(4) as usize;
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if visible > 0 && self.selected >= self.scroll_offset + visible {
            self.scroll_offset = self.selected - visible + 1;
        }

        let label_width = self
            .fields
            .iter()
            .map(|(header, ..)| header.len())
            .max()
            .unwrap_or(0);

        let mut lines: Vec<Line> = Vec::new();
        for (index, (header, _, value, editable)) in self
            .fields
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible.max(1))
        {
            let selected = index == self.selected;
            let label_style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            let marker = if selected { "> " } else { "  " };
            let suffix = if *editable { "" } else { " (read-only)" };

            lines.push(Line::from(vec![
                Span::raw(marker.to_string()),
                Span::styled(format!("{header:<label_width$}  "), label_style),
                Span::raw(value.clone()),
                Span::styled(suffix.to_string(), Style::default().fg(Color::DarkGray)),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "j/k move  e edit field  Esc close",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Record {} ", self.row_id))
            .border_style(Style::default().fg(Color::Cyan));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_engine::{CellValue, DataType};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn modal() -> RowDetailModal {
        let columns = vec![
            Column::new("name", "Name", DataType::String).editable(),
            Column::new("imei", "IMEI", DataType::String),
        ];
        let mut row = Row::new(RowId::new("7"));
        row.set("name", CellValue::Text("Truck".to_string()));
        row.set("imei", CellValue::Text("356938".to_string()));
        RowDetailModal::new(&row, &columns)
    }

    #[test]
    fn test_edit_only_on_editable_fields() {
        let mut modal = modal();
        assert_eq!(
            modal.handle_key(key(KeyCode::Char('e'))),
            RowDetailAction::Edit { field: "name".to_string() }
        );

        modal.handle_key(key(KeyCode::Char('j')));
        assert_eq!(modal.handle_key(key(KeyCode::Char('e'))), RowDetailAction::Continue);
    }

    #[test]
    fn test_esc_closes() {
        let mut modal = modal();
        assert_eq!(modal.handle_key(key(KeyCode::Esc)), RowDetailAction::Close);
    }
}
