//! Centered y/n confirmation prompt, used before destructive actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use grid_engine::RowId;

/// Result of handling input in the confirmation prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Pending,
    Confirmed(RowId),
    Cancelled,
}

pub struct ConfirmPrompt {
    pub active: bool,
    message: String,
    row_id: Option<RowId>,
}

impl ConfirmPrompt {
    pub fn new() -> Self {
        Self {
            active: false,
            message: String::new(),
            row_id: None,
        }
    }

    pub fn open(&mut self, message: String, row_id: RowId) {
        self.message = message;
        self.row_id = Some(row_id);
        self.active = true;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ConfirmAction {
        match (key.code, key.modifiers) {
            (KeyCode::Char('y'), KeyModifiers::NONE)
            | (KeyCode::Char('Y'), _)
            | (KeyCode::Enter, KeyModifiers::NONE) => {
                self.active = false;
                match self.row_id.take() {
                    Some(id) => ConfirmAction::Confirmed(id),
                    None => ConfirmAction::Cancelled,
                }
            }
            (KeyCode::Char('n'), KeyModifiers::NONE)
            | (KeyCode::Char('N'), _)
            | (KeyCode::Esc, _) => {
                self.active = false;
                self.row_id = None;
                ConfirmAction::Cancelled
            }
            _ => ConfirmAction::Pending,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = (self.message.len() as u16 + 6).clamp(24, area.width);
        let popup = Rect {
            x: (area.width.saturating_sub(width)) / 2,
            y: (area.height.saturating_sub(5)) / 2,
            width,
            height: 5.min(area.height),
        };

        let lines = vec![
            Line::from(self.message.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "y confirm   n cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .border_style(Style::default().fg(Color::Yellow));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

impl Default for ConfirmPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_yes_confirms_with_the_row_id() {
        let mut prompt = ConfirmPrompt::new();
        prompt.open("Delete vehicle KA-4821?".to_string(), RowId::new("1"));

        assert_eq!(prompt.handle_key(key(KeyCode::Char('y'))), ConfirmAction::Confirmed(RowId::new("1")));
        assert!(!prompt.active);
    }

    #[test]
    fn test_no_and_esc_cancel() {
        let mut prompt = ConfirmPrompt::new();
        prompt.open("Delete?".to_string(), RowId::new("1"));
        assert_eq!(prompt.handle_key(key(KeyCode::Char('n'))), ConfirmAction::Cancelled);

        prompt.open("Delete?".to_string(), RowId::new("2"));
        assert_eq!(prompt.handle_key(key(KeyCode::Esc)), ConfirmAction::Cancelled);
    }

    #[test]
    fn test_other_keys_stay_pending() {
        let mut prompt = ConfirmPrompt::new();
        prompt.open("Delete?".to_string(), RowId::new("1"));
        assert_eq!(prompt.handle_key(key(KeyCode::Char('z'))), ConfirmAction::Pending);
        assert!(prompt.active);
    }
}
