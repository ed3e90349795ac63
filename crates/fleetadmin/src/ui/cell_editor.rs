//! Inline cell editor prompt.
//!
//! Drives the engine's per-cell edit state machine with a one-line text
//! input rendered as a bottom overlay. Enter commits the draft to the save
//! path, Esc aborts and the pre-edit value stays on screen. A commit the
//! engine rejects (e.g. "12x" into a number column) keeps the prompt open
//! with the validation message.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear};
use ratatui::Frame;
use tui_textarea::{Input, TextArea};

use grid_engine::{CellEditor, EditEvent, RowId};

/// The result of handling a key in the cell editor.
pub enum CellEditAction {
    Continue,
    /// Hand the draft to the save path.
    Commit {
        row_id: RowId,
        field: String,
        value: String,
    },
    /// Draft discarded; no network call.
    Cancel { row_id: RowId },
}

pub struct CellEditPrompt {
    pub active: bool,
    editor: CellEditor,
    textarea: TextArea<'static>,
    header: String,
    error: Option<String>,
}

impl CellEditPrompt {
    pub fn new() -> Self {
        Self {
            active: false,
            editor: CellEditor::new(),
            textarea: TextArea::default(),
            header: String::new(),
            error: None,
        }
    }

    pub fn open(&mut self, row_id: RowId, field: &str, header: &str, current: &str) {
        self.editor.begin(row_id, field, current);
        self.textarea = TextArea::new(vec![current.to_string()]);
        self.textarea.move_cursor(tui_textarea::CursorMove::End);
        self.header = header.to_string();
        self.error = None;
        self.active = true;
    }

    pub fn close(&mut self) {
        self.active = false;
        self.error = None;
    }

    /// Keep the prompt open and show why the commit was rejected. The
    /// draft is restored into the engine session so the user can fix it.
    pub fn reject(&mut self, row_id: RowId, field: &str, message: String) {
        let draft = self.text();
        self.editor.begin(row_id, field, draft);
        self.error = Some(message);
        self.active = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.is_dirty()
    }

    fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> CellEditAction {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, KeyModifiers::NONE) => match self.editor.commit() {
                EditEvent::Commit { row_id, field, value } => {
                    self.active = false;
                    CellEditAction::Commit { row_id, field, value }
                }
                _ => CellEditAction::Continue,
            },
            (KeyCode::Esc, _) => match self.editor.abort() {
                EditEvent::Abort { row_id, .. } => {
                    self.active = false;
                    CellEditAction::Cancel { row_id }
                }
                _ => CellEditAction::Continue,
            },
            _ => {
                let input: Input = key.into();
                self.textarea.input(input);
                // Keystrokes mutate the draft only; the engine session
                // mirrors the input's content.
                self.editor.set_draft(self.text());
                self.error = None;
                CellEditAction::Continue
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let h = 3u16.min(area.height);
        let y = area.height.saturating_sub(h);
        let overlay = Rect {
            x: 0,
            y,
            width: area.width,
            height: h,
        };

        let (title, border) = match &self.error {
            Some(error) => (
                format!(" Edit {}: {} ", self.header, error),
                Style::default().fg(Color::Red),
            ),
            None => {
                let dirty = if self.is_dirty() { " [modified]" } else { "" };
                (
                    format!(" Edit {}{} (Enter save, Esc cancel) ", self.header, dirty),
                    Style::default().fg(Color::Green),
                )
            }
        };

        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border),
        );

        frame.render_widget(Clear, overlay);
        frame.render_widget(&self.textarea, overlay);
    }
}

impl Default for CellEditPrompt {
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
    fn test_enter_commits_the_typed_draft() {
        let mut prompt = CellEditPrompt::new();
        prompt.open(RowId::new("1"), "name", "Name", "old");
        prompt.handle_key(key(KeyCode::Char('!')));

        match prompt.handle_key(key(KeyCode::Enter)) {
            CellEditAction::Commit { row_id, field, value } => {
                assert_eq!(row_id, RowId::new("1"));
                assert_eq!(field, "name");
                assert_eq!(value, "old!");
            }
            _ => panic!("expected commit"),
        }
        assert!(!prompt.active);
    }

    #[test]
    fn test_esc_aborts_without_commit() {
        let mut prompt = CellEditPrompt::new();
        prompt.open(RowId::new("1"), "name", "Name", "old");
        prompt.handle_key(key(KeyCode::Char('x')));

        match prompt.handle_key(key(KeyCode::Esc)) {
            CellEditAction::Cancel { row_id } => assert_eq!(row_id, RowId::new("1")),
            _ => panic!("expected cancel"),
        }
        assert!(!prompt.active);
    }

    #[test]
    fn test_reject_reopens_with_draft() {
        let mut prompt = CellEditPrompt::new();
        prompt.open(RowId::new("1"), "qty", "Qty", "5");
        prompt.handle_key(key(KeyCode::Char('x')));
        let _ = prompt.handle_key(key(KeyCode::Enter));
        assert!(!prompt.active);

        prompt.reject(RowId::new("1"), "qty", "\"5x\" is not a valid number".to_string());
        assert!(prompt.active);
        // The draft survives so the user can fix it.
        assert_eq!(prompt.text(), "5x");
    }
}
