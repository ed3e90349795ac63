//! Single-line input prompts rendered as bottom overlays (search,
//! jump-to-page).

use ratatui::style::{Modifier, Style};
use tui_textarea::TextArea;

pub struct InputPrompt {
    pub active: bool,
    pub textarea: TextArea<'static>,
}

impl InputPrompt {
    pub fn new() -> Self {
        Self {
            active: false,
            textarea: make_textarea(""),
        }
    }

    /// Open with the given prefill; the cursor lands at the end.
    pub fn open(&mut self, prefill: &str) {
        self.active = true;
        self.textarea = make_textarea(prefill);
    }

    pub fn close(&mut self) {
        self.active = false;
    }

    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }
}

impl Default for InputPrompt {
    fn default() -> Self {
        Self::new()
    }
}

fn make_textarea(prefill: &str) -> TextArea<'static> {
    let mut textarea = TextArea::new(vec![prefill.to_string()]);
    textarea.set_cursor_line_style(Style::default().add_modifier(Modifier::UNDERLINED));
    textarea.move_cursor(tui_textarea::CursorMove::End);
    textarea
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_prefills_and_close_keeps_text() {
        let mut prompt = InputPrompt::new();
        assert!(!prompt.active);

        prompt.open("25");
        assert!(prompt.active);
        assert_eq!(prompt.text(), "25");

        prompt.close();
        assert!(!prompt.active);
    }
}
