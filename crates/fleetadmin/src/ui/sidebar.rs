//! Entity sidebar: a small tree of record types grouped by area.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use tui_tree_widget::{Tree, TreeItem, TreeState};

use crate::schema::EntityKind;

/// Actions that can result from sidebar interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarAction {
    None,
    /// Load and show this entity's grid.
    Select(EntityKind),
    /// Move focus back to the grid.
    FocusGrid,
}

pub struct Sidebar {
    state: TreeState<String>,
    items: Vec<TreeItem<'static, String>>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self {
            state: TreeState::default(),
            items: build_items(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SidebarAction {
        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.state.key_up();
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                self.state.key_down();
            }
            (KeyCode::Char(' '), KeyModifiers::NONE) => {
                self.state.toggle_selected();
            }
            (KeyCode::Enter, KeyModifiers::NONE) => {
                // Leaf identifiers are entity paths; branch identifiers are
                // category names, which just toggle.
                if let Some(entity) = self
                    .state
                    .selected()
                    .last()
                    .and_then(|id| EntityKind::by_path(id))
                {
                    return SidebarAction::Select(entity);
                }
                self.state.toggle_selected();
            }
            (KeyCode::Tab, _) | (KeyCode::Esc, _) => return SidebarAction::FocusGrid,
            _ => {}
        }
        SidebarAction::None
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, current: EntityKind, focused: bool) {
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Entities [{}] ", current.title()))
            .border_style(border_style);

        let highlight_style = if focused {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let tree = Tree::new(&self.items)
            .expect("entity identifiers are unique")
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("> ");

        frame.render_stateful_widget(tree, area, &mut self.state);
    }

    /// Expand every category so all entities are reachable on first use.
    pub fn expand_all(&mut self) {
        for item in &self.items {
            self.state.open(vec![item.identifier().clone()]);
        }
        self.state.select_first();
    }
}

impl Default for Sidebar {
    fn default() -> Self {
        Self::new()
    }
}

fn build_items() -> Vec<TreeItem<'static, String>> {
    let mut categories: Vec<&'static str> = Vec::new();
    for entity in EntityKind::ALL {
        if !categories.contains(&entity.category()) {
            categories.push(entity.category());
        }
    }

    categories
        .into_iter()
        .map(|category| {
            let children: Vec<TreeItem<'static, String>> = EntityKind::ALL
                .iter()
                .filter(|e| e.category() == category)
                .map(|e| TreeItem::new_leaf(e.path().to_string(), e.title()))
                .collect();
            TreeItem::new(category.to_string(), category, children)
                .expect("entity identifiers are unique")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_covers_every_entity() {
        let items = build_items();
        let leaf_count: usize = items.iter().map(|i| i.children().len()).sum();
        assert_eq!(leaf_count, EntityKind::ALL.len());
    }

    #[test]
    fn test_tab_returns_focus() {
        let mut sidebar = Sidebar::new();
        let action = sidebar.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(action, SidebarAction::FocusGrid);
    }
}
