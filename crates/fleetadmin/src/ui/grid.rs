//! Record grid widget: renders the engine's derived page and maps grid
//! keys to actions for the app to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use grid_engine::{Alignment, Column, GridController, Row};

use crate::config::DisplayConfig;

/// Cursor and scroll state. The cursor addresses a cell of the *current
/// page*; pagination and filtering happen in the engine.
#[derive(Default, Clone)]
pub struct GridState {
    pub row_offset: usize,
    pub col_offset: usize,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

/// What a grid key asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridAction {
    None,
    /// Enter: inline-edit the cell under the cursor.
    EditCell,
    /// n: create a new provisional row.
    CreateRow,
    /// x: delete the row under the cursor (after confirmation).
    DeleteRow,
    /// v: open the row detail modal.
    OpenDetail,
    /// f: open the filter editor.
    OpenFilter,
    /// /: open the global search prompt.
    OpenSearch,
    /// s: cycle sort on the cursor column.
    CycleSort,
    /// c: copy the cursor cell to the clipboard.
    CopyCell,
    NextPage,
    PrevPage,
    /// p: cycle through the configured page sizes.
    CyclePageSize,
    /// P: open the jump-to-page prompt.
    JumpToPage,
    /// r: reload the entity from the backend.
    Refresh,
}

impl GridState {
    pub fn handle_key(&mut self, key: KeyEvent, row_count: usize, col_count: usize) -> GridAction {
        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if row_count > 0 {
                    self.cursor_row = (self.cursor_row + 1).min(row_count - 1);
                }
            }
            (KeyCode::PageUp, _) => {
                self.cursor_row = self.cursor_row.saturating_sub(10);
            }
            (KeyCode::PageDown, _) => {
                if row_count > 0 {
                    self.cursor_row = (self.cursor_row + 10).min(row_count - 1);
                }
            }
            (KeyCode::Home, _) | (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.cursor_row = 0;
            }
            (KeyCode::End, _) | (KeyCode::Char('G'), _) => {
                if row_count > 0 {
                    self.cursor_row = row_count - 1;
                }
            }

            (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
                self.col_offset = self.col_offset.min(self.cursor_col);
            }
            (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
                if col_count > 0 {
                    self.cursor_col = (self.cursor_col + 1).min(col_count - 1);
                }
            }

            (KeyCode::Enter, KeyModifiers::NONE) => return GridAction::EditCell,
            (KeyCode::Char('n'), KeyModifiers::NONE) => return GridAction::CreateRow,
            (KeyCode::Char('x'), KeyModifiers::NONE) => return GridAction::DeleteRow,
            (KeyCode::Char('v'), KeyModifiers::NONE) => return GridAction::OpenDetail,
            (KeyCode::Char('f'), KeyModifiers::NONE) => return GridAction::OpenFilter,
            (KeyCode::Char('/'), KeyModifiers::NONE) => return GridAction::OpenSearch,
            (KeyCode::Char('s'), KeyModifiers::NONE) => return GridAction::CycleSort,
            (KeyCode::Char('c'), KeyModifiers::NONE) => return GridAction::CopyCell,
            (KeyCode::Char(']'), KeyModifiers::NONE) => return GridAction::NextPage,
            (KeyCode::Char('['), KeyModifiers::NONE) => return GridAction::PrevPage,
            (KeyCode::Char('p'), KeyModifiers::NONE) => return GridAction::CyclePageSize,
            (KeyCode::Char('P'), KeyModifiers::SHIFT) | (KeyCode::Char('P'), KeyModifiers::NONE) => {
                return GridAction::JumpToPage
            }
            (KeyCode::Char('r'), KeyModifiers::NONE) => return GridAction::Refresh,

            _ => {}
        }
        GridAction::None
    }

    /// Keep the cursor inside the current page, e.g. after a page flip or a
    /// delete shrank the row set.
    pub fn clamp_cursor(&mut self, row_count: usize, col_count: usize) {
        self.cursor_row = self.cursor_row.min(row_count.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(col_count.saturating_sub(1));
        self.col_offset = self.col_offset.min(self.cursor_col);
    }

    /// Jump back to the top of the page (after page navigation).
    pub fn reset_rows(&mut self) {
        self.cursor_row = 0;
        self.row_offset = 0;
    }

    pub fn ensure_cursor_visible(&mut self, viewport_rows: usize, row_count: usize) {
        if viewport_rows == 0 || row_count == 0 {
            self.row_offset = 0;
            self.cursor_row = 0;
            return;
        }

        self.cursor_row = self.cursor_row.min(row_count - 1);

        if self.cursor_row < self.row_offset {
            self.row_offset = self.cursor_row;
        }

        let last_visible = self.row_offset + viewport_rows - 1;
        if self.cursor_row > last_visible {
            self.row_offset = self.cursor_row.saturating_sub(viewport_rows - 1);
        }

        self.row_offset = self.row_offset.min(row_count.saturating_sub(1));
    }
}

pub struct DataGrid<'a> {
    pub grid: &'a GridController,
    pub state: &'a GridState,
    pub display: &'a DisplayConfig,
    pub focused: bool,
}

impl Widget for DataGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.grid.view();
        let columns = self.grid.columns();

        let title = format!(
            " {} of {} rows (Enter edit, n new, x delete, f filter, / search, s sort) ",
            view.rows.len(),
            view.total_rows
        );

        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if columns.is_empty() {
            Paragraph::new("No columns")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        // Reserve one line for the header.
        if inner.height < 2 {
            Paragraph::new("Window too small")
                .style(Style::default().fg(Color::Gray))
                .render(inner, buf);
            return;
        }

        let header_area = Rect { height: 1, ..inner };
        let body_area = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };

        let headers = header_cells(columns, self.grid);
        let cells: Vec<Vec<String>> = view
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| cell_text(column, row, self.display))
                    .collect()
            })
            .collect();
        let widths = compute_column_widths(&headers, &cells, self.display);

        // Marker column stays fixed; horizontal scroll applies to data.
        let marker_w: u16 = 3;
        let data_x = header_area.x.saturating_add(marker_w);
        let data_w = header_area.width.saturating_sub(marker_w);

        let mut state = self.state.clone();
        state.clamp_cursor(view.rows.len(), columns.len());
        state.ensure_cursor_visible(body_area.height as usize, view.rows.len());

        render_cells(
            data_x,
            header_area.y,
            data_w,
            &headers,
            &widths,
            columns,
            state.col_offset,
            None,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            buf,
        );

        if view.rows.is_empty() {
            Paragraph::new("(no rows)")
                .style(Style::default().fg(Color::Gray))
                .render(body_area, buf);
            return;
        }

        for i in 0..(body_area.height as usize) {
            let row_idx = state.row_offset + i;
            if row_idx >= view.rows.len() {
                break;
            }
            let y = body_area.y + i as u16;
            let row = view.rows[row_idx];
            let is_cursor = row_idx == state.cursor_row;

            let style = row_style(row, self.grid, is_cursor);
            render_marker(body_area.x, y, marker_w, row, self.grid, is_cursor, style, buf);
            render_cells(
                data_x,
                y,
                data_w,
                &cells[row_idx],
                &widths,
                columns,
                state.col_offset,
                if is_cursor && self.focused {
                    Some(state.cursor_col)
                } else {
                    None
                },
                style,
                buf,
            );
        }
    }
}

fn header_cells(columns: &[Column], grid: &GridController) -> Vec<String> {
    let sort = grid.sort_state();
    columns
        .iter()
        .map(|column| {
            if sort.field.as_deref() == Some(column.field.as_str()) {
                format!("{} {}", column.header, sort.direction.indicator())
            } else {
                column.header.clone()
            }
        })
        .collect()
}

fn cell_text(column: &Column, row: &Row, display: &DisplayConfig) -> String {
    let text = column.display_value(row);
    if text.is_empty() && row.get(&column.field).is_null() {
        display.null_indicator.clone()
    } else {
        text
    }
}

fn row_style(row: &Row, grid: &GridController, is_cursor: bool) -> Style {
    let mut style = if is_cursor {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    if row.is_new {
        style = style.fg(Color::Green);
    } else if grid.is_locked(row.id()) {
        style = style.fg(Color::Yellow);
    }
    style
}

fn render_marker(
    x: u16,
    y: u16,
    marker_w: u16,
    row: &Row,
    grid: &GridController,
    is_cursor: bool,
    style: Style,
    buf: &mut Buffer,
) {
    let cursor_ch = if is_cursor { '>' } else { ' ' };
    let flag_ch = if grid.is_locked(row.id()) {
        '*'
    } else if row.is_new {
        '+'
    } else if row.is_editing {
        '~'
    } else {
        ' '
    };

    let s = fit_to_width(&format!("{cursor_ch}{flag_ch} "), marker_w, Alignment::Left);
    buf.set_string(x, y, s, style);
}

#[allow(clippy::too_many_arguments)]
fn render_cells(
    mut x: u16,
    y: u16,
    available_w: u16,
    cells: &[String],
    col_widths: &[u16],
    columns: &[Column],
    col_offset: usize,
    highlight_col: Option<usize>,
    style: Style,
    buf: &mut Buffer,
) {
    if available_w == 0 {
        return;
    }

    let padding: u16 = 1;
    let max_x = x.saturating_add(available_w);

    let mut col = col_offset;
    while col < cells.len() && col < col_widths.len() && x < max_x {
        let w = col_widths[col];
        if w == 0 {
            col += 1;
            continue;
        }

        let remaining = max_x - x;
        if remaining == 0 {
            break;
        }

        // Allow a partially visible last column.
        let draw_w = w.min(remaining);
        let alignment = columns.get(col).map(|c| c.alignment).unwrap_or_default();
        let content = fit_to_width(&cells[col], draw_w, alignment);

        let cell_style = if highlight_col == Some(col) {
            style.add_modifier(Modifier::REVERSED)
        } else {
            style
        };
        buf.set_string(x, y, content, cell_style);
        x += draw_w;

        if x < max_x {
            buf.set_string(x, y, " ", style);
            x = x.saturating_add(padding).min(max_x);
        }

        col += 1;
    }

    while x < max_x {
        buf.set_string(x, y, " ", style);
        x += 1;
    }
}

fn compute_column_widths(headers: &[String], rows: &[Vec<String>], display: &DisplayConfig) -> Vec<u16> {
    let min_w = display.min_column_width.max(1);
    let max_w = display.max_column_width.max(min_w);

    let mut widths: Vec<u16> = headers
        .iter()
        .map(|h| (display_width(h) as u16).clamp(min_w, max_w))
        .collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i >= widths.len() {
                break;
            }
            let w = (display_width(cell) as u16).clamp(min_w, max_w);
            widths[i] = widths[i].max(w);
        }
    }

    widths
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn fit_to_width(s: &str, width: u16, alignment: Alignment) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }

    let current = display_width(s);
    if current == width {
        return s.to_string();
    }

    if current < width {
        let pad = " ".repeat(width - current);
        return match alignment {
            Alignment::Left => format!("{s}{pad}"),
            Alignment::Right => format!("{pad}{s}"),
            Alignment::Center => {
                let left = (width - current) / 2;
                let right = width - current - left;
                format!("{}{s}{}", " ".repeat(left), " ".repeat(right))
            }
        };
    }

    // Truncate, keeping an ASCII-only ellipsis.
    if width <= 3 {
        return truncate_by_display_width(s, width);
    }

    let prefix_w = width.saturating_sub(3);
    let mut out = truncate_by_display_width(s, prefix_w);
    out.push_str("...");
    truncate_by_display_width(&out, width)
}

fn truncate_by_display_width(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;

    for ch in s.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
        if used == width {
            break;
        }
    }

    let out_w = display_width(&out);
    if out_w < width {
        out.push_str(&" ".repeat(width - out_w));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut state = GridState::default();
        state.handle_key(key(KeyCode::Up), 5, 3);
        assert_eq!(state.cursor_row, 0);

        for _ in 0..10 {
            state.handle_key(key(KeyCode::Down), 5, 3);
        }
        assert_eq!(state.cursor_row, 4);

        for _ in 0..10 {
            state.handle_key(key(KeyCode::Right), 5, 3);
        }
        assert_eq!(state.cursor_col, 2);
    }

    #[test]
    fn test_keys_map_to_actions() {
        let mut state = GridState::default();
        assert_eq!(state.handle_key(key(KeyCode::Enter), 1, 1), GridAction::EditCell);
        assert_eq!(state.handle_key(key(KeyCode::Char('n')), 1, 1), GridAction::CreateRow);
        assert_eq!(state.handle_key(key(KeyCode::Char('x')), 1, 1), GridAction::DeleteRow);
        assert_eq!(state.handle_key(key(KeyCode::Char('f')), 1, 1), GridAction::OpenFilter);
        assert_eq!(state.handle_key(key(KeyCode::Char('/')), 1, 1), GridAction::OpenSearch);
        assert_eq!(state.handle_key(key(KeyCode::Char(']')), 1, 1), GridAction::NextPage);
        assert_eq!(state.handle_key(key(KeyCode::Char('q')), 1, 1), GridAction::None);
    }

    #[test]
    fn test_clamp_cursor_after_shrink() {
        let mut state = GridState {
            cursor_row: 9,
            cursor_col: 4,
            ..GridState::default()
        };
        state.clamp_cursor(3, 2);
        assert_eq!(state.cursor_row, 2);
        assert_eq!(state.cursor_col, 1);
    }

    #[test]
    fn test_fit_to_width_alignment() {
        assert_eq!(fit_to_width("ab", 4, Alignment::Left), "ab  ");
        assert_eq!(fit_to_width("ab", 4, Alignment::Right), "  ab");
        assert_eq!(fit_to_width("abcdefgh", 5, Alignment::Left), "ab...");
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let display = DisplayConfig {
            min_column_width: 4,
            max_column_width: 10,
            ..DisplayConfig::default()
        };
        let headers = vec!["h".to_string(), "a rather long header".to_string()];
        let rows = vec![vec!["cell".to_string(), "x".to_string()]];
        let widths = compute_column_widths(&headers, &rows, &display);
        assert_eq!(widths, vec![4, 10]);
    }
}
