//! Help popup listing the key bindings.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

pub fn help_popup() -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(vec![Span::styled("fleetadmin - fleet management console", bold)]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Global", bold),
            Span::raw(":  "),
            Span::raw("Tab sidebar/grid, r reload, ? help, q quit, Esc close/dismiss"),
        ]),
        Line::from(vec![
            Span::styled("Grid", bold),
            Span::raw(":    "),
            Span::raw("j/k move, h/l columns, g/G top/bottom, Enter edit cell, v detail"),
        ]),
        Line::from(vec![
            Span::raw("         "),
            Span::raw("n new row, x delete row, c copy cell, s sort column"),
        ]),
        Line::from(vec![
            Span::styled("Filter", bold),
            Span::raw(":  "),
            Span::raw("f editor; a add, x remove, Tab field, h/l change, i value"),
        ]),
        Line::from(vec![
            Span::raw("         "),
            Span::raw("Enter apply staged set, Esc discard staged edits, C clear all"),
        ]),
        Line::from(vec![
            Span::styled("Search", bold),
            Span::raw(":  "),
            Span::raw("/ global text search across all columns (Enter apply, Esc cancel)"),
        ]),
        Line::from(vec![
            Span::styled("Pages", bold),
            Span::raw(":   "),
            Span::raw("[ prev, ] next, p cycle page size (incl. all), P jump to page"),
        ]),
        Line::from(vec![
            Span::styled("Editing", bold),
            Span::raw(": "),
            Span::raw("Enter saves (optimistic, rolls back on failure), Esc discards"),
        ]),
    ];

    Paragraph::new(lines)
        .block(Block::default().title(" Help ").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
}
