//! Pagination bar under the grid.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use grid_engine::{GridView, PAGE_SIZE_ALL};

/// The next entry in the configured page-size cycle.
pub fn next_page_size(options: &[usize], current: usize) -> usize {
    if options.is_empty() {
        return current;
    }
    match options.iter().position(|&size| size == current) {
        Some(index) => options[(index + 1) % options.len()],
        None => options[0],
    }
}

pub fn page_size_label(size: usize) -> String {
    if size == PAGE_SIZE_ALL {
        "all".to_string()
    } else {
        size.to_string()
    }
}

/// One-line pager summary for the current view.
pub fn pager_line(view: &GridView<'_>) -> Line<'static> {
    let page = view.page;
    Line::from(vec![
        Span::styled(
            format!(" Page {}/{} ", page.current_page(), view.total_pages),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("| {} rows | size {} ", view.total_rows, page_size_label(page.page_size())),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            "([ prev, ] next, p size, P jump)",
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_walks_the_options_and_wraps() {
        let options = [10, 25, 50, 0];
        assert_eq!(next_page_size(&options, 10), 25);
        assert_eq!(next_page_size(&options, 50), 0);
        assert_eq!(next_page_size(&options, 0), 10);
    }

    #[test]
    fn test_cycle_recovers_from_unlisted_size() {
        assert_eq!(next_page_size(&[10, 25], 33), 10);
        assert_eq!(next_page_size(&[], 33), 33);
    }

    #[test]
    fn test_page_size_label() {
        assert_eq!(page_size_label(25), "25");
        assert_eq!(page_size_label(PAGE_SIZE_ALL), "all");
    }
}
