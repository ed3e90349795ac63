use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Terminal;
use serde_json::Value as JsonValue;
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tui_textarea::Input;

use grid_engine::{
    MutationError, MutationId, MutationOp, MutationRequest, MutationSuccess, Row, RowId,
};

use super::state::{Focus, StoreStatus};
use crate::config::Config;
use crate::schema::EntityKind;
use crate::service::RecordStore;
use crate::ui::{
    help_popup, next_page_size, pager_line, CellEditAction, CellEditPrompt, ConfirmAction,
    ConfirmPrompt, DataGrid, FilterEditor, FilterEditorAction, GridAction, GridState, InputPrompt,
    RowDetailAction, RowDetailModal, Sidebar, SidebarAction,
};
use crate::util::format_store_error;

/// Events reported back from spawned store calls, drained every frame.
pub enum StoreEvent {
    Loaded {
        entity: EntityKind,
        records: Vec<JsonValue>,
    },
    LoadFailed {
        entity: EntityKind,
        error: MutationError,
    },
    Settled {
        entity: EntityKind,
        mutation: MutationId,
        outcome: Result<MutationSuccess, MutationError>,
    },
}

pub struct App {
    pub focus: Focus,
    pub entity: EntityKind,

    pub grid: grid_engine::GridController,
    pub grid_state: GridState,

    store: Arc<dyn RecordStore>,
    pub store_status: StoreStatus,
    config: Config,

    rt: tokio::runtime::Handle,
    events_tx: mpsc::UnboundedSender<StoreEvent>,
    events_rx: mpsc::UnboundedReceiver<StoreEvent>,

    sidebar: Sidebar,
    filter_editor: FilterEditor,
    cell_edit: CellEditPrompt,
    search: InputPrompt,
    page_jump: InputPrompt,
    confirm: ConfirmPrompt,
    row_detail: Option<RowDetailModal>,
    throbber: ThrobberState,

    show_help: bool,
    pub last_status: Option<String>,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(
        store: Arc<dyn RecordStore>,
        entity: EntityKind,
        config: Config,
        rt: tokio::runtime::Handle,
        events_tx: mpsc::UnboundedSender<StoreEvent>,
        events_rx: mpsc::UnboundedReceiver<StoreEvent>,
    ) -> Self {
        let grid = grid_engine::GridController::new(entity.columns(), config.display.page_size);
        let mut sidebar = Sidebar::new();
        sidebar.expand_all();

        let mut app = Self {
            focus: Focus::Grid,
            entity,
            grid,
            grid_state: GridState::default(),
            store,
            store_status: StoreStatus::Idle,
            config,
            rt,
            events_tx,
            events_rx,
            sidebar,
            filter_editor: FilterEditor::new(),
            cell_edit: CellEditPrompt::new(),
            search: InputPrompt::new(),
            page_jump: InputPrompt::new(),
            confirm: ConfirmPrompt::new(),
            row_detail: None,
            throbber: ThrobberState::default(),
            show_help: false,
            last_status: None,
            last_error: None,
        };
        app.start_load();
        app
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.drain_store_events();
            self.throbber.calc_next();

            terminal.draw(|frame| {
                let size = frame.area();

                let outer = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Length(24), Constraint::Min(20)])
                    .split(size);

                self.sidebar
                    .render(frame, outer[0], self.entity, self.focus == Focus::Sidebar);

                let error_height = if self.last_error.is_some() { 4u16 } else { 0u16 };
                let main = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(error_height),
                        Constraint::Min(3),
                        Constraint::Length(1),
                        Constraint::Length(1),
                    ])
                    .split(outer[1]);

                let error_area = main[0];
                let grid_area = main[1];
                let pager_area = main[2];
                let status_area = main[3];

                if let Some(ref error) = self.last_error {
                    let error_block = Block::default()
                        .borders(Borders::ALL)
                        .title(" Error (Enter to dismiss) ")
                        .border_style(Style::default().fg(Color::Red));
                    let error_text = Paragraph::new(error.as_str())
                        .block(error_block)
                        .style(Style::default().fg(Color::Red))
                        .wrap(ratatui::widgets::Wrap { trim: false });
                    frame.render_widget(error_text, error_area);
                }

                let grid_widget = DataGrid {
                    grid: &self.grid,
                    state: &self.grid_state,
                    display: &self.config.display,
                    focused: self.focus == Focus::Grid,
                };
                frame.render_widget(grid_widget, grid_area);

                frame.render_widget(Paragraph::new(pager_line(&self.grid.view())), pager_area);

                // Status line, with a spinner while the store is busy.
                let busy = self.store_status == StoreStatus::Loading || self.grid.pending_count() > 0;
                let text_area = if busy && status_area.width > 2 {
                    let spinner = Throbber::default().style(Style::default().fg(Color::Yellow));
                    let spinner_area = Rect { width: 2, ..status_area };
                    frame.render_stateful_widget(spinner, spinner_area, &mut self.throbber);
                    Rect {
                        x: status_area.x + 2,
                        width: status_area.width - 2,
                        ..status_area
                    }
                } else {
                    status_area
                };
                frame.render_widget(self.status_line(), text_area);

                if self.show_help {
                    let popup = centered_rect(80, 70, size);
                    frame.render_widget(Clear, popup);
                    frame.render_widget(help_popup(), popup);
                }

                if let Some(detail) = self.row_detail.as_mut() {
                    detail.render(frame, size);
                }

                if self.filter_editor.active {
                    let columns = self.grid.columns().to_vec();
                    self.filter_editor.render(frame, size, &self.grid.filters, &columns);
                }

                if self.confirm.active {
                    self.confirm.render(frame, size);
                }

                if self.cell_edit.active {
                    self.cell_edit.render(frame, size);
                }

                if self.search.active {
                    render_prompt(frame, size, &mut self.search, " / Search records (Enter apply, Esc cancel) ");
                }

                if self.page_jump.active {
                    render_prompt(frame, size, &mut self.page_jump, " Go to page (Enter, Esc) ");
                }
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.on_key(key) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) -> bool {
        // Overlays first, in stacking order.
        if self.confirm.active {
            if let ConfirmAction::Confirmed(row_id) = self.confirm.handle_key(key) {
                match self.grid.begin_delete(&row_id) {
                    Ok(request) => {
                        self.last_status = Some("Deleting...".to_string());
                        self.dispatch(request);
                    }
                    Err(error) => self.last_error = Some(error.to_string()),
                }
            }
            return false;
        }

        if self.cell_edit.active {
            match self.cell_edit.handle_key(key) {
                CellEditAction::Commit { row_id, field, value } => {
                    self.grid.set_editing(&row_id, false);
                    match self.grid.begin_update(&row_id, &field, &value) {
                        Ok(request) => {
                            self.last_status = Some("Saving...".to_string());
                            self.dispatch(request);
                        }
                        Err(grid_engine::EditError::BadValue(parse)) => {
                            // Keep the draft so the user can fix it.
                            self.grid.set_editing(&row_id, true);
                            self.cell_edit.reject(row_id, &field, parse.to_string());
                        }
                        Err(error) => self.last_error = Some(error.to_string()),
                    }
                }
                CellEditAction::Cancel { row_id } => {
                    self.grid.set_editing(&row_id, false);
                    self.last_status = Some("Edit cancelled".to_string());
                }
                CellEditAction::Continue => {}
            }
            return false;
        }

        if self.filter_editor.active {
            let columns = self.grid.columns().to_vec();
            match self.filter_editor.handle_key(key, &mut self.grid.filters, &columns) {
                FilterEditorAction::Apply => match self.grid.apply_filters() {
                    Ok(()) => {
                        self.filter_editor.close();
                        self.grid_state.reset_rows();
                        self.last_status = Some(format!("{} rows match", self.grid.view().total_rows));
                    }
                    Err(error) => self.filter_editor.set_error(error.to_string()),
                },
                FilterEditorAction::Close => {
                    self.grid.reset_filters();
                }
                FilterEditorAction::ClearAll => {
                    self.grid.clear_filters();
                    self.grid_state.reset_rows();
                    self.last_status = Some("Filters cleared".to_string());
                }
                FilterEditorAction::Continue => {}
            }
            return false;
        }

        if self.search.active {
            match (key.code, key.modifiers) {
                (KeyCode::Enter, KeyModifiers::NONE) => {
                    let term = self.search.text().trim().to_string();
                    self.search.close();
                    self.grid_state.reset_rows();
                    if term.is_empty() {
                        self.grid.set_search("");
                        self.last_status = Some("Search cleared".to_string());
                    } else {
                        self.grid.set_search(term.clone());
                        self.last_status =
                            Some(format!("Search: /{} ({} rows)", term, self.grid.view().total_rows));
                    }
                }
                (KeyCode::Esc, _) => self.search.close(),
                _ => {
                    let input: Input = key.into();
                    self.search.textarea.input(input);
                }
            }
            return false;
        }

        if self.page_jump.active {
            match (key.code, key.modifiers) {
                (KeyCode::Enter, KeyModifiers::NONE) => {
                    let input = self.page_jump.text();
                    self.page_jump.close();
                    match self.grid.jump_to_page(&input) {
                        Ok(()) => self.grid_state.reset_rows(),
                        // Rejected: the pager keeps showing the unchanged
                        // current page.
                        Err(rejected) => self.last_status = Some(rejected.to_string()),
                    }
                }
                (KeyCode::Esc, _) => self.page_jump.close(),
                _ => {
                    let input: Input = key.into();
                    self.page_jump.textarea.input(input);
                }
            }
            return false;
        }

        if let Some(detail) = self.row_detail.as_mut() {
            match detail.handle_key(key) {
                RowDetailAction::Close => self.row_detail = None,
                RowDetailAction::Edit { field } => {
                    let row_id = detail.row_id().clone();
                    self.row_detail = None;
                    self.open_cell_editor(row_id, &field);
                }
                RowDetailAction::Continue => {}
            }
            return false;
        }

        // Esc: close help, dismiss errors.
        if key.code == KeyCode::Esc && key.modifiers == KeyModifiers::NONE {
            self.show_help = false;
            self.last_error = None;
            return false;
        }

        // If an error is showing, Enter dismisses it and other keys are
        // absorbed.
        if self.last_error.is_some() {
            if key.code == KeyCode::Enter && key.modifiers == KeyModifiers::NONE {
                self.last_error = None;
            }
            return false;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
            (KeyCode::Char('?'), _) => {
                self.show_help = !self.show_help;
                return false;
            }
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Grid,
                    Focus::Grid => Focus::Sidebar,
                };
                return false;
            }
            _ => {}
        }

        if self.show_help {
            return false;
        }

        match self.focus {
            Focus::Sidebar => match self.sidebar.handle_key(key) {
                SidebarAction::Select(entity) => {
                    self.switch_entity(entity);
                    self.focus = Focus::Grid;
                }
                SidebarAction::FocusGrid => self.focus = Focus::Grid,
                SidebarAction::None => {}
            },
            Focus::Grid => {
                let view = self.grid.view();
                let row_count = view.rows.len();
                let col_count = self.grid.columns().len();
                drop(view);
                let action = self.grid_state.handle_key(key, row_count, col_count);
                self.handle_grid_action(action);
            }
        }

        false
    }

    fn handle_grid_action(&mut self, action: GridAction) {
        match action {
            GridAction::None => {}
            GridAction::EditCell => {
                if let Some((row_id, field)) = self.cell_under_cursor() {
                    self.open_cell_editor(row_id, &field);
                }
            }
            GridAction::CreateRow => {
                if self.store_status == StoreStatus::Loading {
                    self.last_status = Some("Still loading".to_string());
                    return;
                }
                let request = self.grid.begin_create(Row::blank);
                self.last_status = Some("Creating row (appended at the end)...".to_string());
                self.dispatch(request);
            }
            GridAction::DeleteRow => {
                let Some((row_id, _)) = self.cell_under_cursor() else {
                    return;
                };
                if self.grid.is_locked(&row_id) {
                    self.last_status = Some("Row has a change in flight".to_string());
                    return;
                }
                self.confirm
                    .open(format!("Delete record {row_id}? This cannot be undone."), row_id);
            }
            GridAction::OpenDetail => {
                let view = self.grid.view();
                if let Some(row) = view.rows.get(self.grid_state.cursor_row) {
                    self.row_detail = Some(RowDetailModal::new(row, self.grid.columns()));
                }
            }
            GridAction::OpenFilter => {
                // Staged edits start from the applied set.
                self.grid.reset_filters();
                self.filter_editor.open();
            }
            GridAction::OpenSearch => {
                let current = self.grid.search().to_string();
                self.search.open(&current);
            }
            GridAction::CycleSort => {
                if let Some(column) = self.grid.columns().get(self.grid_state.cursor_col) {
                    let field = column.field.clone();
                    self.grid.cycle_sort(&field);
                    self.grid_state.reset_rows();
                }
            }
            GridAction::CopyCell => {
                if let Some(text) = self.display_under_cursor() {
                    self.copy_to_clipboard(&text);
                }
            }
            GridAction::NextPage => {
                self.grid.next_page();
                self.grid_state.reset_rows();
            }
            GridAction::PrevPage => {
                self.grid.prev_page();
                self.grid_state.reset_rows();
            }
            GridAction::CyclePageSize => {
                let current = self.grid.page_state().page_size();
                let next = next_page_size(&self.config.display.page_size_options, current);
                self.grid.set_page_size(next);
                self.grid_state.reset_rows();
                self.last_status = Some(format!(
                    "Page size: {}",
                    crate::ui::page_size_label(next)
                ));
            }
            GridAction::JumpToPage => {
                let current = self.grid.page_state().current_page().to_string();
                self.page_jump.open(&current);
            }
            GridAction::Refresh => self.start_load(),
        }
    }

    /// The id and field under the grid cursor, if any.
    fn cell_under_cursor(&self) -> Option<(RowId, String)> {
        let view = self.grid.view();
        let row = view.rows.get(self.grid_state.cursor_row)?;
        let column = self.grid.columns().get(self.grid_state.cursor_col)?;
        Some((row.id().clone(), column.field.clone()))
    }

    fn display_under_cursor(&self) -> Option<String> {
        let view = self.grid.view();
        let row = view.rows.get(self.grid_state.cursor_row)?;
        let column = self.grid.columns().get(self.grid_state.cursor_col)?;
        Some(column.display_value(row))
    }

    fn open_cell_editor(&mut self, row_id: RowId, field: &str) {
        let Some(column) = grid_engine::find_column(self.grid.columns(), field) else {
            return;
        };
        if !column.editable {
            self.last_status = Some(format!("{} is read-only", column.header));
            return;
        }
        // A second mutation against the same optimistic state would make
        // the rollback snapshot ambiguous, so rows with an in-flight
        // change are not re-editable until they settle.
        if self.grid.is_locked(&row_id) {
            self.last_status = Some("Row is saving; try again when it settles".to_string());
            return;
        }
        let Some(row) = self.grid.row(&row_id) else {
            return;
        };

        let header = column.header.clone();
        let current = row.get(field).display();
        self.cell_edit.open(row_id.clone(), field, &header, &current);
        self.grid.set_editing(&row_id, true);
    }

    fn switch_entity(&mut self, entity: EntityKind) {
        info!(entity = entity.title(), "switching entity");
        self.entity = entity;
        self.grid =
            grid_engine::GridController::new(entity.columns(), self.config.display.page_size);
        self.grid_state = GridState::default();
        self.row_detail = None;
        self.start_load();
    }

    fn start_load(&mut self) {
        self.store_status = StoreStatus::Loading;
        self.last_status = Some(format!("Loading {}...", self.entity.title()));

        let store = self.store.clone();
        let tx = self.events_tx.clone();
        let entity = self.entity;

        self.rt.spawn(async move {
            match store.list(entity.path()).await {
                Ok(records) => {
                    let _ = tx.send(StoreEvent::Loaded { entity, records });
                }
                Err(error) => {
                    let _ = tx.send(StoreEvent::LoadFailed { entity, error });
                }
            }
        });
    }

    /// Run a mutation request against the store and report the settlement.
    fn dispatch(&mut self, request: MutationRequest) {
        let store = self.store.clone();
        let tx = self.events_tx.clone();
        let entity = self.entity;
        let mutation = request.id;

        self.rt.spawn(async move {
            let path = entity.path();
            let outcome = match request.op {
                MutationOp::Create { record } => store
                    .create(path, record)
                    .await
                    .map(|record| MutationSuccess::Created { record }),
                MutationOp::Update { id, record } => store
                    .update(path, id.as_str(), record)
                    .await
                    .map(|record| MutationSuccess::Updated { record }),
                MutationOp::Delete { id } => store
                    .delete(path, id.as_str())
                    .await
                    .map(|()| MutationSuccess::Deleted),
            };
            let _ = tx.send(StoreEvent::Settled {
                entity,
                mutation,
                outcome,
            });
        });
    }

    fn drain_store_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_store_event(event);
        }
    }

    fn apply_store_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Loaded { entity, records } => {
                if entity != self.entity {
                    return;
                }
                self.store_status = StoreStatus::Idle;
                self.grid.load_records(&records);
                self.grid_state = GridState::default();
                self.last_status = Some(format!(
                    "Loaded {} {}",
                    self.grid.rows().len(),
                    entity.title().to_lowercase()
                ));
            }
            StoreEvent::LoadFailed { entity, error } => {
                if entity != self.entity {
                    return;
                }
                self.store_status = StoreStatus::Error;
                // Failure leaves the row set empty rather than stale.
                self.grid.set_rows(Vec::new());
                self.last_status = Some("Load failed (see error)".to_string());
                self.last_error = Some(format_store_error(&error));
            }
            StoreEvent::Settled {
                entity,
                mutation,
                outcome,
            } => {
                if entity != self.entity {
                    // The user switched entities while this was in flight;
                    // the controller that issued it is gone.
                    warn!(%mutation, "settlement for a different entity; ignoring");
                    return;
                }
                match outcome {
                    Ok(success) => {
                        self.last_status = Some(
                            match success {
                                MutationSuccess::Created { .. } => "Row created",
                                MutationSuccess::Updated { .. } => "Row saved",
                                MutationSuccess::Deleted => "Row deleted",
                            }
                            .to_string(),
                        );
                        self.grid.resolve(mutation, Ok(success));
                    }
                    Err(error) => {
                        self.last_status = Some("Change rolled back (see error)".to_string());
                        self.last_error = Some(format_store_error(&error));
                        self.grid.resolve(mutation, Err(error));
                    }
                }
                self.grid_state
                    .clamp_cursor(self.grid.view().rows.len(), self.grid.columns().len());
            }
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(text) {
                Ok(()) => {
                    self.last_status = Some(format!("Copied {} chars", text.len()));
                }
                Err(e) => {
                    self.last_error = Some(format!("Failed to copy: {e}"));
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Clipboard unavailable: {e}"));
            }
        }
    }

    fn status_line(&self) -> Paragraph<'static> {
        let view = self.grid.view();

        let focus = match self.focus {
            Focus::Sidebar => "SIDEBAR",
            Focus::Grid => "GRID",
        };

        let sort = match &self.grid.sort_state().field {
            Some(field) => format!("{} {}", field, self.grid.sort_state().direction.indicator()),
            None => "-".to_string(),
        };

        let filters = self.grid.filters.applied().len();
        let search = if self.grid.search().trim().is_empty() {
            String::new()
        } else {
            format!("  /{}", self.grid.search().trim())
        };

        let status = self.last_status.as_deref().unwrap_or("Ready");

        let text = format!(
            "{} | {} | Store: {} | Rows: {}/{} | Sort: {} | Filters: {}{} | Pending: {} | {}",
            focus,
            self.entity.title(),
            self.store_status.label(),
            view.total_rows,
            self.grid.rows().len(),
            sort,
            filters,
            search,
            self.grid.pending_count(),
            status
        );

        Paragraph::new(text).style(Style::default().fg(Color::Gray))
    }
}

fn render_prompt(
    frame: &mut ratatui::Frame,
    size: Rect,
    prompt: &mut InputPrompt,
    title: &str,
) {
    let h = 3u16.min(size.height);
    let y = size.height.saturating_sub(h);
    let area = Rect {
        x: 0,
        y,
        width: size.width,
        height: h,
    };

    prompt.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_string())
            .border_style(Style::default().fg(Color::Yellow)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(&prompt.textarea, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
