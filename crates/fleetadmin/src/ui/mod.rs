mod cell_editor;
mod confirm_prompt;
mod filter_editor;
mod grid;
mod help_popup;
mod pager;
mod prompt;
mod row_detail;
mod sidebar;

pub use cell_editor::{CellEditAction, CellEditPrompt};
pub use confirm_prompt::{ConfirmAction, ConfirmPrompt};
pub use filter_editor::{FilterEditor, FilterEditorAction};
pub use grid::{DataGrid, GridAction, GridState};
pub use help_popup::help_popup;
pub use pager::{next_page_size, page_size_label, pager_line};
pub use prompt::InputPrompt;
pub use row_detail::{RowDetailAction, RowDetailModal};
pub use sidebar::{Sidebar, SidebarAction};
