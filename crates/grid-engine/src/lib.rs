//! # grid-engine
//!
//! A headless data-grid engine for record-set UIs: typed columns over
//! loosely-typed backend records, multi-condition filtering, stable
//! type-aware sorting, pagination, inline cell edits, and optimistic
//! create/update/delete with snapshot rollback.
//!
//! The engine owns no transport and renders nothing. The host feeds it raw
//! records, asks it for derived views (filter -> sort -> paginate, always in
//! that order), and shuttles its [`MutationRequest`]s to whatever record
//! service it talks to, reporting settlements back. Everything in between
//! (staged filter edits, page clamping, per-mutation snapshots, rollback on
//! failure) is handled here and unit-tested here.
//!
//! ## Example
//!
//! ```rust
//! use grid_engine::{CellValue, Column, DataType, GridController, Row, RowId};
//!
//! let columns = vec![
//!     Column::new("name", "Name", DataType::String).editable(),
//!     Column::new("odometer", "Odometer", DataType::Number),
//! ];
//! let mut grid = GridController::new(columns, 25);
//!
//! let mut row = Row::new(RowId::new("v-1"));
//! row.set("name", CellValue::Text("Truck 7".into()));
//! row.set("odometer", CellValue::Number(120_350.0));
//! grid.set_rows(vec![row]);
//!
//! let view = grid.view();
//! assert_eq!(view.total_rows, 1);
//! assert_eq!(view.rows[0].get("name").display(), "Truck 7");
//! ```

pub mod column;
pub mod edit;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod page;
pub mod row;
pub mod sort;
pub mod value;

pub use column::{find_column, Alignment, Column, RenderOverride};
pub use edit::{CellEditor, EditEvent, EditSession};
pub use error::{EditError, MutationError, ValidationError, ValueParseError};
pub use filter::{evaluate, FilterCondition, FilterOperator, FilterSet};
pub use orchestrator::{
    GridController, GridView, MutationId, MutationOp, MutationRequest, MutationSuccess,
};
pub use page::{paginate, Page, PageJumpRejected, PageState, PAGE_SIZE_ALL};
pub use row::{Row, RowId};
pub use sort::{sort, SortDirection, SortState};
pub use value::{parse_date, CellValue, DataType};
