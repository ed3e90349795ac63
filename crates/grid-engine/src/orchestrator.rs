//! The grid controller: canonical row ownership, view derivation, and
//! optimistic mutations.
//!
//! The controller owns the canonical `Vec<Row>` and derives the rendered
//! view through the fixed pipeline filter -> sort -> paginate, so row counts
//! and page boundaries always reflect the matching subset. Mutations are
//! optimistic: the local set changes immediately and a [`MutationRequest`]
//! is handed to the host, which runs it against its record service and
//! reports the settlement back through [`GridController::resolve`]. Every
//! pending mutation carries its own snapshot; a failed settlement restores
//! exactly what that mutation changed and nothing else, so in-flight
//! mutations against different rows stay independent.
//!
//! The controller never talks to the network itself.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::column::{find_column, Column};
use crate::error::{EditError, MutationError, ValidationError};
use crate::filter::{evaluate, FilterSet};
use crate::page::{paginate, PageJumpRejected, PageState};
use crate::row::{Row, RowId};
use crate::sort::{sort, SortState};
use crate::value::CellValue;

/// Handle correlating a dispatched mutation with its settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// The service call the host must perform.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationOp {
    Create { record: JsonValue },
    Update { id: RowId, record: JsonValue },
    Delete { id: RowId },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MutationRequest {
    pub id: MutationId,
    pub op: MutationOp,
}

/// Successful settlement payload, mirroring the service contract: creates
/// and updates return the canonical server record, deletes only confirm.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationSuccess {
    Created { record: JsonValue },
    Updated { record: JsonValue },
    Deleted,
}

/// Snapshot of exactly what one mutation changed.
#[derive(Clone, Debug)]
enum PendingKind {
    Create,
    Update { previous: Row },
    Delete { removed: Row, index: usize },
}

#[derive(Clone, Debug)]
struct PendingMutation {
    row_id: RowId,
    kind: PendingKind,
}

/// One derived page of the grid, plus the totals the chrome needs.
#[derive(Debug)]
pub struct GridView<'a> {
    /// The rows of the current page, in render order.
    pub rows: Vec<&'a Row>,
    /// The pagination state actually used (page clamped into range).
    pub page: PageState,
    /// Row count after filtering and search, before pagination.
    pub total_rows: usize,
    pub total_pages: usize,
}

pub struct GridController {
    columns: Vec<Column>,
    rows: Vec<Row>,
    pub filters: FilterSet,
    sort_state: SortState,
    page_state: PageState,
    search: String,
    pending: HashMap<MutationId, PendingMutation>,
    next_mutation: u64,
    next_provisional: u64,
}

impl GridController {
    pub fn new(columns: Vec<Column>, page_size: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            filters: FilterSet::default(),
            sort_state: SortState::none(),
            page_state: PageState::new(page_size),
            search: String::new(),
            pending: HashMap::new(),
            next_mutation: 0,
            next_provisional: 0,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Replace the canonical row set (after a `list()` reload).
    ///
    /// Outstanding mutations are forgotten: their snapshots describe a set
    /// that no longer exists, and the reload itself is the fresher truth.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        if !self.pending.is_empty() {
            warn!(
                pending = self.pending.len(),
                "row set replaced while mutations were in flight; dropping their snapshots"
            );
            self.pending.clear();
        }
        self.rows = rows;
        self.clamp_page();
    }

    /// Type and load raw backend records, skipping records with no usable
    /// id.
    pub fn load_records(&mut self, records: &[JsonValue]) {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match Row::from_record(record, &self.columns) {
                Some(row) => rows.push(row),
                None => warn!("skipping record without id"),
            }
        }
        debug!(rows = rows.len(), "loaded row set");
        self.set_rows(rows);
    }

    // ---- view derivation -------------------------------------------------

    /// Derive the rendered page: filter -> sort -> paginate, in that order.
    /// Pure with respect to the canonical set; calling it twice with the
    /// same state yields the same view.
    pub fn view(&self) -> GridView<'_> {
        let filtered = self.filtered_rows();
        let sorted = sort(filtered, &self.sort_state, &self.columns);
        let page = paginate(&sorted, &self.page_state);
        GridView {
            rows: page.rows,
            page: page.state,
            total_rows: page.total_rows,
            total_pages: page.total_pages,
        }
    }

    fn filtered_rows(&self) -> Vec<&Row> {
        let filtered = evaluate(&self.rows, self.filters.applied(), &self.columns);
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return filtered;
        }
        filtered
            .into_iter()
            .filter(|row| {
                self.columns
                    .iter()
                    .any(|c| row.get(&c.field).display().to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn filtered_count(&self) -> usize {
        self.filtered_rows().len()
    }

    fn clamp_page(&mut self) {
        let total = self.filtered_count();
        self.page_state.clamp(total);
    }

    // ---- filters, search, sort, pagination ------------------------------

    /// Promote staged filter edits; on success the page is re-clamped to
    /// the new matching subset.
    pub fn apply_filters(&mut self) -> Result<(), ValidationError> {
        self.filters.apply(&self.columns)?;
        self.clamp_page();
        Ok(())
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    /// Drop all conditions, staged and applied, effective immediately.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.clamp_page();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Global free-text search, ANDed with the structured conditions. A row
    /// matches when any column's string form contains the term
    /// case-insensitively.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.clamp_page();
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort_state
    }

    pub fn set_sort(&mut self, state: SortState) {
        self.sort_state = state;
    }

    pub fn cycle_sort(&mut self, field: &str) {
        if find_column(&self.columns, field).is_some() {
            self.sort_state.cycle(field);
        }
    }

    pub fn page_state(&self) -> PageState {
        self.page_state
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_state.set_page_size(page_size);
    }

    pub fn next_page(&mut self) {
        let total = self.filtered_count();
        self.page_state.next_page(total);
    }

    pub fn prev_page(&mut self) {
        self.page_state.prev_page();
    }

    pub fn jump_to_page(&mut self, input: &str) -> Result<(), PageJumpRejected> {
        let total = self.filtered_count();
        self.page_state.jump_to(input, total)
    }

    // ---- edit-mode bookkeeping ------------------------------------------

    pub fn set_editing(&mut self, id: &RowId, editing: bool) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id() == id) {
            row.is_editing = editing;
        }
    }

    /// Whether the row has a mutation in flight. Hosts must check this
    /// before letting the row re-enter edit mode; a second mutation against
    /// the same optimistic state would make the rollback snapshot
    /// ambiguous.
    pub fn is_locked(&self, id: &RowId) -> bool {
        self.pending.values().any(|p| &p.row_id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ---- optimistic mutations -------------------------------------------

    /// Insert a provisional row and return the create request to dispatch.
    ///
    /// The factory receives the provisional id and may pre-fill fields; the
    /// default is [`Row::blank`]. The row appears in the grid immediately,
    /// flagged `is_new`, and is replaced by the server-confirmed row (or
    /// removed again) when the request settles.
    pub fn begin_create(&mut self, factory: impl FnOnce(RowId, &[Column]) -> Row) -> MutationRequest {
        let provisional_id = self.next_provisional_id();
        let mut row = factory(provisional_id.clone(), &self.columns);
        row.set_id(provisional_id.clone());
        row.is_new = true;

        let mut record = row.to_record(&self.columns);
        if let Some(object) = record.as_object_mut() {
            // The backend assigns the real id.
            object.remove("id");
        }

        self.rows.push(row);
        let id = self.next_mutation_id();
        self.pending.insert(
            id,
            PendingMutation {
                row_id: provisional_id.clone(),
                kind: PendingKind::Create,
            },
        );
        debug!(%id, row = %provisional_id, "optimistic create");
        MutationRequest {
            id,
            op: MutationOp::Create { record },
        }
    }

    /// Apply an edit draft optimistically and return the update request.
    ///
    /// The full pre-edit row is snapshotted *before* the draft is applied;
    /// the request carries the complete updated record, and a failed
    /// settlement restores the snapshot verbatim.
    pub fn begin_update(
        &mut self,
        id: &RowId,
        field: &str,
        draft: &str,
    ) -> Result<MutationRequest, EditError> {
        let column = find_column(&self.columns, field)
            .ok_or_else(|| EditError::UnknownColumn(field.to_string()))?;
        if !column.editable {
            return Err(EditError::NotEditable(field.to_string()));
        }
        let value = CellValue::parse(draft, column.data_type)?;

        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| EditError::UnknownRow(id.to_string()))?;

        let previous = row.clone();
        row.set(field, value);
        let record = row.to_record(&self.columns);

        let mutation = self.next_mutation_id();
        self.pending.insert(
            mutation,
            PendingMutation {
                row_id: id.clone(),
                kind: PendingKind::Update { previous },
            },
        );
        debug!(%mutation, row = %id, field, "optimistic update");
        Ok(MutationRequest {
            id: mutation,
            op: MutationOp::Update {
                id: id.clone(),
                record,
            },
        })
    }

    /// Remove the row optimistically and return the delete request.
    pub fn begin_delete(&mut self, id: &RowId) -> Result<MutationRequest, EditError> {
        let index = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| EditError::UnknownRow(id.to_string()))?;

        let removed = self.rows.remove(index);
        self.clamp_page();

        let mutation = self.next_mutation_id();
        self.pending.insert(
            mutation,
            PendingMutation {
                row_id: id.clone(),
                kind: PendingKind::Delete { removed, index },
            },
        );
        debug!(%mutation, row = %id, "optimistic delete");
        Ok(MutationRequest {
            id: mutation,
            op: MutationOp::Delete { id: id.clone() },
        })
    }

    /// Settle a mutation. Success reconciles local state to the server's
    /// answer; failure rolls back this mutation's own change. Either way
    /// the row's in-flight guard is released.
    pub fn resolve(&mut self, id: MutationId, outcome: Result<MutationSuccess, MutationError>) {
        let Some(pending) = self.pending.remove(&id) else {
            warn!(%id, "settlement for unknown mutation");
            return;
        };
        match outcome {
            Ok(success) => self.reconcile(pending, success),
            Err(error) => {
                warn!(%id, row = %pending.row_id, %error, "mutation failed; rolling back");
                self.rollback(pending);
            }
        }
        self.clamp_page();
    }

    fn reconcile(&mut self, pending: PendingMutation, success: MutationSuccess) {
        match pending.kind {
            PendingKind::Create => {
                let record = match success {
                    MutationSuccess::Created { record } | MutationSuccess::Updated { record } => record,
                    MutationSuccess::Deleted => {
                        warn!(row = %pending.row_id, "delete settlement for a create");
                        return;
                    }
                };
                match Row::from_record(&record, &self.columns) {
                    Some(server_row) => {
                        // Swap the provisional row for the server-confirmed
                        // one, keeping its position.
                        match self.rows.iter_mut().find(|r| r.id() == &pending.row_id) {
                            Some(slot) => *slot = server_row,
                            None => warn!(row = %pending.row_id, "provisional row vanished before settlement"),
                        }
                    }
                    None => {
                        // Server confirmed but returned no usable record;
                        // keep the optimistic row, just stop flagging it.
                        warn!(row = %pending.row_id, "create confirmed without a server record");
                        if let Some(slot) = self.rows.iter_mut().find(|r| r.id() == &pending.row_id) {
                            slot.is_new = false;
                        }
                    }
                }
            }
            PendingKind::Update { .. } => {
                let record = match success {
                    MutationSuccess::Created { record } | MutationSuccess::Updated { record } => record,
                    MutationSuccess::Deleted => {
                        warn!(row = %pending.row_id, "delete settlement for an update");
                        return;
                    }
                };
                // The server is the source of truth for computed fields:
                // replace the whole row with its answer.
                match Row::from_record(&record, &self.columns) {
                    Some(server_row) => {
                        match self.rows.iter_mut().find(|r| r.id() == &pending.row_id) {
                            Some(slot) => *slot = server_row,
                            // The row was deleted while the update was in
                            // flight; the delete already won.
                            None => warn!(row = %pending.row_id, "updated row no longer present"),
                        }
                    }
                    None => warn!(row = %pending.row_id, "update confirmed without a usable record"),
                }
            }
            PendingKind::Delete { .. } => {
                // Deletion has no payload beyond confirmation.
            }
        }
    }

    fn rollback(&mut self, pending: PendingMutation) {
        match pending.kind {
            PendingKind::Create => {
                self.rows.retain(|r| r.id() != &pending.row_id);
            }
            PendingKind::Update { previous } => {
                match self.rows.iter_mut().find(|r| r.id() == &pending.row_id) {
                    Some(slot) => *slot = previous,
                    None => warn!(row = %pending.row_id, "rolled-back row no longer present"),
                }
            }
            PendingKind::Delete { removed, index } => {
                let index = index.min(self.rows.len());
                self.rows.insert(index, removed);
            }
        }
    }

    fn next_mutation_id(&mut self) -> MutationId {
        self.next_mutation += 1;
        MutationId(self.next_mutation)
    }

    fn next_provisional_id(&mut self) -> RowId {
        self.next_provisional += 1;
        RowId::new(format!(
            "new-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            self.next_provisional
        ))
    }
}
