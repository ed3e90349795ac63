//! Inline cell-edit lifecycle.
//!
//! A cell is either viewed or edited; entering edit mode snapshots the
//! displayed value, keystrokes mutate only the draft, and the session ends
//! in exactly one of two ways: commit hands the draft to the host's save
//! path, abort discards it and the pre-edit value is displayed again. No
//! network traffic happens here.
//!
//! Each controller instance tracks a single cell. A host that wants
//! full-row editing drives one instance per cell; instances are independent
//! and never inspect sibling state.

use crate::row::RowId;

/// An in-progress edit of one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditSession {
    pub row_id: RowId,
    pub field: String,
    original: String,
    draft: String,
}

impl EditSession {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }
}

/// What a controller call produced. `Draft` events carry the current draft
/// so the host can track dirty state without polling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditEvent {
    Draft(String),
    Commit {
        row_id: RowId,
        field: String,
        value: String,
    },
    Abort {
        row_id: RowId,
        field: String,
    },
    /// No active session; the call was ignored.
    Idle,
}

/// Per-cell edit state machine: Viewing -> Editing -> Viewing.
#[derive(Clone, Debug, Default)]
pub struct CellEditor {
    session: Option<EditSession>,
}

impl CellEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn draft(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.draft.as_str())
    }

    pub fn is_dirty(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.draft != s.original)
            .unwrap_or(false)
    }

    /// Enter edit mode, snapshotting the currently displayed value as both
    /// the original and the initial draft. Beginning while another session
    /// is active replaces it (one field per controller at a time).
    pub fn begin(&mut self, row_id: RowId, field: impl Into<String>, current: impl Into<String>) {
        let current = current.into();
        self.session = Some(EditSession {
            row_id,
            field: field.into(),
            original: current.clone(),
            draft: current,
        });
    }

    /// Replace the draft wholesale (the host's text input is authoritative
    /// for cursor handling; it reports its content here on every change).
    pub fn set_draft(&mut self, draft: impl Into<String>) -> EditEvent {
        match self.session.as_mut() {
            Some(session) => {
                session.draft = draft.into();
                EditEvent::Draft(session.draft.clone())
            }
            None => EditEvent::Idle,
        }
    }

    pub fn push_char(&mut self, c: char) -> EditEvent {
        match self.session.as_mut() {
            Some(session) => {
                session.draft.push(c);
                EditEvent::Draft(session.draft.clone())
            }
            None => EditEvent::Idle,
        }
    }

    pub fn backspace(&mut self) -> EditEvent {
        match self.session.as_mut() {
            Some(session) => {
                session.draft.pop();
                EditEvent::Draft(session.draft.clone())
            }
            None => EditEvent::Idle,
        }
    }

    /// Commit: leave edit mode and hand the draft to the save path.
    pub fn commit(&mut self) -> EditEvent {
        match self.session.take() {
            Some(session) => EditEvent::Commit {
                row_id: session.row_id,
                field: session.field,
                value: session.draft,
            },
            None => EditEvent::Idle,
        }
    }

    /// Abort: leave edit mode, discard the draft. The pre-edit value was
    /// never overwritten, so there is nothing to restore.
    pub fn abort(&mut self) -> EditEvent {
        match self.session.take() {
            Some(session) => EditEvent::Abort {
                row_id: session.row_id,
                field: session.field,
            },
            None => EditEvent::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_on(value: &str) -> CellEditor {
        let mut editor = CellEditor::new();
        editor.begin(RowId::new("1"), "name", value);
        editor
    }

    #[test]
    fn test_begin_snapshots_original() {
        let editor = editor_on("old");
        let session = editor.session().unwrap();
        assert_eq!(session.original(), "old");
        assert_eq!(session.draft(), "old");
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_mutation_touches_only_the_draft() {
        let mut editor = editor_on("old");
        assert_eq!(editor.push_char('!'), EditEvent::Draft("old!".to_string()));
        assert_eq!(editor.session().unwrap().original(), "old");
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_commit_hands_over_the_draft() {
        let mut editor = editor_on("old");
        editor.set_draft("new");

        let event = editor.commit();
        assert_eq!(
            event,
            EditEvent::Commit {
                row_id: RowId::new("1"),
                field: "name".to_string(),
                value: "new".to_string(),
            }
        );
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_abort_discards_the_draft() {
        let mut editor = editor_on("old");
        editor.set_draft("scratch");

        let event = editor.abort();
        assert_eq!(
            event,
            EditEvent::Abort {
                row_id: RowId::new("1"),
                field: "name".to_string(),
            }
        );
        assert!(!editor.is_editing());
        assert!(editor.draft().is_none());
    }

    #[test]
    fn test_calls_without_session_are_idle() {
        let mut editor = CellEditor::new();
        assert_eq!(editor.push_char('x'), EditEvent::Idle);
        assert_eq!(editor.commit(), EditEvent::Idle);
        assert_eq!(editor.abort(), EditEvent::Idle);
    }

    #[test]
    fn test_begin_replaces_active_session() {
        let mut editor = editor_on("old");
        editor.set_draft("halfway");
        editor.begin(RowId::new("2"), "qty", "5");

        let session = editor.session().unwrap();
        assert_eq!(session.row_id, RowId::new("2"));
        assert_eq!(session.draft(), "5");
    }
}
