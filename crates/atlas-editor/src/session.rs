//! Editor session: the stores and their history, kept together.
//!
//! A host holding one map open keeps one [`EditorSession`]. Every edit goes
//! through it, so the history always sees the same stores it replays onto.

use crate::action::{Outcome, Recorded};
use crate::config::HistoryConfig;
use crate::edit::Edit;
use crate::error::HistoryResult;
use crate::history::History;
use atlas_core::{Entity, EntityKind, LiveId, Stores};

/// The stores being edited and the undo/redo history over them.
#[derive(Debug)]
pub struct EditorSession {
    /// Entity stores, one per kind (source of truth).
    pub stores: Stores,

    /// Undo/redo history for edits made through this session.
    pub history: History,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl EditorSession {
    /// Create a session over fresh in-memory stores.
    pub fn new(config: HistoryConfig) -> Self {
        Self::with_stores(Stores::in_memory(), config)
    }

    /// Create a session over host-provided stores.
    pub fn with_stores(stores: Stores, config: HistoryConfig) -> Self {
        Self {
            stores,
            history: History::new(config),
        }
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Perform and record an edit.
    pub fn apply(&mut self, edit: Edit) -> HistoryResult<Recorded> {
        self.history.record(&mut self.stores, edit)
    }

    pub fn undo(&mut self) -> HistoryResult<Outcome> {
        self.history.undo(&mut self.stores)
    }

    pub fn redo(&mut self) -> HistoryResult<Outcome> {
        self.history.redo(&mut self.stores)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Pointer-up: the next edit starts a new history entry.
    pub fn end_gesture(&mut self) {
        self.history.end_gesture();
    }

    /// Run `f` inside a batch so everything it records undoes as one step.
    ///
    /// The batch is closed even if `f` fails; edits that did succeed stay
    /// recorded.
    pub fn batch<T>(
        &mut self,
        description: &str,
        f: impl FnOnce(&mut Self) -> HistoryResult<T>,
    ) -> HistoryResult<T> {
        self.history.begin_batch();
        let result = f(self);
        self.history.end_batch(description);
        result
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, kind: EntityKind, id: LiveId) -> Option<Entity> {
        self.stores.get(kind, id)
    }

    /// Whether the stores differ from the last [`mark_saved`](Self::mark_saved).
    pub fn is_dirty(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }
}
