//! Undo/redo history.
//!
//! [`History`] manages a linear undo/redo stack of [`Entry`] values. Edits
//! are performed through [`History::record`], which consults the lock guard,
//! builds the action (bundling cascades for deletes), applies it to the
//! stores and then either folds it into the top entry or pushes a new one.
//! Recording clears the redo stack (standard editor behavior).
//!
//! Stacks only move after the stores have accepted every step of a call. A
//! failed record, undo or redo leaves both stacks exactly as they were.

use std::collections::VecDeque;
use std::fmt;

use atlas_core::{Attrs, EntityKind, LiveId, SlotId, Stores};

use crate::action::{Action, ActionKind, Entry, Outcome, Recorded, Target};
use crate::coalesce::CoalescePolicy;
use crate::compound;
use crate::config::HistoryConfig;
use crate::edit::Edit;
use crate::error::{HistoryError, HistoryResult};
use crate::lock::{GeometricFields, GeometryPolicy, LockGuard};
use crate::rebase::IdentityMap;
use crate::replay::{self, Direction};

/// Description used when a batch is flushed without one.
const DEFAULT_BATCH_DESCRIPTION: &str = "Edit";

/// Undo/redo stacks for one editing session.
///
/// A `History` is owned by the session that edits through it and is passed
/// the stores on every call; it holds no reference to them.
pub struct History {
    undo_stack: VecDeque<Entry>,
    redo_stack: Vec<Entry>,
    ids: IdentityMap,
    coalesce: CoalescePolicy,
    guard: LockGuard,
    max_depth: usize,
    /// Set when the current gesture has ended; the next record cannot merge.
    sealed: bool,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Actions recorded inside the open batch.
    batch: Vec<Action>,
    /// Distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)` where `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)` where `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: the save point is unreachable.
    save_distance: Option<i64>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            ids: IdentityMap::new(),
            coalesce: CoalescePolicy::new(&config.mergeable),
            guard: LockGuard::new(Box::new(GeometricFields), config.guard_waypoints),
            max_depth: config.max_depth,
            sealed: false,
            batch_depth: 0,
            batch: Vec::new(),
            save_distance: Some(0),
        }
    }

    /// Swap in the host's notion of which updates are geometric.
    pub fn with_geometry_policy(
        mut self,
        policy: Box<dyn GeometryPolicy>,
        guard_waypoints: bool,
    ) -> Self {
        self.guard = LockGuard::new(policy, guard_waypoints);
        self
    }

    // ─── Record ──────────────────────────────────────────────────────────

    /// Perform `edit` against the stores and record it.
    ///
    /// Rejections (`Locked`, `NotFound`, `Unsupported`) happen before any
    /// store call. A store failure rolls back whatever part of the edit was
    /// applied. Either way the stacks are untouched.
    pub fn record(&mut self, stores: &mut Stores, edit: Edit) -> HistoryResult<Recorded> {
        let action = match &edit {
            Edit::Create { attrs } => self.prepare_create(attrs.clone()),
            Edit::Delete { kind, id } => self.prepare_delete(stores, *kind, *id)?,
            Edit::Update { id, attrs } => self.prepare_mutation(stores, &edit, attrs.kind(), *id)?,
            Edit::Move { kind, id, .. } | Edit::FogToggle { kind, id } => {
                self.prepare_mutation(stores, &edit, *kind, *id)?
            }
            Edit::Reshape { id, .. } => {
                self.prepare_mutation(stores, &edit, EntityKind::Zone, *id)?
            }
            Edit::Waypoints { id, .. } => {
                self.prepare_mutation(stores, &edit, EntityKind::Connection, *id)?
            }
        };

        replay::run(stores, &mut self.ids, [&action], Direction::Forward)?;
        let kind = action.target.kind;
        let id = self.ids.resolve(kind, action.target.slot)?;
        let merged = self.push(action);
        log::debug!(
            "RECORD {} {kind} {id} (merged: {merged}, undo depth {})",
            edit.action_kind(),
            self.undo_stack.len()
        );
        Ok(Recorded { id, merged })
    }

    fn prepare_create(&mut self, attrs: Attrs) -> Action {
        let target = Target {
            kind: attrs.kind(),
            slot: self.ids.mint(),
        };
        Action::new(ActionKind::Create, target, self.ids.snapshot(attrs), None)
    }

    fn prepare_delete(
        &mut self,
        stores: &Stores,
        kind: EntityKind,
        id: LiveId,
    ) -> HistoryResult<Action> {
        let entity = stores.get(kind, id).ok_or(HistoryError::NotFound { kind, id })?;
        self.guard.approve(&entity, ActionKind::Delete, None)?;
        let dependents = compound::discover_dependents(stores, &entity)?;
        self.guard.approve_cascade(&dependents)?;
        Ok(compound::delete_action(&mut self.ids, entity, dependents))
    }

    fn prepare_mutation(
        &mut self,
        stores: &Stores,
        edit: &Edit,
        kind: EntityKind,
        id: LiveId,
    ) -> HistoryResult<Action> {
        let entity = stores.get(kind, id).ok_or(HistoryError::NotFound { kind, id })?;
        let after = edit.apply_to(&entity.attrs)?;
        self.guard.approve(&entity, edit.action_kind(), Some(&after))?;
        let target = Target {
            kind,
            slot: self.ids.slot_for(kind, id),
        };
        let before = self.ids.snapshot(entity.attrs);
        let after = self.ids.snapshot(after);
        Ok(Action::new(edit.action_kind(), target, before, Some(after)))
    }

    /// Merge `action` into the top entry or push it. Returns whether it merged.
    fn push(&mut self, action: Action) -> bool {
        self.discard_redo();

        if self.batch_depth > 0 {
            let sealed = std::mem::replace(&mut self.sealed, false);
            if !sealed
                && let Some(previous) = self.batch.last_mut()
                && self.coalesce.continues(&action, previous)
            {
                CoalescePolicy::merge(previous, action);
                return true;
            }
            self.batch.push(action);
            return false;
        }

        if self.coalesce.should_merge(&action, self.undo_stack.back(), self.sealed)
            && let Some(previous) = self.undo_stack.back_mut().and_then(Entry::sole_action_mut)
        {
            CoalescePolicy::merge(previous, action);
            // Merged into the top entry. If that entry was the save point,
            // the saved state is gone.
            if self.save_distance == Some(0) {
                self.save_distance = None;
            }
            return true;
        }

        self.push_entry(Entry::single(action));
        false
    }

    fn push_entry(&mut self, entry: Entry) {
        self.sealed = false;
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.undo_stack.push_back(entry);
        self.trim();
    }

    fn discard_redo(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }
        self.redo_stack.clear();
        // A save point sitting in the redo branch is unreachable now.
        if let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    // ─── Gestures & batches ──────────────────────────────────────────────

    /// End the current gesture (pointer-up). The next edit starts a new
    /// entry even if it targets the same entity with the same kind.
    pub fn end_gesture(&mut self) {
        self.sealed = true;
    }

    /// Start a batch. Every edit recorded until the matching
    /// [`end_batch`](Self::end_batch) becomes part of one entry.
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch.clear();
        }
        self.batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes, the collected actions
    /// are pushed as a single entry. An empty batch pushes nothing.
    pub fn end_batch(&mut self, description: impl Into<String>) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.commit_batch(description.into());
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    fn commit_batch(&mut self, description: String) {
        let actions: Vec<Action> = std::mem::take(&mut self.batch);
        if !actions.is_empty() {
            log::debug!("BATCH {description:?} with {} actions", actions.len());
            self.push_entry(Entry {
                description,
                actions: actions.into_iter().collect(),
            });
        }
        self.sealed = true;
    }

    /// Close any open batch before replaying history.
    fn flush_batch(&mut self) {
        if self.batch_depth > 0 {
            self.batch_depth = 0;
            self.commit_batch(DEFAULT_BATCH_DESCRIPTION.to_string());
        }
    }

    // ─── Undo / redo ─────────────────────────────────────────────────────

    /// Revert the most recent entry.
    ///
    /// Returns [`Outcome::Empty`] when there is nothing to undo.
    pub fn undo(&mut self, stores: &mut Stores) -> HistoryResult<Outcome> {
        self.flush_batch();
        let Some(entry) = self.undo_stack.back() else {
            return Ok(Outcome::Empty);
        };
        replay::run(stores, &mut self.ids, entry.actions.iter().rev(), Direction::Backward)?;

        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(Outcome::Empty);
        };
        let description = entry.description.clone();
        self.redo_stack.push(entry);
        self.sealed = true;
        if let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        log::debug!("UNDO {description:?} (undo depth {})", self.undo_stack.len());
        Ok(Outcome::Applied(description))
    }

    /// Reapply the most recently undone entry.
    ///
    /// Returns [`Outcome::Empty`] when there is nothing to redo.
    pub fn redo(&mut self, stores: &mut Stores) -> HistoryResult<Outcome> {
        self.flush_batch();
        let Some(entry) = self.redo_stack.last() else {
            return Ok(Outcome::Empty);
        };
        replay::run(stores, &mut self.ids, entry.actions.iter(), Direction::Forward)?;

        let Some(entry) = self.redo_stack.pop() else {
            return Ok(Outcome::Empty);
        };
        let description = entry.description.clone();
        self.undo_stack.push_back(entry);
        self.sealed = true;
        if let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.trim();
        log::debug!("REDO {description:?} (undo depth {})", self.undo_stack.len());
        Ok(Outcome::Applied(description))
    }

    /// Returns `true` if there are entries that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there are entries that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Undo entry descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|e| e.description.as_str())
    }

    /// Redo entry descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|e| e.description.as_str())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The entry the next undo would revert.
    pub fn peek_undo(&self) -> Option<&Entry> {
        self.undo_stack.back()
    }

    /// The live id currently standing for `slot`.
    pub fn resolve(&self, kind: EntityKind, slot: SlotId) -> HistoryResult<LiveId> {
        self.ids.resolve(kind, slot)
    }

    /// The slot history uses for a live entity, if it has seen it.
    pub fn slot_of(&self, kind: EntityKind, id: LiveId) -> Option<SlotId> {
        self.ids.slot_of(kind, id)
    }

    // ─── Save point ──────────────────────────────────────────────────────

    /// Record the current state as saved.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Whether the current state differs from the last saved state.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Drop both stacks, any open batch, and all identity bindings.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch.clear();
        self.batch_depth = 0;
        self.sealed = false;
        self.ids.clear();
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .field("sealed", &self.sealed)
            .field("batch_depth", &self.batch_depth)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
