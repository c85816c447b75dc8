//! Applying actions to the stores.
//!
//! Record, undo and redo all go through [`run`]. Every store call resolves
//! identities through the [`IdentityMap`], and every (re)creation rebinds the
//! action's slot to the id the store hands back.
//!
//! If a store call fails partway through, the primitive steps already taken
//! in this run are compensated in reverse order before the error is
//! returned, so the stores are back where they started and the caller can
//! retry. Compensation failures are logged, not surfaced.

use crate::action::{Action, ActionKind, Snapshot};
use crate::error::HistoryResult;
use crate::rebase::IdentityMap;
use atlas_core::Stores;

/// Which way an action is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Record and redo.
    Forward,
    /// Undo.
    Backward,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Replay `actions` in the given order and direction as one unit.
pub fn run<'a>(
    stores: &mut Stores,
    ids: &mut IdentityMap,
    actions: impl IntoIterator<Item = &'a Action>,
    direction: Direction,
) -> HistoryResult<()> {
    let mut replay = Replay {
        stores,
        ids,
        done: Vec::new(),
    };
    for action in actions {
        if let Err(err) = replay.apply(action, direction) {
            log::debug!("replay of {} {} failed: {err}", action.kind, action.target.kind);
            replay.compensate();
            return Err(err);
        }
    }
    Ok(())
}

struct Replay<'s, 'a> {
    stores: &'s mut Stores,
    ids: &'s mut IdentityMap,
    /// Primitive steps taken so far, for compensation.
    done: Vec<(&'a Action, Direction)>,
}

impl<'a> Replay<'_, 'a> {
    /// Apply an action and its children.
    ///
    /// Construction (create forward, delete backward, mutations forward)
    /// handles the action before its children, children in order.
    /// Destruction handles children first, in reverse, then the action.
    fn apply(&mut self, action: &'a Action, direction: Direction) -> HistoryResult<()> {
        let constructive = match action.kind {
            ActionKind::Delete => direction == Direction::Backward,
            _ => direction == Direction::Forward,
        };
        if constructive {
            self.step(action, direction)?;
            for child in &action.children {
                self.apply(child, direction)?;
            }
        } else {
            for child in action.children.iter().rev() {
                self.apply(child, direction)?;
            }
            self.step(action, direction)?;
        }
        Ok(())
    }

    /// The action's own store call, children excluded.
    fn step(&mut self, action: &'a Action, direction: Direction) -> HistoryResult<()> {
        let target = action.target;
        match (action.kind, direction) {
            (ActionKind::Create, Direction::Forward)
            | (ActionKind::Delete, Direction::Backward) => {
                let attrs = self.ids.rebase(&action.before)?;
                let entity = self.stores.create(attrs)?;
                self.ids.bind(target.kind, target.slot, entity.id);
            }
            (ActionKind::Create, Direction::Backward)
            | (ActionKind::Delete, Direction::Forward) => {
                let id = self.ids.resolve(target.kind, target.slot)?;
                self.stores.delete(target.kind, id)?;
            }
            (_, Direction::Forward) => {
                self.write(action, action.after.as_ref().unwrap_or(&action.before))?;
            }
            (_, Direction::Backward) => {
                self.write(action, &action.before)?;
            }
        }
        self.done.push((action, direction));
        Ok(())
    }

    fn write(&mut self, action: &Action, image: &Snapshot) -> HistoryResult<()> {
        let id = self.ids.resolve(action.target.kind, action.target.slot)?;
        let attrs = self.ids.rebase(image)?;
        self.stores.update(id, attrs)?;
        Ok(())
    }

    /// Undo every primitive step taken so far, newest first.
    fn compensate(&mut self) {
        let done = std::mem::take(&mut self.done);
        for (action, direction) in done.into_iter().rev() {
            if let Err(err) = self.step(action, direction.reverse()) {
                log::warn!(
                    "could not roll back {} of {} {}: {err}",
                    action.kind,
                    action.target.kind,
                    action.target.slot
                );
            }
        }
        self.done.clear();
    }
}
