//! Recorded, reversible units of edit.
//!
//! An [`Action`] stores full attribute images by value, never live
//! references. Every entity it mentions, its own target included, is
//! addressed by [`SlotId`], so replay goes through the identity map and
//! survives the entity being recreated under a new live id.

use atlas_core::{Attrs, EntityKind, LiveId, SlotId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// An entity image with every reference expressed as a slot.
pub type Snapshot = Attrs<SlotId>;

/// What an action did to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Delete,
    /// Discrete attribute change (rename, restyle, lock toggle...).
    Update,
    Move,
    Reshape,
    Waypoints,
    FogToggle,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
            ActionKind::Update => "update",
            ActionKind::Move => "move",
            ActionKind::Reshape => "reshape",
            ActionKind::Waypoints => "waypoints",
            ActionKind::FogToggle => "fog-toggle",
        }
    }

    /// Kinds a drag emits frame by frame. Only these can coalesce.
    pub fn is_continuous(&self) -> bool {
        matches!(self, ActionKind::Move | ActionKind::Reshape | ActionKind::Waypoints)
    }

    fn verb(&self) -> &'static str {
        match self {
            ActionKind::Create => "Create",
            ActionKind::Delete => "Delete",
            ActionKind::Update => "Edit",
            ActionKind::Move => "Move",
            ActionKind::Reshape => "Reshape",
            ActionKind::Waypoints => "Reroute",
            ActionKind::FogToggle => "Toggle fog on",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical entity an action addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    pub kind: EntityKind,
    pub slot: SlotId,
}

/// One recorded edit, possibly bundling dependent actions.
///
/// For `Create`/`Delete`, `before` is the entity image and `after` is
/// `None`. For every other kind, `before`/`after` are the images on either
/// side of the edit.
///
/// `children` are ordered referenced-first: an entity always comes before
/// anything that points at it. Construction (forward create, undo of delete)
/// walks them in order after the parent; destruction walks them in reverse
/// before the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub target: Target,
    pub before: Snapshot,
    pub after: Option<Snapshot>,
    pub children: Vec<Action>,
}

impl Action {
    pub fn new(
        kind: ActionKind,
        target: Target,
        before: Snapshot,
        after: Option<Snapshot>,
    ) -> Self {
        Self {
            kind,
            target,
            before,
            after,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Action>) -> Self {
        self.children = children;
        self
    }

    /// Number of entities this action touches, itself included.
    pub fn affected(&self) -> usize {
        1 + self.children.iter().map(Action::affected).sum::<usize>()
    }

    /// Menu text such as `"Move pin"` or `"Delete pin and 2 dependents"`.
    pub fn describe(&self) -> String {
        let base = format!("{} {}", self.kind.verb(), self.target.kind);
        match self.affected() - 1 {
            0 => base,
            1 => format!("{base} and 1 dependent"),
            n => format!("{base} and {n} dependents"),
        }
    }
}

/// One history step: what a single undo or redo replays.
///
/// Holds one action normally, several when edits were recorded inside a
/// batch. Actions are replayed in order going forward and in reverse going
/// back.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub description: String,
    pub actions: SmallVec<[Action; 1]>,
}

impl Entry {
    pub fn single(action: Action) -> Self {
        Self {
            description: action.describe(),
            actions: smallvec::smallvec![action],
        }
    }

    /// The only action of a non-batch entry.
    pub fn sole_action(&self) -> Option<&Action> {
        match self.actions.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn sole_action_mut(&mut self) -> Option<&mut Action> {
        match self.actions.as_mut_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Result of an undo or redo call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An entry was replayed; carries its description.
    Applied(String),
    /// The stack was empty. Nothing changed.
    Empty,
}

impl Outcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

/// Result of a successful record call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// Live id of the edited (or newly created) entity.
    pub id: LiveId,
    /// Whether the edit was folded into the previous history entry.
    pub merged: bool,
}
