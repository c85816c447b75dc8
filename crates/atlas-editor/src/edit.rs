//! Edit descriptions sent by the host UI.
//!
//! An [`Edit`] names its target by live id, the way the canvas sees it. The
//! history turns it into an [`Action`](crate::action::Action) addressed by
//! slots.

use crate::action::ActionKind;
use crate::error::{HistoryError, HistoryResult};
use atlas_core::{Attrs, EntityKind, LiveId, Point};
use serde::{Deserialize, Serialize};

/// A single user edit, as produced by a canvas tool or inspector panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    Create {
        attrs: Attrs,
    },
    Delete {
        kind: EntityKind,
        id: LiveId,
    },
    /// Replace every attribute of an entity (inspector edits, lock toggles).
    Update {
        id: LiveId,
        attrs: Attrs,
    },
    /// Drag a pin or annotation to an absolute position.
    Move {
        kind: EntityKind,
        id: LiveId,
        to: Point,
    },
    /// Replace a zone's outline.
    Reshape {
        id: LiveId,
        vertices: Vec<Point>,
    },
    /// Replace a connection's route.
    Waypoints {
        id: LiveId,
        waypoints: Vec<Point>,
    },
    /// Flip the fog-of-war flag.
    FogToggle {
        kind: EntityKind,
        id: LiveId,
    },
}

impl Edit {
    pub fn action_kind(&self) -> ActionKind {
        match self {
            Edit::Create { .. } => ActionKind::Create,
            Edit::Delete { .. } => ActionKind::Delete,
            Edit::Update { .. } => ActionKind::Update,
            Edit::Move { .. } => ActionKind::Move,
            Edit::Reshape { .. } => ActionKind::Reshape,
            Edit::Waypoints { .. } => ActionKind::Waypoints,
            Edit::FogToggle { .. } => ActionKind::FogToggle,
        }
    }

    /// The existing entity this edit addresses. `None` for creates.
    pub fn target(&self) -> Option<(EntityKind, LiveId)> {
        match self {
            Edit::Create { .. } => None,
            Edit::Delete { kind, id }
            | Edit::Move { kind, id, .. }
            | Edit::FogToggle { kind, id } => Some((*kind, *id)),
            Edit::Update { id, attrs } => Some((attrs.kind(), *id)),
            Edit::Reshape { id, .. } => Some((EntityKind::Zone, *id)),
            Edit::Waypoints { id, .. } => Some((EntityKind::Connection, *id)),
        }
    }

    /// The image `current` takes on once this edit is applied.
    ///
    /// Only meaningful for mutating edits; creates and deletes return
    /// [`HistoryError::Unsupported`].
    pub fn apply_to(&self, current: &Attrs) -> HistoryResult<Attrs> {
        let kind = current.kind();
        let unsupported = |edit| HistoryError::Unsupported { edit, kind };
        let mut next = current.clone();
        match self {
            Edit::Create { .. } => return Err(unsupported("create")),
            Edit::Delete { .. } => return Err(unsupported("delete")),
            Edit::Update { attrs, .. } => {
                if attrs.kind() != kind {
                    return Err(unsupported("update"));
                }
                next = attrs.clone();
            }
            Edit::Move { to, .. } => {
                if !next.set_position(*to) {
                    return Err(unsupported("move"));
                }
            }
            Edit::Reshape { vertices, .. } => {
                if !next.set_vertices(vertices.clone()) {
                    return Err(unsupported("reshape"));
                }
            }
            Edit::Waypoints { waypoints, .. } => {
                if !next.set_waypoints(waypoints.clone()) {
                    return Err(unsupported("waypoints"));
                }
            }
            Edit::FogToggle { .. } => {
                let fogged = current.fogged().ok_or_else(|| unsupported("fog-toggle"))?;
                next.set_fogged(!fogged);
            }
        }
        Ok(next)
    }
}
