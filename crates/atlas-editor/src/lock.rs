//! Lock guard: pre-flight rejection of edits on locked entities.
//!
//! Locking blocks destructive and geometric edits only. A locked entity can
//! still be renamed, restyled, fogged, and of course unlocked. Which fields
//! count as geometric is host policy, supplied through [`GeometryPolicy`].

use crate::action::ActionKind;
use crate::error::{HistoryError, HistoryResult};
use atlas_core::{Attrs, Entity};

/// Host policy deciding whether an attribute update is geometric.
pub trait GeometryPolicy {
    /// True when going from `before` to `after` changes geometry.
    fn is_geometric(&self, before: &Attrs, after: &Attrs) -> bool;
}

/// Default policy: position, zone outline, connection route and endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometricFields;

impl GeometryPolicy for GeometricFields {
    fn is_geometric(&self, before: &Attrs, after: &Attrs) -> bool {
        !before.same_geometry(after)
    }
}

pub struct LockGuard {
    policy: Box<dyn GeometryPolicy>,
    guard_waypoints: bool,
}

impl Default for LockGuard {
    fn default() -> Self {
        Self::new(Box::new(GeometricFields), true)
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("guard_waypoints", &self.guard_waypoints)
            .finish_non_exhaustive()
    }
}

impl LockGuard {
    pub fn new(policy: Box<dyn GeometryPolicy>, guard_waypoints: bool) -> Self {
        Self {
            policy,
            guard_waypoints,
        }
    }

    /// Approve or reject `kind` against the entity's current state.
    ///
    /// `proposed` is the image the entity would take on; it is only consulted
    /// for `Update`.
    pub fn approve(
        &self,
        current: &Entity,
        kind: ActionKind,
        proposed: Option<&Attrs>,
    ) -> HistoryResult<()> {
        if !current.attrs.is_locked() {
            return Ok(());
        }
        let blocked = match kind {
            ActionKind::Create | ActionKind::FogToggle => false,
            ActionKind::Delete | ActionKind::Move | ActionKind::Reshape => true,
            ActionKind::Waypoints => self.guard_waypoints,
            ActionKind::Update => {
                proposed.is_some_and(|after| self.policy.is_geometric(&current.attrs, after))
            }
        };
        if blocked {
            log::debug!("LOCK reject {kind} on {} {}", current.kind(), current.id);
            Err(HistoryError::Locked {
                kind: current.kind(),
                id: current.id,
            })
        } else {
            Ok(())
        }
    }

    /// Approve a delete cascade: the target and every dependent must be
    /// unlocked.
    pub fn approve_cascade<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a Entity>,
    ) -> HistoryResult<()> {
        entities
            .into_iter()
            .try_for_each(|e| self.approve(e, ActionKind::Delete, None))
    }
}
