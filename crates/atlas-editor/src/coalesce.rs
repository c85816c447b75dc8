//! Gesture coalescing.
//!
//! A drag produces one edit per frame. Folding consecutive edits of the same
//! gesture into the entry already on top of the undo stack means a single
//! undo reverts the whole drag rather than its last frame.
//!
//! The boundary is structural, not timed: same target, same action kind, and
//! nothing else recorded in between. Hosts mark the end of a gesture
//! explicitly (pointer-up) with [`History::end_gesture`](crate::History::end_gesture).

use crate::action::{Action, ActionKind, Entry};
use smallvec::SmallVec;

/// Decides whether a candidate action merges into the top history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalescePolicy {
    mergeable: SmallVec<[ActionKind; 4]>,
}

impl Default for CoalescePolicy {
    fn default() -> Self {
        Self::new(&[ActionKind::Move, ActionKind::Reshape, ActionKind::Waypoints])
    }
}

impl CoalescePolicy {
    /// A policy merging only the given kinds. Only continuous kinds (move,
    /// reshape, waypoints) can merge; anything else listed is ignored.
    pub fn new(kinds: &[ActionKind]) -> Self {
        let mut mergeable = SmallVec::new();
        for kind in kinds.iter().copied() {
            if !kind.is_continuous() {
                log::warn!("{kind} edits cannot coalesce; ignoring");
            } else if !mergeable.contains(&kind) {
                mergeable.push(kind);
            }
        }
        Self { mergeable }
    }

    pub fn is_mergeable(&self, kind: ActionKind) -> bool {
        self.mergeable.contains(&kind)
    }

    /// True when `candidate` continues the gesture recorded in `top`.
    ///
    /// `sealed` is set when anything happened since `top` was recorded that
    /// ends the gesture: an undo, a redo, a batch boundary, or an explicit
    /// pointer-up.
    pub fn should_merge(&self, candidate: &Action, top: Option<&Entry>, sealed: bool) -> bool {
        if sealed {
            return false;
        }
        top.and_then(Entry::sole_action)
            .is_some_and(|previous| self.continues(candidate, previous))
    }

    /// True when `candidate` edits the same target with the same mergeable
    /// kind as `previous`. Compound actions never continue a gesture.
    pub fn continues(&self, candidate: &Action, previous: &Action) -> bool {
        self.is_mergeable(candidate.kind)
            && previous.kind == candidate.kind
            && previous.target == candidate.target
            && previous.children.is_empty()
            && candidate.children.is_empty()
    }

    /// Fold `candidate` into `previous`: the newest `after` wins, the
    /// first `before` is kept.
    pub fn merge(previous: &mut Action, candidate: Action) {
        previous.after = candidate.after;
    }
}
