//! Identity rebasing: slot → live id bookkeeping.
//!
//! Stores never reuse ids, so an entity recreated by undo comes back under a
//! new [`LiveId`]. Actions address entities by [`SlotId`] instead; the
//! identity map tracks which live id currently stands for each slot and is
//! rebound on every (re)creation.

use crate::action::Snapshot;
use crate::error::{HistoryError, HistoryResult};
use atlas_core::{Attrs, EntityKind, LiveId, SlotId};
use std::collections::HashMap;
use std::convert::Infallible;

#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    live: HashMap<(EntityKind, SlotId), LiveId>,
    slots: HashMap<(EntityKind, LiveId), SlotId>,
    next_slot: SlotId,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current live id of a slot.
    pub fn resolve(&self, kind: EntityKind, slot: SlotId) -> HistoryResult<LiveId> {
        self.live
            .get(&(kind, slot))
            .copied()
            .ok_or(HistoryError::UnboundSlot { kind, slot })
    }

    /// Point `slot` at `live`, replacing any previous binding of the slot.
    pub fn bind(&mut self, kind: EntityKind, slot: SlotId, live: LiveId) {
        if let Some(stale) = self.live.insert((kind, slot), live) {
            self.slots.remove(&(kind, stale));
        }
        self.slots.insert((kind, live), slot);
        log::trace!("REBASE {kind} {slot} -> {live}");
    }

    /// The slot currently bound to `live`, if any.
    pub fn slot_of(&self, kind: EntityKind, live: LiveId) -> Option<SlotId> {
        self.slots.get(&(kind, live)).copied()
    }

    /// The slot bound to `live`, minting and binding a fresh one the first
    /// time an entity is seen.
    pub fn slot_for(&mut self, kind: EntityKind, live: LiveId) -> SlotId {
        if let Some(slot) = self.slot_of(kind, live) {
            return slot;
        }
        let slot = self.mint();
        self.bind(kind, slot, live);
        slot
    }

    /// Allocate a slot bound to nothing yet.
    pub fn mint(&mut self) -> SlotId {
        let slot = self.next_slot;
        self.next_slot = slot.next();
        slot
    }

    /// Convert a live image to a snapshot, naming every reference by slot.
    pub fn snapshot(&mut self, attrs: Attrs) -> Snapshot {
        let Ok(snapshot) =
            attrs.map_refs(|kind, live| Ok::<_, Infallible>(self.slot_for(kind, live)));
        snapshot
    }

    /// Convert a snapshot back to a live image, resolving every reference
    /// through the current bindings.
    pub fn rebase(&self, snapshot: &Snapshot) -> HistoryResult<Attrs> {
        snapshot
            .clone()
            .map_refs(|kind, slot| self.resolve(kind, slot))
    }

    /// Drop every binding. Slot numbering keeps counting up.
    pub fn clear(&mut self) {
        self.live.clear();
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_core::ConnectionAttrs;
    use pretty_assertions::assert_eq;

    #[test]
    fn slot_for_is_stable() {
        let mut ids = IdentityMap::new();
        let a = ids.slot_for(EntityKind::Pin, LiveId(1));
        let b = ids.slot_for(EntityKind::Pin, LiveId(1));
        let c = ids.slot_for(EntityKind::Zone, LiveId(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(ids.resolve(EntityKind::Pin, a), Ok(LiveId(1)));
    }

    #[test]
    fn rebind_replaces_reverse_entry() {
        let mut ids = IdentityMap::new();
        let slot = ids.slot_for(EntityKind::Pin, LiveId(1));
        ids.bind(EntityKind::Pin, slot, LiveId(9));

        assert_eq!(ids.resolve(EntityKind::Pin, slot), Ok(LiveId(9)));
        assert_eq!(ids.slot_of(EntityKind::Pin, LiveId(9)), Some(slot));
        assert_eq!(ids.slot_of(EntityKind::Pin, LiveId(1)), None);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn unknown_slot_is_an_error() {
        let mut ids = IdentityMap::new();
        let slot = ids.mint();
        assert_eq!(
            ids.resolve(EntityKind::Layer, slot),
            Err(HistoryError::UnboundSlot {
                kind: EntityKind::Layer,
                slot
            })
        );
    }

    #[test]
    fn rebase_follows_rebinding() {
        let mut ids = IdentityMap::new();
        let link: Attrs = Attrs::Connection(ConnectionAttrs::new(LiveId(1), LiveId(2)));
        let snap = ids.snapshot(link);

        // Pin #1 was deleted and recreated as #7.
        let from = ids.slot_of(EntityKind::Pin, LiveId(1)).unwrap();
        ids.bind(EntityKind::Pin, from, LiveId(7));

        match ids.rebase(&snap).unwrap() {
            Attrs::Connection(c) => {
                assert_eq!(c.from, LiveId(7));
                assert_eq!(c.to, LiveId(2));
            }
            other => panic!("expected connection, got {other:?}"),
        }
    }
}
