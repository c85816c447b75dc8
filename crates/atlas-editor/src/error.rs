use atlas_core::{EntityKind, LiveId, SlotId, StoreError};
use thiserror::Error;

/// Why a record, undo or redo call was rejected or aborted.
///
/// None of these leave the history half-updated: stacks only move after a
/// call fully succeeds, so every failed call can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Destructive or geometric edit on a locked entity.
    #[error("{kind} {id} is locked")]
    Locked { kind: EntityKind, id: LiveId },

    /// The target vanished out-of-band.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: LiveId },

    /// A snapshot names a slot the identity map has never seen.
    #[error("no live {kind} bound to {slot}")]
    UnboundSlot { kind: EntityKind, slot: SlotId },

    /// The edit makes no sense for the target's kind (e.g. reshaping a pin).
    #[error("{edit} does not apply to a {kind}")]
    Unsupported { edit: &'static str, kind: EntityKind },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for HistoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => HistoryError::NotFound { kind, id },
            other => HistoryError::Store(other),
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;
