//! Entity store contract and the in-memory reference store.
//!
//! Persistence lives outside this crate. Each entity kind is served by one
//! [`EntityStore`] adapter; a [`Stores`] registry holds one adapter per kind
//! and fans dependent lookups out across all of them.
//!
//! ## Contract
//!
//! - A store never reuses a [`LiveId`] it has handed out, even after the
//!   entity is deleted. Auto-incrementing surrogate keys satisfy this.
//! - `delete` removes only the named entity. Cascades are the caller's job.
//! - `list_dependents(kind, id)` returns the entities *of this store's kind*
//!   that reference `(kind, id)`, in ascending id order.

use crate::id::LiveId;
use crate::model::{Attrs, Entity, EntityKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure reported by an entity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: LiveId },
    #[error("{store} store cannot hold a {found}")]
    KindMismatch {
        store: EntityKind,
        found: EntityKind,
    },
    #[error("no store registered for {0}")]
    MissingStore(EntityKind),
    #[error("store backend failed: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-kind persistence adapter.
pub trait EntityStore {
    /// The kind of entity this store holds.
    fn kind(&self) -> EntityKind;

    /// Insert a new entity and return it with its freshly assigned id.
    fn create(&mut self, attrs: Attrs) -> StoreResult<Entity>;

    /// Overwrite all attributes of an existing entity.
    fn update(&mut self, id: LiveId, attrs: Attrs) -> StoreResult<()>;

    fn delete(&mut self, id: LiveId) -> StoreResult<()>;

    fn get(&self, id: LiveId) -> Option<Entity>;

    /// Entities of this store's kind that reference `(kind, id)`.
    fn list_dependents(&self, kind: EntityKind, id: LiveId) -> StoreResult<Vec<Entity>>;
}

// ─── Registry ────────────────────────────────────────────────────────────

/// One store per entity kind.
#[derive(Default)]
pub struct Stores {
    stores: BTreeMap<EntityKind, Box<dyn EntityStore>>,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry backed by a fresh [`MemoryStore`] for every kind.
    pub fn in_memory() -> Self {
        let mut stores = Self::new();
        for kind in EntityKind::ALL {
            stores.register(Box::new(MemoryStore::new(kind)));
        }
        stores
    }

    /// Register a store, replacing any previous store of the same kind.
    pub fn register(&mut self, store: Box<dyn EntityStore>) -> Option<Box<dyn EntityStore>> {
        self.stores.insert(store.kind(), store)
    }

    pub fn store(&self, kind: EntityKind) -> StoreResult<&dyn EntityStore> {
        self.stores
            .get(&kind)
            .map(|s| s.as_ref())
            .ok_or(StoreError::MissingStore(kind))
    }

    pub fn store_mut(&mut self, kind: EntityKind) -> StoreResult<&mut (dyn EntityStore + 'static)> {
        self.stores
            .get_mut(&kind)
            .map(|s| s.as_mut())
            .ok_or(StoreError::MissingStore(kind))
    }

    pub fn create(&mut self, attrs: Attrs) -> StoreResult<Entity> {
        let kind = attrs.kind();
        let entity = self.store_mut(kind)?.create(attrs)?;
        log::trace!("STORE create {kind} {}", entity.id);
        Ok(entity)
    }

    pub fn update(&mut self, id: LiveId, attrs: Attrs) -> StoreResult<()> {
        let kind = attrs.kind();
        log::trace!("STORE update {kind} {id}");
        self.store_mut(kind)?.update(id, attrs)
    }

    pub fn delete(&mut self, kind: EntityKind, id: LiveId) -> StoreResult<()> {
        log::trace!("STORE delete {kind} {id}");
        self.store_mut(kind)?.delete(id)
    }

    pub fn get(&self, kind: EntityKind, id: LiveId) -> Option<Entity> {
        self.stores.get(&kind).and_then(|s| s.get(id))
    }

    /// Direct dependents of `(kind, id)` across every registered store,
    /// grouped by store in [`EntityKind::ALL`] order.
    pub fn dependents_of(&self, kind: EntityKind, id: LiveId) -> StoreResult<Vec<Entity>> {
        let mut out = Vec::new();
        for store in self.stores.values() {
            out.extend(store.list_dependents(kind, id)?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.stores.keys()).finish()
    }
}

// ─── In-memory store ─────────────────────────────────────────────────────

/// Map-backed store with monotonically increasing ids.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    kind: EntityKind,
    entities: BTreeMap<LiveId, Attrs>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LiveId, &Attrs)> {
        self.entities.iter().map(|(id, attrs)| (*id, attrs))
    }

    fn check_kind(&self, attrs: &Attrs) -> StoreResult<()> {
        if attrs.kind() == self.kind {
            Ok(())
        } else {
            Err(StoreError::KindMismatch {
                store: self.kind,
                found: attrs.kind(),
            })
        }
    }
}

impl EntityStore for MemoryStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn create(&mut self, attrs: Attrs) -> StoreResult<Entity> {
        self.check_kind(&attrs)?;
        let id = LiveId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, attrs.clone());
        Ok(Entity { id, attrs })
    }

    fn update(&mut self, id: LiveId, attrs: Attrs) -> StoreResult<()> {
        self.check_kind(&attrs)?;
        match self.entities.get_mut(&id) {
            Some(slot) => {
                *slot = attrs;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: self.kind,
                id,
            }),
        }
    }

    fn delete(&mut self, id: LiveId) -> StoreResult<()> {
        self.entities
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                kind: self.kind,
                id,
            })
    }

    fn get(&self, id: LiveId) -> Option<Entity> {
        self.entities.get(&id).map(|attrs| Entity {
            id,
            attrs: attrs.clone(),
        })
    }

    fn list_dependents(&self, kind: EntityKind, id: LiveId) -> StoreResult<Vec<Entity>> {
        Ok(self
            .entities
            .iter()
            .filter(|(_, attrs)| attrs.references(kind, &id))
            .map(|(dep, attrs)| Entity {
                id: *dep,
                attrs: attrs.clone(),
            })
            .collect())
    }
}
