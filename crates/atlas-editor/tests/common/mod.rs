//! Shared fixtures: inspectable stores with injectable failures.

#![allow(dead_code)]

use atlas_core::{
    Attrs, ConnectionAttrs, Entity, EntityKind, EntityStore, LiveId, MemoryStore, PinAttrs,
    Point, StoreError, StoreResult, Stores,
};
use atlas_editor::{Edit, History};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    Update,
    Delete,
}

/// Fail the `skip + 1`-th `op` on the store of `kind`, once.
#[derive(Debug, Clone, Copy)]
pub struct Fault {
    pub kind: EntityKind,
    pub op: Op,
    pub skip: u32,
}

/// A memory store the test can look into and make fail.
struct SharedStore {
    kind: EntityKind,
    inner: Rc<RefCell<MemoryStore>>,
    fault: Rc<Cell<Option<Fault>>>,
}

impl SharedStore {
    fn trip(&self, op: Op) -> StoreResult<()> {
        if let Some(mut fault) = self.fault.get()
            && fault.kind == self.kind
            && fault.op == op
        {
            if fault.skip == 0 {
                self.fault.set(None);
                return Err(StoreError::Backend(format!("injected {op:?} failure")));
            }
            fault.skip -= 1;
            self.fault.set(Some(fault));
        }
        Ok(())
    }
}

impl EntityStore for SharedStore {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn create(&mut self, attrs: Attrs) -> StoreResult<Entity> {
        self.trip(Op::Create)?;
        self.inner.borrow_mut().create(attrs)
    }

    fn update(&mut self, id: LiveId, attrs: Attrs) -> StoreResult<()> {
        self.trip(Op::Update)?;
        self.inner.borrow_mut().update(id, attrs)
    }

    fn delete(&mut self, id: LiveId) -> StoreResult<()> {
        self.trip(Op::Delete)?;
        self.inner.borrow_mut().delete(id)
    }

    fn get(&self, id: LiveId) -> Option<Entity> {
        self.inner.borrow().get(id)
    }

    fn list_dependents(&self, kind: EntityKind, id: LiveId) -> StoreResult<Vec<Entity>> {
        self.inner.borrow().list_dependents(kind, id)
    }
}

/// Stores plus the handles needed to inspect them.
pub struct Map {
    pub stores: Stores,
    pub history: History,
    handles: BTreeMap<EntityKind, Rc<RefCell<MemoryStore>>>,
    fault: Rc<Cell<Option<Fault>>>,
}

impl Map {
    pub fn new() -> Self {
        Self::with_history(History::default())
    }

    pub fn with_history(history: History) -> Self {
        init_logging();
        let fault = Rc::new(Cell::new(None));
        let mut stores = Stores::new();
        let mut handles = BTreeMap::new();
        for kind in EntityKind::ALL {
            let inner = Rc::new(RefCell::new(MemoryStore::new(kind)));
            handles.insert(kind, Rc::clone(&inner));
            stores.register(Box::new(SharedStore {
                kind,
                inner,
                fault: Rc::clone(&fault),
            }));
        }
        Self {
            stores,
            history,
            handles,
            fault,
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.fault.set(Some(fault));
    }

    pub fn record(&mut self, edit: Edit) -> atlas_editor::HistoryResult<LiveId> {
        self.history.record(&mut self.stores, edit).map(|r| r.id)
    }

    pub fn create(&mut self, attrs: Attrs) -> LiveId {
        self.record(Edit::Create { attrs }).unwrap()
    }

    pub fn pin(&mut self, name: &str, x: f64, y: f64) -> LiveId {
        self.create(Attrs::Pin(PinAttrs::new(name, Point::new(x, y))))
    }

    pub fn link(&mut self, from: LiveId, to: LiveId) -> LiveId {
        self.create(Attrs::Connection(ConnectionAttrs::new(from, to)))
    }

    pub fn get(&self, kind: EntityKind, id: LiveId) -> Option<Attrs> {
        self.stores.get(kind, id).map(|e| e.attrs)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.handles[&kind].borrow().len()
    }

    pub fn all(&self, kind: EntityKind) -> Vec<Entity> {
        self.handles[&kind]
            .borrow()
            .iter()
            .map(|(id, attrs)| Entity {
                id,
                attrs: attrs.clone(),
            })
            .collect()
    }

    /// Find a live entity by its name (or text, or label).
    pub fn named(&self, kind: EntityKind, name: &str) -> Option<Entity> {
        self.all(kind).into_iter().find(|e| label(&e.attrs) == name)
    }

    /// The whole map with ids replaced by names, sorted. Two maps that
    /// differ only in which live ids were handed out dump the same.
    pub fn dump(&self) -> Vec<String> {
        let mut out: Vec<String> = EntityKind::ALL
            .into_iter()
            .flat_map(|kind| self.all(kind))
            .map(|e| {
                let Ok(named) = e.attrs.map_refs(|kind, id| {
                    Ok::<_, Infallible>(
                        self.get(kind, id)
                            .map(|a| label(&a))
                            .unwrap_or_else(|| format!("dangling {kind} {id}")),
                    )
                });
                format!("{named:?}")
            })
            .collect();
        out.sort();
        out
    }
}

pub fn label<R>(attrs: &Attrs<R>) -> String {
    match attrs {
        Attrs::Layer(a) => a.name.clone(),
        Attrs::Pin(a) => a.name.clone(),
        Attrs::Zone(a) => a.name.clone(),
        Attrs::Annotation(a) => a.text.clone(),
        Attrs::Connection(a) => a.label.clone().unwrap_or_default(),
    }
}
