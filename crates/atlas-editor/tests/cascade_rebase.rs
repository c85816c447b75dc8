//! Integration tests: cascading deletes and identity rebasing (atlas-editor).
//!
//! Deleting an entity takes its dependents along in one history entry.
//! Undoing recreates everything under fresh live ids, and every reference,
//! in the restored entities and in older history entries, follows.

mod common;

use atlas_core::{AnnotationAttrs, Attrs, EntityKind, LayerAttrs, LiveId, PinAttrs, Point};
use atlas_editor::{Edit, HistoryError, Outcome};
use common::{Fault, Map, Op};
use pretty_assertions::assert_eq;

fn delete(kind: EntityKind, id: LiveId) -> Edit {
    Edit::Delete { kind, id }
}

fn endpoints(map: &Map, id: LiveId) -> (LiveId, LiveId) {
    match map.get(EntityKind::Connection, id) {
        Some(Attrs::Connection(link)) => (link.from, link.to),
        other => panic!("expected connection {id}, got {other:?}"),
    }
}

#[test]
fn delete_pin_takes_links_and_undo_rewires_them() {
    let mut map = Map::new();
    let p1 = map.pin("P1", 0.0, 0.0);
    let p2 = map.pin("P2", 10.0, 0.0);
    let p3 = map.pin("P3", 0.0, 10.0);
    map.link(p1, p2);
    map.link(p1, p3);
    let undo_before = map.history.undo_count();

    map.record(delete(EntityKind::Pin, p1)).unwrap();
    assert_eq!(map.history.undo_count(), undo_before + 1);
    assert!(map.get(EntityKind::Pin, p1).is_none());
    assert_eq!(map.count(EntityKind::Connection), 0);
    assert_eq!(
        map.history.undo_descriptions().next(),
        Some("Delete pin and 2 dependents")
    );

    map.history.undo(&mut map.stores).unwrap();
    let restored = map.named(EntityKind::Pin, "P1").unwrap();
    assert_ne!(restored.id, p1, "stores never reuse ids");
    assert_eq!(map.count(EntityKind::Pin), 3);
    assert_eq!(map.count(EntityKind::Connection), 2);
    let mut ends: Vec<(LiveId, LiveId)> = map
        .all(EntityKind::Connection)
        .iter()
        .map(|link| endpoints(&map, link.id))
        .collect();
    ends.sort();
    assert_eq!(ends, vec![(restored.id, p2), (restored.id, p3)]);

    map.history.redo(&mut map.stores).unwrap();
    assert_eq!(map.count(EntityKind::Pin), 2);
    assert_eq!(map.count(EntityKind::Connection), 0);
    assert!(map.get(EntityKind::Pin, restored.id).is_none());
}

#[test]
fn repeated_undo_redo_keeps_rebinding() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    let b = map.pin("B", 1.0, 1.0);
    map.link(a, b);
    map.record(delete(EntityKind::Pin, a)).unwrap();
    let deleted = map.dump();

    map.history.undo(&mut map.stores).unwrap();
    let restored = map.dump();
    for _ in 0..3 {
        map.history.redo(&mut map.stores).unwrap();
        assert_eq!(map.dump(), deleted);
        map.history.undo(&mut map.stores).unwrap();
        assert_eq!(map.dump(), restored);
    }
}

#[test]
fn older_entries_follow_the_recreated_entity() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    map.record(Edit::Move {
        kind: EntityKind::Pin,
        id: a,
        to: Point::new(5.0, 5.0),
    })
    .unwrap();
    map.record(delete(EntityKind::Pin, a)).unwrap();

    // Undo the delete, then the move: the move must land on the new pin.
    map.history.undo(&mut map.stores).unwrap();
    map.history.undo(&mut map.stores).unwrap();
    let pin = map.named(EntityKind::Pin, "A").unwrap();
    assert_eq!(pin.attrs.position(), Some(Point::ZERO));

    // Undo the create too, then redo all three.
    map.history.undo(&mut map.stores).unwrap();
    assert_eq!(map.count(EntityKind::Pin), 0);
    for _ in 0..2 {
        map.history.redo(&mut map.stores).unwrap();
    }
    let pin = map.named(EntityKind::Pin, "A").unwrap();
    assert_eq!(pin.attrs.position(), Some(Point::new(5.0, 5.0)));
    map.history.redo(&mut map.stores).unwrap();
    assert_eq!(map.count(EntityKind::Pin), 0);
}

#[test]
fn undo_create_then_redo_rebinds_links_created_later() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    let b = map.pin("B", 1.0, 1.0);
    let road = map.link(a, b);

    // Undo the link and the second pin, redo both: the link must point at
    // the recreated B.
    map.history.undo(&mut map.stores).unwrap();
    map.history.undo(&mut map.stores).unwrap();
    map.history.redo(&mut map.stores).unwrap();
    map.history.redo(&mut map.stores).unwrap();

    let new_b = map.named(EntityKind::Pin, "B").unwrap().id;
    assert_ne!(new_b, b);
    let link = map.all(EntityKind::Connection).pop().unwrap();
    assert_ne!(link.id, road);
    assert_eq!(endpoints(&map, link.id), (a, new_b));
}

#[test]
fn layer_cascade_restores_nested_dependents() {
    let mut map = Map::new();
    let layer = map.create(Attrs::Layer(LayerAttrs::new("Roads", 0)));
    let on_layer = |name: &str, x: f64| {
        let mut pin = PinAttrs::new(name, Point::new(x, 0.0));
        pin.layer = Some(layer);
        Attrs::Pin(pin)
    };
    let a = map.create(on_layer("A", 0.0));
    let b = map.create(on_layer("B", 5.0));
    let off = map.pin("Off", 9.0, 9.0);
    map.link(a, b);
    map.link(b, off);
    let mut note = AnnotationAttrs::new("Toll", Point::new(2.0, 2.0));
    note.layer = Some(layer);
    note.anchor = Some(a);
    map.create(Attrs::Annotation(note));
    let before = map.dump();

    map.record(delete(EntityKind::Layer, layer)).unwrap();
    assert_eq!(map.count(EntityKind::Layer), 0);
    assert_eq!(map.count(EntityKind::Annotation), 0);
    assert_eq!(map.count(EntityKind::Connection), 0);
    assert_eq!(map.all(EntityKind::Pin).len(), 1, "only the off-layer pin");
    // Layer + A + B + annotation + 2 links, annotation counted once.
    assert_eq!(
        map.history.peek_undo().map(|e| e.actions[0].affected()),
        Some(6)
    );

    map.history.undo(&mut map.stores).unwrap();
    assert_eq!(map.dump(), before);

    map.history.redo(&mut map.stores).unwrap();
    assert_eq!(map.all(EntityKind::Pin).len(), 1);
}

#[test]
fn locked_dependent_blocks_the_cascade() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    let b = map.pin("B", 1.0, 1.0);
    let road = map.link(a, b);
    let mut attrs = map.get(EntityKind::Connection, road).unwrap();
    attrs.set_locked(true);
    map.record(Edit::Update { id: road, attrs }).unwrap();
    let before = map.dump();

    assert_eq!(
        map.record(delete(EntityKind::Pin, a)),
        Err(HistoryError::Locked {
            kind: EntityKind::Connection,
            id: road
        })
    );
    assert_eq!(map.dump(), before);
}

#[test]
fn failed_cascade_delete_is_rolled_back() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    let b = map.pin("B", 1.0, 1.0);
    map.link(a, b);
    map.link(b, a);
    let before = map.dump();
    let undo_before = map.history.undo_count();

    // Both links go first, then the pin itself fails.
    map.fail(Fault {
        kind: EntityKind::Pin,
        op: Op::Delete,
        skip: 0,
    });
    assert!(map.record(delete(EntityKind::Pin, a)).is_err());
    assert_eq!(map.dump(), before);
    assert_eq!(map.history.undo_count(), undo_before);

    // The retry deletes cleanly and undoes cleanly.
    map.record(delete(EntityKind::Pin, a)).unwrap();
    assert_eq!(map.count(EntityKind::Connection), 0);
    assert!(matches!(
        map.history.undo(&mut map.stores).unwrap(),
        Outcome::Applied(_)
    ));
    assert_eq!(map.dump(), before);
}

#[test]
fn failed_restore_leaves_entry_on_undo_stack() {
    let mut map = Map::new();
    let a = map.pin("A", 0.0, 0.0);
    let b = map.pin("B", 1.0, 1.0);
    map.link(a, b);
    let before = map.dump();
    map.record(delete(EntityKind::Pin, a)).unwrap();
    let deleted = map.dump();

    // The pin comes back, then the link fails; the pin is removed again.
    map.fail(Fault {
        kind: EntityKind::Connection,
        op: Op::Create,
        skip: 0,
    });
    assert!(map.history.undo(&mut map.stores).is_err());
    assert_eq!(map.dump(), deleted);
    assert!(!map.history.can_redo());

    map.history.undo(&mut map.stores).unwrap();
    assert_eq!(map.dump(), before);
}
