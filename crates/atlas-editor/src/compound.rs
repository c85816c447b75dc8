//! Cascade discovery for destructive edits.
//!
//! Deleting an entity also deletes everything that references it, directly
//! or transitively: a layer takes its pins, zones and annotations along; a
//! pin takes its connections and anchored annotations. The whole cascade is
//! recorded as one [`Action`] whose children are the dependent deletes, so a
//! single undo restores all of it.
//!
//! Dependents are ordered topologically over the reference graph (an entity
//! before anything pointing at it). Restoring in that order means every
//! reference can be resolved by the time its holder is recreated.

use crate::action::{Action, ActionKind, Target};
use crate::error::HistoryResult;
use crate::rebase::IdentityMap;
use atlas_core::{Entity, EntityKind, LiveId, Stores};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, VecDeque};

type Key = (EntityKind, LiveId);

/// Every transitive dependent of `root`, referenced-first. `root` itself is
/// not included.
pub fn discover_dependents(stores: &Stores, root: &Entity) -> HistoryResult<Vec<Entity>> {
    let root_key = (root.kind(), root.id);
    // Edges run referenced → dependent.
    let mut graph: DiGraphMap<Key, ()> = DiGraphMap::new();
    graph.add_node(root_key);

    let mut found: HashMap<Key, Entity> = HashMap::new();
    let mut discovery: Vec<Key> = Vec::new();
    let mut queue = VecDeque::from([root_key]);

    while let Some(key) = queue.pop_front() {
        for dep in stores.dependents_of(key.0, key.1)? {
            let dep_key = (dep.kind(), dep.id);
            if dep_key == root_key {
                continue;
            }
            graph.add_edge(key, dep_key, ());
            if !found.contains_key(&dep_key) {
                discovery.push(dep_key);
                queue.push_back(dep_key);
                found.insert(dep_key, dep);
            }
        }
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            log::warn!(
                "reference cycle through {:?} below {} {}; using discovery order",
                cycle.node_id(),
                root.kind(),
                root.id
            );
            discovery
        }
    };

    Ok(order
        .into_iter()
        .filter_map(|key| found.remove(&key))
        .collect())
}

/// Build the delete action for `root` from its discovered cascade, bundling
/// a child delete for every dependent.
///
/// Each dependent is snapshotted now and addressed by its slot, minted and
/// bound to its current live id if it has none yet.
pub fn delete_action(ids: &mut IdentityMap, root: Entity, dependents: Vec<Entity>) -> Action {
    let children = dependents
        .into_iter()
        .map(|dep| leaf_delete(ids, dep))
        .collect();
    leaf_delete(ids, root).with_children(children)
}

fn leaf_delete(ids: &mut IdentityMap, entity: Entity) -> Action {
    let kind = entity.kind();
    let target = Target {
        kind,
        slot: ids.slot_for(kind, entity.id),
    };
    Action::new(ActionKind::Delete, target, ids.snapshot(entity.attrs), None)
}
