//! Group propagation: a group move becomes the same delta on every child.
//!
//! Groups own no geometry of their own. Their `x`/`y` is bookkeeping that moves
//! with the children, and `bounds` is the union of the children's footprints,
//! refreshed whenever membership changes. Group moves never consult obstacles.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use tracing::{debug, warn};

use crate::collision::{self, Aabb};
use crate::doc::{EntityId, EntityKind, Scene};

/// Move `group_id` and every resolved child by `(dx, dy)`.
///
/// Returns the ids that moved: the group first, then each child. Unresolved
/// children are skipped; an unresolved group is a no-op.
pub fn move_by(scene: &mut Scene, group_id: EntityId, dx: f64, dy: f64) -> Vec<EntityId> {
    let Some(group) = scene.get_mut(&group_id) else {
        return Vec::new();
    };
    let Some(body) = group.as_group_mut() else {
        return Vec::new();
    };
    if let Some(bounds) = body.bounds.as_mut() {
        bounds.x += dx;
        bounds.y += dy;
    }
    let child_ids = body.child_ids.clone();
    group.x += dx;
    group.y += dy;

    let mut moved = vec![group_id];
    for child_id in child_ids {
        let Some(child) = scene.get_mut(&child_id) else {
            warn!(group = %group_id, child = %child_id, "group child unresolved");
            continue;
        };
        child.x += dx;
        child.y += dy;
        moved.push(child_id);
    }
    debug!(group = %group_id, dx, dy, children = moved.len() - 1, "group moved");
    moved
}

/// Move a group so its position becomes `(x, y)`, applying the implied delta
/// to the children once.
pub fn move_to(scene: &mut Scene, group_id: EntityId, x: f64, y: f64) -> Vec<EntityId> {
    let Some(group) = scene.get(&group_id) else {
        return Vec::new();
    };
    let (dx, dy) = (x - group.x, y - group.y);
    if dx == 0.0 && dy == 0.0 {
        return Vec::new();
    }
    move_by(scene, group_id, dx, dy)
}

/// Union of the footprints of the group's resolved children.
#[must_use]
pub fn children_bounds(scene: &Scene, group_id: EntityId) -> Option<Aabb> {
    let group = scene.get(&group_id)?.as_group()?;
    group
        .child_ids
        .iter()
        .filter_map(|id| scene.get(id))
        .filter_map(collision::footprint)
        .reduce(|acc, b| acc.union(&b))
}

/// Recompute `bounds` for one group.
pub fn refresh_bounds(scene: &mut Scene, group_id: EntityId) {
    let bounds = children_bounds(scene, group_id);
    if let Some(group) = scene.get_mut(&group_id).and_then(|e| e.as_group_mut()) {
        group.bounds = bounds;
    }
}

/// Rebuild every `group_id` back-reference from the groups' `child_ids`.
///
/// Children listed by a group get that group's id; entities that no group
/// lists lose theirs. Groups themselves never carry a `group_id`, and an id
/// already claimed by an earlier group stays with it.
pub fn rewire(scene: &mut Scene) {
    let groups = scene.ids_of_kind(EntityKind::Group);
    let mut owner: Vec<(EntityId, EntityId)> = Vec::new();
    for group_id in &groups {
        let Some(group) = scene.get(group_id).and_then(|e| e.as_group()) else {
            continue;
        };
        for child_id in &group.child_ids {
            let is_leaf = scene.get(child_id).is_some_and(|c| c.kind() != EntityKind::Group);
            let claimed = owner.iter().any(|(c, _)| c == child_id);
            if is_leaf && !claimed {
                owner.push((*child_id, *group_id));
            }
        }
    }

    for entity in scene.iter_mut() {
        entity.group_id = owner.iter().find(|(c, _)| *c == entity.id).map(|(_, g)| *g);
    }
    for group_id in groups {
        refresh_bounds(scene, group_id);
    }
}

/// Strip `id` from every group's child list.
pub fn forget_child(scene: &mut Scene, id: EntityId) {
    for entity in scene.iter_mut() {
        if let Some(group) = entity.as_group_mut() {
            group.child_ids.retain(|c| *c != id);
        }
    }
}
