//! Axis-aligned overlap testing, the per-frame collision pass, and hit-testing.
//!
//! Collision is discrete and rotation-blind: every shape is reduced to its
//! bounding box `(x, y, w, h)` and boxes that share only an edge do not
//! collide. Sliders, receivers, and groups never take part.

#[cfg(test)]
#[path = "collision_test.rs"]
mod collision_test;

use std::collections::HashSet;

use crate::doc::{Entity, EntityId, EntityKind, Scene};
use crate::viewport::Point;

/// An axis-aligned box in scene coordinates (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Aabb {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The same box moved to `(x, y)`.
    #[must_use]
    pub fn at(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }

    /// Whether `pt` lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.w && pt.y >= self.y && pt.y <= self.y + self.h
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let top = (self.y + self.h).max(other.y + other.h);
        Self { x, y, w: right - x, h: top - y }
    }
}

/// Strict overlap test; touching edges do not count.
#[must_use]
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Whether `kind` takes part in collision and obstacle checks.
#[must_use]
pub fn is_collidable(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Rectangle | EntityKind::Circle | EntityKind::Conditional)
}

/// Collision box of a shape entity. `None` for kinds that never collide.
#[must_use]
pub fn aabb(entity: &Entity) -> Option<Aabb> {
    if !is_collidable(entity.kind()) {
        return None;
    }
    let (w, h) = entity.extent()?;
    Some(Aabb::new(entity.x, entity.y, w, h))
}

/// Footprint used for pointer hit-testing. Covers every visible kind.
#[must_use]
pub fn footprint(entity: &Entity) -> Option<Aabb> {
    let (w, h) = entity.extent()?;
    Some(Aabb::new(entity.x, entity.y, w, h))
}

/// Reset every shape's `is_colliding`, then mark both sides of each
/// overlapping pair (subject to `reacts_to_collision`).
///
/// Returns the ids that ended up colliding.
pub fn detect_all(scene: &mut Scene) -> HashSet<EntityId> {
    let boxes: Vec<(EntityId, Aabb, bool)> = scene
        .sorted_entities()
        .into_iter()
        .filter_map(|e| {
            let reacts = e.shape()?.reacts_to_collision;
            Some((e.id, aabb(e)?, reacts))
        })
        .collect();

    let mut colliding = HashSet::new();
    for (i, (id_a, box_a, reacts_a)) in boxes.iter().enumerate() {
        for (id_b, box_b, reacts_b) in &boxes[i + 1..] {
            if !overlaps(box_a, box_b) {
                continue;
            }
            if *reacts_a {
                colliding.insert(*id_a);
            }
            if *reacts_b {
                colliding.insert(*id_b);
            }
        }
    }

    for entity in scene.iter_mut() {
        let id = entity.id;
        if let Some(style) = entity.shape_mut() {
            style.is_colliding = colliding.contains(&id);
        }
    }
    colliding
}

/// Ids of obstacles that a box at `candidate` would overlap, excluding `self_id`.
#[must_use]
pub fn blocking_obstacles(scene: &Scene, self_id: EntityId, candidate: &Aabb) -> Vec<EntityId> {
    scene
        .iter()
        .filter(|e| e.id != self_id && e.shape().is_some_and(|s| s.is_obstacle))
        .filter_map(|e| aabb(e).map(|b| (e.id, b)))
        .filter(|(_, b)| overlaps(candidate, b))
        .map(|(id, _)| id)
        .collect()
}

/// Topmost draggable entity under `pt` (scene coordinates). Groups are never hit.
#[must_use]
pub fn hit_test(scene: &Scene, pt: Point) -> Option<EntityId> {
    scene
        .sorted_entities()
        .into_iter()
        .rev()
        .find(|e| footprint(e).is_some_and(|b| b.contains(pt)))
        .map(|e| e.id)
}
