//! Movement resolver: one drag-move sample in, one committed (or rejected) move out.
//!
//! The proposed position is clamped to the scene first. A grouped entity hands
//! the resulting delta to its group and skips obstacle checks. An ungrouped
//! shape is tested as a ghost at the full proposed position against every
//! obstacle; any overlap rejects the whole move for this sample, including
//! the unblocked axis.

#[cfg(test)]
#[path = "movement_test.rs"]
mod movement_test;

use tracing::trace;

use crate::collision::{self, Aabb};
use crate::doc::{EntityId, EntityKind, Scene};
use crate::group;
use crate::viewport::{Point, Viewport};

/// Result of resolving one drag-move sample.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The entity was moved to `(x, y)`.
    Moved { id: EntityId, x: f64, y: f64 },
    /// The move was redirected to the entity's group; `moved` lists the group
    /// and every child that moved.
    GroupMoved { group_id: EntityId, moved: Vec<EntityId> },
    /// One or more obstacles overlap the proposed position.
    Blocked { by: Vec<EntityId> },
    /// The dragged entity no longer exists.
    Missing,
}

impl MoveOutcome {
    /// Ids whose position changed and must be persisted and redrawn.
    #[must_use]
    pub fn moved_ids(&self) -> Vec<EntityId> {
        match self {
            Self::Moved { id, .. } => vec![*id],
            Self::GroupMoved { moved, .. } => moved.clone(),
            Self::Blocked { .. } | Self::Missing => Vec::new(),
        }
    }
}

/// Resolve a drag of `id` toward scene position `proposed` (bottom-left origin).
pub fn resolve_drag(scene: &mut Scene, viewport: &Viewport, id: EntityId, proposed: Point) -> MoveOutcome {
    let Some(entity) = scene.get(&id) else {
        return MoveOutcome::Missing;
    };

    if entity.kind() == EntityKind::Group {
        let moved = group::move_to(scene, id, proposed.x, proposed.y);
        return MoveOutcome::GroupMoved { group_id: id, moved };
    }

    let (w, h) = entity.extent().unwrap_or((0.0, 0.0));
    let target = viewport.clamp(proposed, w, h);

    let group_id = entity
        .group_id
        .filter(|g| scene.get(g).is_some_and(|e| e.kind() == EntityKind::Group));
    if let Some(group_id) = group_id {
        let (dx, dy) = (target.x - entity.x, target.y - entity.y);
        let moved = group::move_by(scene, group_id, dx, dy);
        return MoveOutcome::GroupMoved { group_id, moved };
    }

    if collision::is_collidable(entity.kind()) {
        let ghost = Aabb::new(target.x, target.y, w, h);
        let by = collision::blocking_obstacles(scene, id, &ghost);
        if !by.is_empty() {
            trace!(%id, x = target.x, y = target.y, blockers = by.len(), "move blocked by obstacle");
            return MoveOutcome::Blocked { by };
        }
    }

    let Some(entity) = scene.get_mut(&id) else {
        return MoveOutcome::Missing;
    };
    entity.x = target.x;
    entity.y = target.y;
    MoveOutcome::Moved { id, x: target.x, y: target.y }
}
