//! Editing operations: create, update, delete, and duplicate entities.
//!
//! These are the only entry points that change the *shape* of the scene
//! (which entities exist and how they reference each other). Each keeps the
//! derived state consistent: `group_id` back-references are rebuilt from the
//! groups' child lists, conditionals re-snapshot their revert targets,
//! sliders read their value back from their target, and displayed colors
//! are refreshed.

#[cfg(test)]
#[path = "edit_test.rs"]
mod edit_test;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::appearance;
use crate::consts::{DUPLICATE_OFFSET, DUPLICATE_SUFFIX};
use crate::doc::{Body, Entity, EntityId, EntityKind, Scene};
use crate::error::SceneError;
use crate::group;
use crate::propagation;
use crate::rules;

/// Check references an entity makes before it enters the scene.
fn validate(scene: &Scene, entity: &Entity) -> Result<(), SceneError> {
    match &entity.body {
        Body::Slider(slider) => {
            if let Some(parent) = slider.inherited_from_id {
                if parent == entity.id {
                    return Err(SceneError::SelfReference(entity.id));
                }
                if propagation::would_cycle(scene, entity.id, parent) {
                    warn!(child = %entity.id, %parent, "rejected slider inheritance cycle");
                    return Err(SceneError::InheritanceCycle { child: entity.id, parent });
                }
            }
            if slider.target_id == Some(entity.id) {
                return Err(SceneError::SelfReference(entity.id));
            }
        }
        Body::Group(group) => {
            for child in &group.child_ids {
                if *child == entity.id {
                    return Err(SceneError::SelfReference(entity.id));
                }
                if scene.get(child).is_some_and(|c| c.kind() == EntityKind::Group) {
                    return Err(SceneError::NestedGroup { group: entity.id, child: *child });
                }
            }
        }
        Body::ExternalReceiver(receiver) => {
            if receiver.target_slider_id == Some(entity.id) {
                return Err(SceneError::SelfReference(entity.id));
            }
        }
        Body::Rectangle(_) | Body::Circle(_) | Body::Conditional(_) => {}
    }
    Ok(())
}

/// Recompute derived per-entity state after a load or edit.
pub(crate) fn prepare(entity: &mut Entity) {
    rules::snapshot_originals(entity);
    appearance::refresh(entity);
}

/// Add a new entity. A nil or already-taken id is replaced with a fresh one.
///
/// # Errors
///
/// Fails if the entity references itself, nests a group, or closes an
/// inheritance cycle.
pub fn create(scene: &mut Scene, mut entity: Entity) -> Result<EntityId, SceneError> {
    if entity.id.is_nil() || scene.contains(&entity.id) {
        entity.id = Uuid::new_v4();
    }
    validate(scene, &entity)?;
    prepare(&mut entity);

    let id = entity.id;
    let kind = entity.kind();
    scene.insert(entity);
    group::rewire(scene);
    if kind == EntityKind::Slider {
        propagation::read_back(scene, id);
    }
    debug!(%id, ?kind, "entity created");
    Ok(id)
}

/// Replace an entity's configuration in place. `id` and kind never change.
///
/// Moving a group's position applies the implied delta to its current
/// children once. Transient state (collision flags, link status) carries
/// over. Returns every id whose fields changed.
///
/// # Errors
///
/// Fails if the entity is unknown, the kind differs, or validation fails.
pub fn update(scene: &mut Scene, mut entity: Entity) -> Result<Vec<EntityId>, SceneError> {
    let id = entity.id;
    let existing = scene.get(&id).ok_or(SceneError::NotFound(id))?;
    if existing.kind() != entity.kind() {
        return Err(SceneError::KindChange { id, from: existing.kind(), to: entity.kind() });
    }
    validate(scene, &entity)?;

    let (old_x, old_y) = (existing.x, existing.y);
    if let (Some(old), Some(new)) = (existing.shape(), entity.shape_mut()) {
        new.is_colliding = old.is_colliding;
    }
    if let (Some(old), Some(new)) = (existing.as_receiver(), entity.as_receiver_mut()) {
        new.link = old.link.clone();
    }

    let mut touched = Vec::new();
    if entity.kind() == EntityKind::Group {
        touched.extend(group::move_by(scene, id, entity.x - old_x, entity.y - old_y));
    }
    prepare(&mut entity);
    scene.insert(entity);
    group::rewire(scene);
    if scene.get(&id).is_some_and(|e| e.kind() == EntityKind::Slider) {
        propagation::read_back(scene, id);
    }

    if !touched.contains(&id) {
        touched.insert(0, id);
    }
    debug!(%id, touched = touched.len(), "entity updated");
    Ok(touched)
}

/// Remove an entity. Deleting a group releases its children (they are kept);
/// deleting a child removes it from its group's list.
///
/// # Errors
///
/// Fails if the entity is unknown.
pub fn delete(scene: &mut Scene, id: EntityId) -> Result<Entity, SceneError> {
    let removed = scene.remove(&id).ok_or(SceneError::NotFound(id))?;
    group::forget_child(scene, id);
    group::rewire(scene);
    debug!(%id, kind = ?removed.kind(), "entity deleted");
    Ok(removed)
}

/// Clone an entity under a new id, offset by [`DUPLICATE_OFFSET`] on both axes.
///
/// # Errors
///
/// Fails if the entity is unknown or is a group.
pub fn duplicate(scene: &mut Scene, id: EntityId) -> Result<EntityId, SceneError> {
    let source = scene.get(&id).ok_or(SceneError::NotFound(id))?;
    if source.kind() == EntityKind::Group {
        return Err(SceneError::DuplicateGroup(id));
    }
    let mut copy = source.clone();
    copy.id = Uuid::new_v4();
    copy.name = format!("{}{DUPLICATE_SUFFIX}", source.name);
    copy.x += DUPLICATE_OFFSET;
    copy.y += DUPLICATE_OFFSET;
    copy.group_id = None;
    create(scene, copy)
}
