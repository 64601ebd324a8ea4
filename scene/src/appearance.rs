//! Appearance refresh: derive each shape's displayed color from its collision
//! state and any active conditional recolor.
//!
//! Precedence, highest first:
//! 1. `on_collision` while colliding (only reactive shapes ever collide).
//! 2. The recolor payload of an active conditional.
//! 3. The base color: `on_no_collision`, or a conditional's snapshotted original.

#[cfg(test)]
#[path = "appearance_test.rs"]
mod appearance_test;

use crate::doc::{Body, Entity, EntityId, Scene};
use crate::rules::Transform;

/// The color `entity` should display right now. `None` for non-shapes.
#[must_use]
pub fn displayed_color(entity: &Entity) -> Option<&str> {
    let style = entity.shape()?;
    if style.reacts_to_collision && style.is_colliding {
        return Some(&style.appearance.on_collision.color);
    }
    if let Body::Conditional(cond) = &entity.body {
        if cond.state.is_transformed {
            if let Transform::Recolor { color } = &cond.rule.transform {
                return Some(color);
            }
        }
        if !cond.state.original_color.is_empty() {
            return Some(&cond.state.original_color);
        }
    }
    Some(&style.appearance.on_no_collision.color)
}

/// Recompute the displayed color. Returns `true` if it changed.
pub fn refresh(entity: &mut Entity) -> bool {
    let Some(next) = displayed_color(entity).map(str::to_string) else {
        return false;
    };
    let Some(style) = entity.shape_mut() else {
        return false;
    };
    if style.fill == next {
        return false;
    }
    style.fill = next;
    true
}

/// Refresh every shape. Returns ids whose displayed color changed.
pub fn refresh_all(scene: &mut Scene) -> Vec<EntityId> {
    scene.iter_mut().filter_map(|e| refresh(e).then_some(e.id)).collect()
}
