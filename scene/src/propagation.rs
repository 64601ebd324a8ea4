//! Value propagation: slider → target writes, parent → child slider
//! inheritance, and external samples → slider.
//!
//! DESIGN
//! ======
//! A slider's `value` lives in its own `[min, max]` domain. Whenever it
//! changes, the bound target property is overwritten with it. Angular
//! properties are stored in radians and presented in degrees. A position
//! write on a group becomes a group move. A slider that targets another
//! slider's `value` cascades. A visited set stops slider → slider target
//! loops after one lap.
//!
//! Inherited sliders are recomputed every frame from their parent. They are
//! processed parents-first, so a chain settles in a single pass. Sliders
//! caught in an inheritance cycle are reported and left untouched.

#[cfg(test)]
#[path = "propagation_test.rs"]
mod propagation_test;

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::consts::{DEG_TO_RAD, RAD_TO_DEG};
use crate::doc::{EntityId, EntityKind, Scene};
use crate::error::SceneError;
use crate::group;
use crate::property::{self, Property};

/// Linearly remap `value` from `from` into `to`, rounded to a whole number.
/// A degenerate source domain maps to the bottom of the target domain.
#[must_use]
pub fn remap(value: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    let (from_min, from_max) = from;
    let (to_min, to_max) = to;
    if from_max == from_min {
        return to_min;
    }
    ((value - from_min) / (from_max - from_min) * (to_max - to_min) + to_min).round()
}

/// Write `slider_id`'s current value into its bound target.
///
/// Returns the ids whose fields changed. Unresolved targets, non-slider ids,
/// and properties the target kind does not carry are silent no-ops.
pub fn drive_target(scene: &mut Scene, slider_id: EntityId) -> Vec<EntityId> {
    let mut visited = HashSet::new();
    let mut touched = Vec::new();
    drive_target_inner(scene, slider_id, &mut visited, &mut touched);
    touched
}

fn drive_target_inner(
    scene: &mut Scene,
    slider_id: EntityId,
    visited: &mut HashSet<EntityId>,
    touched: &mut Vec<EntityId>,
) {
    if !visited.insert(slider_id) {
        return;
    }
    let Some(slider) = scene.get(&slider_id).and_then(|e| e.as_slider()) else {
        return;
    };
    let (target_id, prop, value) = (slider.target_id, slider.target_property, slider.value);
    let Some(target) = scene.resolve(target_id) else {
        return;
    };
    let target_id = target.id;
    if prop == Property::Value && target.kind() == EntityKind::Slider && inherits(scene, target_id) {
        trace!(slider = %slider_id, target = %target_id, "target slider is inherited; value not written");
        return;
    }
    let converted = if prop.is_angular() { value * DEG_TO_RAD } else { value };

    if target.kind() == EntityKind::Group && prop.is_position() {
        let (x, y) = match prop {
            Property::X => (converted, target.y),
            _ => (target.x, converted),
        };
        touched.extend(group::move_to(scene, target_id, x, y));
        return;
    }

    let Some(target) = scene.get_mut(&target_id) else {
        return;
    };
    if !property::write(target, prop, converted) {
        trace!(slider = %slider_id, target = %target_id, ?prop, "target does not carry property");
        return;
    }
    touched.push(target_id);
    if target.kind() == EntityKind::Slider && prop == Property::Value {
        drive_target_inner(scene, target_id, visited, touched);
    }
}

/// Set a slider's value from direct user input and drive its target.
///
/// # Errors
///
/// Fails if `slider_id` is unknown, is not a slider, or inherits its value.
pub fn set_value(scene: &mut Scene, slider_id: EntityId, value: f64) -> Result<Vec<EntityId>, SceneError> {
    let entity = scene.get(&slider_id).ok_or(SceneError::NotFound(slider_id))?;
    if entity.as_slider().is_none() {
        return Err(SceneError::KindMismatch { id: slider_id, expected: EntityKind::Slider, found: entity.kind() });
    }
    if inherits(scene, slider_id) {
        return Err(SceneError::InheritedSlider(slider_id));
    }
    Ok(assign(scene, slider_id, value))
}

/// Whether `slider_id` currently inherits from a live parent slider. A
/// dangling `inherited_from_id` counts as absent.
#[must_use]
pub fn inherits(scene: &Scene, slider_id: EntityId) -> bool {
    scene
        .get(&slider_id)
        .and_then(|e| e.as_slider())
        .and_then(|s| scene.resolve(s.inherited_from_id))
        .is_some_and(|p| p.kind() == EntityKind::Slider)
}

/// Clamp, store, and drive. The slider itself is the first touched id.
fn assign(scene: &mut Scene, slider_id: EntityId, value: f64) -> Vec<EntityId> {
    let Some(slider) = scene.get_mut(&slider_id).and_then(|e| e.as_slider_mut()) else {
        return Vec::new();
    };
    slider.value = slider.clamp(value);
    let mut touched = vec![slider_id];
    touched.extend(drive_target(scene, slider_id));
    touched
}

/// Initialise a slider's value from its target's current property
/// (radians shown as degrees). Inherited sliders are left alone.
pub fn read_back(scene: &mut Scene, slider_id: EntityId) -> bool {
    let Some(slider) = scene.get(&slider_id).and_then(|e| e.as_slider()) else {
        return false;
    };
    if inherits(scene, slider_id) {
        return false;
    }
    let prop = slider.target_property;
    let Some(current) = scene.resolve(slider.target_id).and_then(|t| property::read_number(t, prop)) else {
        return false;
    };
    let shown = if prop.is_angular() { current * RAD_TO_DEG } else { current };
    let Some(slider) = scene.get_mut(&slider_id).and_then(|e| e.as_slider_mut()) else {
        return false;
    };
    slider.value = slider.clamp(shown);
    true
}

/// Whether making `child_id` inherit from `parent_id` would close a cycle.
#[must_use]
pub fn would_cycle(scene: &Scene, child_id: EntityId, parent_id: EntityId) -> bool {
    let mut seen = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(id) = cursor {
        if id == child_id {
            return true;
        }
        if !seen.insert(id) {
            return false;
        }
        cursor = scene.get(&id).and_then(|e| e.as_slider()).and_then(|s| s.inherited_from_id);
    }
    false
}

/// Inherited sliders in parents-first order, plus the ones that sit on or
/// below an inheritance cycle.
#[must_use]
pub fn inheritance_order(scene: &Scene) -> (Vec<EntityId>, Vec<EntityId>) {
    let sliders = scene.ids_of_kind(EntityKind::Slider);
    let mut children: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
    let mut roots = VecDeque::new();
    let mut inherited = Vec::new();

    for id in &sliders {
        let parent = scene
            .get(id)
            .and_then(|e| e.as_slider())
            .and_then(|s| s.inherited_from_id)
            .filter(|p| scene.get(p).is_some_and(|e| e.kind() == EntityKind::Slider));
        match parent {
            Some(parent) => {
                children.entry(parent).or_default().push(*id);
                inherited.push(*id);
            }
            None => roots.push_back(*id),
        }
    }

    let mut ordered = Vec::new();
    while let Some(id) = roots.pop_front() {
        for child in children.remove(&id).unwrap_or_default() {
            ordered.push(child);
            roots.push_back(child);
        }
    }

    let placed: HashSet<EntityId> = ordered.iter().copied().collect();
    let cyclic = inherited.into_iter().filter(|id| !placed.contains(id)).collect();
    (ordered, cyclic)
}

/// Outcome of one inheritance pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritanceReport {
    /// Ids whose fields changed, sliders and their cascaded targets.
    pub changed: Vec<EntityId>,
    /// Sliders skipped because they sit on or below an inheritance cycle.
    pub cyclic: Vec<EntityId>,
}

/// Recompute every inherited slider from its parent's current value.
pub fn propagate_inheritance(scene: &mut Scene) -> InheritanceReport {
    let (ordered, cyclic) = inheritance_order(scene);
    let mut changed = Vec::new();

    for child_id in ordered {
        let Some(child) = scene.get(&child_id).and_then(|e| e.as_slider()) else {
            continue;
        };
        let Some(parent) = scene.resolve(child.inherited_from_id).and_then(|e| e.as_slider()) else {
            continue;
        };
        let mapped = remap(parent.value, (parent.min, parent.max), (child.min, child.max));
        if mapped == child.value {
            continue;
        }
        trace!(slider = %child_id, value = mapped, "inherited value updated");
        changed.extend(assign(scene, child_id, mapped));
    }
    InheritanceReport { changed, cyclic }
}

/// Forward one external sample into the receiver's target slider.
///
/// The receiver records the sample as its last value. The sample is clamped
/// to the slider's domain and applied like a user move. Inherited target
/// sliders refuse external writes.
pub fn apply_sample(scene: &mut Scene, receiver_id: EntityId, value: f64) -> Vec<EntityId> {
    let Some(receiver) = scene.get_mut(&receiver_id).and_then(|e| e.as_receiver_mut()) else {
        return Vec::new();
    };
    receiver.link.last_value = Some(value);
    let target = receiver.target_slider_id;
    let mut touched = vec![receiver_id];

    let Some(entity) = scene.resolve(target) else {
        return touched;
    };
    let slider_id = entity.id;
    let Some(slider) = entity.as_slider() else {
        return touched;
    };
    if inherits(scene, slider_id) {
        trace!(receiver = %receiver_id, "target slider is inherited; sample not applied");
        return touched;
    }
    let clamped = slider.clamp(value);
    touched.extend(assign(scene, slider_id, clamped));
    touched
}
