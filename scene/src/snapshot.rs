//! Scene snapshots: the unit of export, import, and persistence.
//!
//! A snapshot is the full entity list plus the theme. Import parses and
//! validates the whole payload before touching the scene, so a rejected
//! import leaves the working set exactly as it was.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BACKGROUND;
use crate::doc::{Body, CollisionAppearance, Entity, EntityKind, Rectangle, Scene, ShapeStyle};
use crate::edit;
use crate::error::SnapshotError;
use crate::group;
use crate::propagation;

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

/// Scene-wide visual settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self { background: default_background() }
    }
}

/// Everything needed to reproduce a scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub theme: Theme,
    pub objects: Vec<Entity>,
}

/// Parse and validate a JSON payload.
///
/// # Errors
///
/// Returns [`SnapshotError::Shape`] if the top level is not an object with an
/// `objects` array, [`SnapshotError::Json`] if any entity is malformed, and
/// [`SnapshotError::DuplicateId`] if two entities share an id.
pub fn parse(json: &str) -> Result<SceneSnapshot, SnapshotError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let Some(top) = value.as_object() else {
        return Err(SnapshotError::Shape("top-level value must be an object"));
    };
    if !top.get("objects").is_some_and(serde_json::Value::is_array) {
        return Err(SnapshotError::Shape("missing `objects` array"));
    }
    let snapshot: SceneSnapshot = serde_json::from_value(value)?;

    let mut seen = HashSet::new();
    for entity in &snapshot.objects {
        if !seen.insert(entity.id) {
            return Err(SnapshotError::DuplicateId(entity.id));
        }
    }
    Ok(snapshot)
}

/// Serialize a snapshot as pretty JSON.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn to_json(snapshot: &SceneSnapshot) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Capture the scene in draw order.
#[must_use]
pub fn capture(scene: &Scene, theme: &Theme) -> SceneSnapshot {
    SceneSnapshot { theme: theme.clone(), objects: scene.sorted_entities().into_iter().cloned().collect() }
}

/// Replace the scene's contents with `objects` and rebuild derived state.
pub fn install(scene: &mut Scene, objects: Vec<Entity>) {
    scene.load(objects);
    for entity in scene.iter_mut() {
        edit::prepare(entity);
    }
    group::rewire(scene);
    for id in scene.ids_of_kind(EntityKind::Slider) {
        propagation::read_back(scene, id);
    }
}

fn seed_rect(name: &str, x: f64, y: f64, w: f64, h: f64, rotation: f64, colors: (&str, &str)) -> Entity {
    let mut style = ShapeStyle::new(CollisionAppearance::new(colors.0, colors.1));
    style.rotation = rotation;
    Entity::new(name, x, y, Body::Rectangle(Rectangle { width: w, height: h, style }))
}

/// The scene seeded when storage is empty: two reactive rectangles.
#[must_use]
pub fn default_scene() -> SceneSnapshot {
    SceneSnapshot {
        theme: Theme::default(),
        objects: vec![
            seed_rect("Blue Rectangle", 100.0, 150.0, 150.0, 80.0, 0.0, ("rgba(59, 130, 246, 1)", "rgba(52, 211, 153, 1)")),
            seed_rect(
                "Red Square",
                300.0,
                200.0,
                100.0,
                100.0,
                std::f64::consts::FRAC_PI_4,
                ("rgba(239, 68, 68, 1)", "rgba(250, 204, 21, 1)"),
            ),
        ],
    }
}
