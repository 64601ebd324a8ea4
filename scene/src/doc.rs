//! Document model: scene entities, their kind payloads, and the in-memory arena.
//!
//! This module defines the core data types that describe what is in the scene
//! (`Entity`, `Body`, and the per-kind payload structs) and the arena that owns
//! all live entities (`Scene`). Every relation between entities (group
//! membership, slider targets, watched entities, inheritance parents) is an
//! id lookup into the arena, so a deleted entity simply stops resolving.
//!
//! Data flows into this layer from snapshot import (JSON deserialization), from
//! editing operations, and from the engine passes (mutations). The renderer
//! reads from `Scene` via `sorted_entities` to determine draw order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collision::Aabb;
use crate::consts::{DEFAULT_BAUD_RATE, RECEIVER_HEIGHT, RECEIVER_WIDTH};
use crate::property::Property;
use crate::rules::{Rule, RuleState};

/// Unique identifier for a scene entity.
pub type EntityId = Uuid;

/// The kind of a scene entity. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Rectangle,
    Circle,
    Slider,
    Conditional,
    Group,
    ExternalReceiver,
}

/// An entity as stored in the scene and in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Stable identifier, unique within a scene.
    pub id: EntityId,
    /// Display name shown in labels and forms.
    #[serde(default)]
    pub name: String,
    /// Left edge in scene coordinates (origin bottom-left).
    pub x: f64,
    /// Bottom edge in scene coordinates (y grows upward).
    pub y: f64,
    /// Stacking order; affects drawing only.
    #[serde(default)]
    pub render_order: i64,
    /// Group containing this entity, if any. Lookup only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<EntityId>,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub body: Body,
}

/// Kind-specific payload of an entity, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    Rectangle(Rectangle),
    Circle(Circle),
    Slider(Slider),
    Conditional(Conditional),
    Group(Group),
    ExternalReceiver(Receiver),
}

/// Visual state for one side of the collision toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub color: String,
}

/// The pair of appearances a shape switches between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionAppearance {
    pub on_collision: Appearance,
    pub on_no_collision: Appearance,
}

impl CollisionAppearance {
    #[must_use]
    pub fn new(on_no_collision: &str, on_collision: &str) -> Self {
        Self {
            on_collision: Appearance { color: on_collision.to_string() },
            on_no_collision: Appearance { color: on_no_collision.to_string() },
        }
    }
}

/// Rotation pivot as fractions of the bounding box (0.5, 0.5 is the center).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub x: f64,
    pub y: f64,
}

impl Default for Pivot {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

fn default_true() -> bool {
    true
}

/// Collision-related fields shared by every shape kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Rotation in radians. Visual only; collision ignores it.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub pivot: Pivot,
    #[serde(default = "default_true")]
    pub reacts_to_collision: bool,
    #[serde(default)]
    pub is_obstacle: bool,
    pub appearance: CollisionAppearance,
    /// Recomputed every frame by the collision pass.
    #[serde(skip)]
    pub is_colliding: bool,
    /// Color currently displayed. Derived by the appearance refresh.
    #[serde(skip)]
    pub fill: String,
}

impl ShapeStyle {
    #[must_use]
    pub fn new(appearance: CollisionAppearance) -> Self {
        let fill = appearance.on_no_collision.color.clone();
        Self {
            rotation: 0.0,
            pivot: Pivot::default(),
            reacts_to_collision: true,
            is_obstacle: false,
            appearance,
            is_colliding: false,
            fill,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

/// A circle collides as its bounding square (`diameter` × `diameter`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub diameter: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
}

/// A rectangle carrying a rule that watches another entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditional {
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(flatten)]
    pub rule: Rule,
    #[serde(skip)]
    pub state: RuleState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slider {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub target_id: Option<EntityId>,
    #[serde(default)]
    pub target_property: Property,
    pub min: f64,
    pub max: f64,
    /// Current input value, in the slider's own domain.
    #[serde(default)]
    pub value: f64,
    /// Parent slider whose value this one mirrors. Blocks direct writes when set.
    #[serde(default)]
    pub inherited_from_id: Option<EntityId>,
}

impl Slider {
    /// Clamp `value` into `[min, max]`.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// A logical container. Moves are distributed to every child as a delta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub child_ids: Vec<EntityId>,
    /// Bounding box of the resolved children, refreshed on membership change.
    #[serde(skip)]
    pub bounds: Option<Aabb>,
}

/// Connection status of an external receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connected,
    Error,
}

/// Transient link state of a receiver. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkState {
    pub status: LinkStatus,
    pub port_info: String,
    pub last_value: Option<f64>,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    #[serde(default)]
    pub target_slider_id: Option<EntityId>,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(skip)]
    pub link: LinkState,
}

impl Default for Receiver {
    fn default() -> Self {
        Self { target_slider_id: None, baud_rate: DEFAULT_BAUD_RATE, link: LinkState::default() }
    }
}

impl Entity {
    /// Build an entity with a fresh id at `(x, y)`.
    #[must_use]
    pub fn new(name: &str, x: f64, y: f64, body: Body) -> Self {
        Self { id: Uuid::new_v4(), name: name.to_string(), x, y, render_order: 0, group_id: None, body }
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self.body {
            Body::Rectangle(_) => EntityKind::Rectangle,
            Body::Circle(_) => EntityKind::Circle,
            Body::Slider(_) => EntityKind::Slider,
            Body::Conditional(_) => EntityKind::Conditional,
            Body::Group(_) => EntityKind::Group,
            Body::ExternalReceiver(_) => EntityKind::ExternalReceiver,
        }
    }

    /// Shape fields, for the kinds that take part in collision.
    #[must_use]
    pub fn shape(&self) -> Option<&ShapeStyle> {
        match &self.body {
            Body::Rectangle(r) => Some(&r.style),
            Body::Circle(c) => Some(&c.style),
            Body::Conditional(c) => Some(&c.style),
            _ => None,
        }
    }

    pub fn shape_mut(&mut self) -> Option<&mut ShapeStyle> {
        match &mut self.body {
            Body::Rectangle(r) => Some(&mut r.style),
            Body::Circle(c) => Some(&mut c.style),
            Body::Conditional(c) => Some(&mut c.style),
            _ => None,
        }
    }

    /// Width and height of the visible footprint. Groups have none.
    #[must_use]
    pub fn extent(&self) -> Option<(f64, f64)> {
        match &self.body {
            Body::Rectangle(r) => Some((r.width, r.height)),
            Body::Circle(c) => Some((c.diameter, c.diameter)),
            Body::Conditional(c) => Some((c.width, c.height)),
            Body::Slider(s) => Some((s.width, s.height)),
            Body::ExternalReceiver(_) => Some((RECEIVER_WIDTH, RECEIVER_HEIGHT)),
            Body::Group(_) => None,
        }
    }

    #[must_use]
    pub fn as_slider(&self) -> Option<&Slider> {
        match &self.body {
            Body::Slider(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_slider_mut(&mut self) -> Option<&mut Slider> {
        match &mut self.body {
            Body::Slider(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match &self.body {
            Body::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.body {
            Body::Group(g) => Some(g),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_conditional(&self) -> Option<&Conditional> {
        match &self.body {
            Body::Conditional(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_conditional_mut(&mut self) -> Option<&mut Conditional> {
        match &mut self.body {
            Body::Conditional(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_receiver(&self) -> Option<&Receiver> {
        match &self.body {
            Body::ExternalReceiver(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_receiver_mut(&mut self) -> Option<&mut Receiver> {
        match &mut self.body {
            Body::ExternalReceiver(r) => Some(r),
            _ => None,
        }
    }
}

/// In-memory arena of scene entities keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    entities: HashMap<EntityId, Entity>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self { entities: HashMap::new() }
    }

    /// Insert or replace an entity. If an entity with the same `id` already
    /// exists it is overwritten.
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.id, entity);
    }

    /// Remove an entity by id, returning it if it was present.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Resolve an optional reference. `None` and dangling ids both yield `None`.
    #[must_use]
    pub fn resolve(&self, id: Option<EntityId>) -> Option<&Entity> {
        id.and_then(|id| self.entities.get(&id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Replace all entities with a full snapshot.
    pub fn load(&mut self, entities: Vec<Entity>) {
        self.entities.clear();
        for entity in entities {
            self.entities.insert(entity.id, entity);
        }
    }

    /// All ids in draw order.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        self.sorted_entities().into_iter().map(|e| e.id).collect()
    }

    /// Return all entities sorted by `(render_order, id)` for draw order.
    #[must_use]
    pub fn sorted_entities(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.entities.values().collect();
        entities.sort_by(|a, b| a.render_order.cmp(&b.render_order).then_with(|| a.id.cmp(&b.id)));
        entities
    }

    /// Ids of every entity of `kind`, in draw order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.sorted_entities()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .map(|e| e.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::rules::{Operator, Transform};
    use crate::property::Scalar;

    pub const BASE: &str = "base";
    pub const HOT: &str = "hot";

    fn style() -> ShapeStyle {
        ShapeStyle::new(CollisionAppearance::new(BASE, HOT))
    }

    /// Reactive, non-obstacle rectangle.
    #[must_use]
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Entity {
        Entity::new("rect", x, y, Body::Rectangle(Rectangle { width: w, height: h, style: style() }))
    }

    #[must_use]
    pub fn obstacle(x: f64, y: f64, w: f64, h: f64) -> Entity {
        let mut e = rect(x, y, w, h);
        if let Some(s) = e.shape_mut() {
            s.is_obstacle = true;
        }
        e
    }

    #[must_use]
    pub fn inert(mut e: Entity) -> Entity {
        if let Some(s) = e.shape_mut() {
            s.reacts_to_collision = false;
        }
        e
    }

    #[must_use]
    pub fn circle(x: f64, y: f64, d: f64) -> Entity {
        Entity::new("circle", x, y, Body::Circle(Circle { diameter: d, style: style() }))
    }

    #[must_use]
    pub fn slider(min: f64, max: f64, target: Option<EntityId>, prop: Property) -> Entity {
        Entity::new(
            "slider",
            0.0,
            0.0,
            Body::Slider(Slider {
                width: 200.0,
                height: 40.0,
                target_id: target,
                target_property: prop,
                min,
                max,
                value: min,
                inherited_from_id: None,
            }),
        )
    }

    #[must_use]
    pub fn child_slider(min: f64, max: f64, parent: EntityId) -> Entity {
        let mut e = slider(min, max, None, Property::Value);
        if let Some(s) = e.as_slider_mut() {
            s.inherited_from_id = Some(parent);
        }
        e
    }

    #[must_use]
    pub fn conditional(
        x: f64,
        y: f64,
        watched: Option<EntityId>,
        prop: Property,
        op: &str,
        value: Scalar,
        transform: Transform,
    ) -> Entity {
        let rule = Rule {
            watched_entity_id: watched,
            watched_property: prop,
            comparison_operator: Operator::from(op.to_string()),
            comparison_value: value,
            transform,
        };
        let mut e = Entity::new(
            "conditional",
            x,
            y,
            Body::Conditional(Conditional { width: 50.0, height: 50.0, style: style(), rule, state: RuleState::default() }),
        );
        crate::rules::snapshot_originals(&mut e);
        e
    }

    #[must_use]
    pub fn group(children: &[EntityId]) -> Entity {
        Entity::new("group", 0.0, 0.0, Body::Group(Group { child_ids: children.to_vec(), bounds: None }))
    }

    #[must_use]
    pub fn receiver(target: Option<EntityId>) -> Entity {
        Entity::new(
            "receiver",
            0.0,
            0.0,
            Body::ExternalReceiver(Receiver { target_slider_id: target, ..Receiver::default() }),
        )
    }

    /// Insert `entity` and return its id.
    pub fn add(scene: &mut Scene, entity: Entity) -> EntityId {
        let id = entity.id;
        scene.insert(entity);
        id
    }
}
