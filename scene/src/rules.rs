//! Conditional rules: watch another entity's property and swap appearance or
//! position while a comparison holds.
//!
//! Each frame, after the collision pass, every conditional resolves its watched
//! entity, evaluates its predicate, and applies or reverts its transform. The
//! `is_transformed` flag makes both directions idempotent, so a predicate that
//! stays true for many frames applies the transform exactly once.
//!
//! Collision color always wins over a recolor transform while the conditional
//! is colliding; a reposition transform is independent of collision.

#[cfg(test)]
#[path = "rules_test.rs"]
mod rules_test;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::appearance;
use crate::consts::DEFAULT_TRANSFORM_COLOR;
use crate::doc::{Entity, EntityId, EntityKind, Scene};
use crate::property::{self, Property, Scalar};

/// Comparison applied between the watched value and the rule's constant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    /// Anything else found in a payload. Always evaluates to false.
    Unknown(String),
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Unknown(raw) => raw,
        };
        f.write_str(s)
    }
}

impl Operator {
    /// Evaluate `lhs <op> rhs`. Incomparable pairs only satisfy `!=`.
    #[must_use]
    pub fn evaluate(&self, lhs: &Scalar, rhs: &Scalar) -> bool {
        let ord = lhs.compare(rhs);
        match self {
            Self::Eq => ord == Some(Ordering::Equal),
            Self::Ne => ord != Some(Ordering::Equal),
            Self::Gt => ord == Some(Ordering::Greater),
            Self::Lt => ord == Some(Ordering::Less),
            Self::Ge => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            Self::Le => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            Self::Unknown(_) => false,
        }
    }
}

/// What a conditional does to itself while its predicate holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    Recolor { color: String },
    Reposition { x: f64, y: f64 },
}

impl Default for Transform {
    fn default() -> Self {
        Self::Recolor { color: DEFAULT_TRANSFORM_COLOR.to_string() }
    }
}

/// The declarative part of a conditional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub watched_entity_id: Option<EntityId>,
    #[serde(default)]
    pub watched_property: Property,
    #[serde(default)]
    pub comparison_operator: Operator,
    #[serde(default)]
    pub comparison_value: Scalar,
    #[serde(default)]
    pub transform: Transform,
}

/// Transient state: whether the transform is active and what to revert to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleState {
    pub is_transformed: bool,
    pub original_color: String,
    pub original_x: f64,
    pub original_y: f64,
}

/// Record the current base color and position as the revert target and
/// clear the transformed flag. Called on creation and on every edit.
pub fn snapshot_originals(entity: &mut Entity) {
    let (x, y) = (entity.x, entity.y);
    if let Some(cond) = entity.as_conditional_mut() {
        cond.state = RuleState {
            is_transformed: false,
            original_color: cond.style.appearance.on_no_collision.color.clone(),
            original_x: x,
            original_y: y,
        };
    }
}

/// Evaluate `rule` against the scene. `None` when the watched entity does not resolve.
#[must_use]
pub fn predicate(scene: &Scene, rule: &Rule) -> Option<bool> {
    let watched = scene.resolve(rule.watched_entity_id)?;
    let Some(lhs) = property::read(watched, rule.watched_property) else {
        return Some(false);
    };
    Some(rule.comparison_operator.evaluate(&lhs, &rule.comparison_value))
}

/// Apply the transform. No-op (returns `false`) if already transformed.
pub fn apply(entity: &mut Entity) -> bool {
    let Some(cond) = entity.as_conditional_mut() else {
        return false;
    };
    if cond.state.is_transformed {
        return false;
    }
    cond.state.is_transformed = true;
    if let Transform::Reposition { x, y } = cond.rule.transform {
        entity.x = x;
        entity.y = y;
    }
    appearance::refresh(entity);
    true
}

/// Revert the transform. No-op (returns `false`) if not transformed.
pub fn revert(entity: &mut Entity) -> bool {
    let Some(cond) = entity.as_conditional_mut() else {
        return false;
    };
    if !cond.state.is_transformed {
        return false;
    }
    cond.state.is_transformed = false;
    if matches!(cond.rule.transform, Transform::Reposition { .. }) {
        let (x, y) = (cond.state.original_x, cond.state.original_y);
        entity.x = x;
        entity.y = y;
    }
    appearance::refresh(entity);
    true
}

/// Run every conditional once. Returns the ids whose state changed.
///
/// A conditional whose watched entity does not resolve is left exactly as it
/// was; it neither applies nor reverts this frame.
pub fn evaluate_all(scene: &mut Scene) -> Vec<EntityId> {
    let mut changed = Vec::new();
    for id in scene.ids_of_kind(EntityKind::Conditional) {
        let Some(rule) = scene.get(&id).and_then(|e| e.as_conditional()).map(|c| c.rule.clone()) else {
            continue;
        };
        let Some(holds) = predicate(scene, &rule) else {
            trace!(%id, "conditional watched entity unresolved");
            continue;
        };
        let Some(entity) = scene.get_mut(&id) else {
            continue;
        };
        let toggled = if holds { apply(entity) } else { revert(entity) };
        if toggled {
            debug!(%id, applied = holds, transform = ?rule.transform, "conditional toggled");
            changed.push(id);
        }
    }
    changed
}
