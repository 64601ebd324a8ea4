//! Error types for edit-time scene operations and snapshot import.
//!
//! The per-frame passes never fail: unresolved references degrade to no-ops.
//! These errors only surface from explicit edits and imports.

use crate::doc::{EntityId, EntityKind};

/// Error returned by editing operations on a [`crate::doc::Scene`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// No entity with this id exists.
    #[error("entity not found: {0}")]
    NotFound(EntityId),
    /// The entity exists but is of the wrong kind for the operation.
    #[error("entity {id} is a {found:?}, expected {expected:?}")]
    KindMismatch { id: EntityId, expected: EntityKind, found: EntityKind },
    /// An edit tried to change an entity's kind.
    #[error("entity {id} cannot change kind from {from:?} to {to:?}")]
    KindChange { id: EntityId, from: EntityKind, to: EntityKind },
    /// The slider mirrors a parent and does not accept direct writes.
    #[error("slider {0} inherits its value and cannot be set directly")]
    InheritedSlider(EntityId),
    /// Setting this parent would make the slider inherit from itself.
    #[error("slider {child} cannot inherit from {parent}: inheritance cycle")]
    InheritanceCycle { child: EntityId, parent: EntityId },
    /// An entity would reference itself.
    #[error("entity {0} cannot reference itself")]
    SelfReference(EntityId),
    /// Groups contain leaf entities only.
    #[error("group {group} cannot contain group {child}")]
    NestedGroup { group: EntityId, child: EntityId },
    /// Groups are containers and are not duplicated.
    #[error("group {0} cannot be duplicated")]
    DuplicateGroup(EntityId),
}

/// Error returned when a scene snapshot cannot be imported.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The payload is not valid JSON or an entity is malformed.
    #[error("invalid scene payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload is valid JSON but lacks the expected top-level shape.
    #[error("invalid scene payload: {0}")]
    Shape(&'static str),
    /// Two entities share an id.
    #[error("duplicate entity id in snapshot: {0}")]
    DuplicateId(EntityId),
}
