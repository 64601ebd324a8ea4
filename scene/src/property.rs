//! Named entity properties: typed reads for rules, numeric writes for sliders.

#[cfg(test)]
#[path = "property_test.rs"]
mod property_test;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::doc::{Body, Entity, LinkStatus};

/// A property that sliders can drive and rules can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    #[default]
    X,
    Y,
    Width,
    Height,
    Diameter,
    /// Stored in radians; sliders present it in degrees.
    Rotation,
    RenderOrder,
    /// A slider's own value.
    Value,
    Min,
    Max,
    /// Color currently displayed by a shape.
    Color,
    IsColliding,
    Name,
    /// Last sample seen by an external receiver.
    LastValue,
    /// Link status of an external receiver.
    Status,
}

impl Property {
    /// Whether sliders present this property in degrees.
    #[must_use]
    pub fn is_angular(self) -> bool {
        matches!(self, Self::Rotation)
    }

    /// Whether this property sits on the entity's position.
    #[must_use]
    pub fn is_position(self) -> bool {
        matches!(self, Self::X | Self::Y)
    }
}

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Default for Scalar {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl Scalar {
    /// Numeric view: numbers as-is, booleans as 0/1, numeric text parsed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) => Some(n),
                Err(_) => None,
            },
        }
    }

    /// Compare two scalars. Text pairs compare as strings, every other pair
    /// numerically. `None` when the pair is not comparable.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Self::Text(a), Self::Text(b)) = (self, other) {
            return Some(a.cmp(b));
        }
        let a = self.as_number()?;
        let b = other.as_number()?;
        a.partial_cmp(&b)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Read `property` from `entity`. `None` if the kind does not carry it.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn read(entity: &Entity, property: Property) -> Option<Scalar> {
    let number = |n: f64| Some(Scalar::Number(n));
    match property {
        Property::X => number(entity.x),
        Property::Y => number(entity.y),
        Property::RenderOrder => number(entity.render_order as f64),
        Property::Name => Some(Scalar::Text(entity.name.clone())),
        Property::Width => match &entity.body {
            Body::Circle(_) | Body::Group(_) => None,
            _ => entity.extent().and_then(|(w, _)| number(w)),
        },
        Property::Height => match &entity.body {
            Body::Circle(_) | Body::Group(_) => None,
            _ => entity.extent().and_then(|(_, h)| number(h)),
        },
        Property::Diameter => match &entity.body {
            Body::Circle(c) => number(c.diameter),
            _ => None,
        },
        Property::Rotation => entity.shape().and_then(|s| number(s.rotation)),
        Property::Color => entity.shape().map(|s| Scalar::Text(s.fill.clone())),
        Property::IsColliding => entity.shape().map(|s| Scalar::Bool(s.is_colliding)),
        Property::Value => entity.as_slider().and_then(|s| number(s.value)),
        Property::Min => entity.as_slider().and_then(|s| number(s.min)),
        Property::Max => entity.as_slider().and_then(|s| number(s.max)),
        Property::LastValue => entity.as_receiver().and_then(|r| r.link.last_value.map(Scalar::Number)),
        Property::Status => entity.as_receiver().map(|r| {
            let label = match r.link.status {
                LinkStatus::Disconnected => "disconnected",
                LinkStatus::Connected => "connected",
                LinkStatus::Error => "error",
            };
            Scalar::Text(label.to_string())
        }),
    }
}

/// Read a numeric property, for slider read-back.
#[must_use]
pub fn read_number(entity: &Entity, property: Property) -> Option<f64> {
    read(entity, property).and_then(|v| v.as_number())
}

/// Overwrite a numeric property in place. Returns `false` when the kind does
/// not carry the property or the property is not writable.
///
/// Position writes on a group are not handled here; the caller turns them
/// into a group move.
#[allow(clippy::cast_possible_truncation)]
pub fn write(entity: &mut Entity, property: Property, value: f64) -> bool {
    match property {
        Property::X => entity.x = value,
        Property::Y => entity.y = value,
        Property::RenderOrder => entity.render_order = value.round() as i64,
        Property::Width => match &mut entity.body {
            Body::Rectangle(r) => r.width = value,
            Body::Conditional(c) => c.width = value,
            Body::Slider(s) => s.width = value,
            _ => return false,
        },
        Property::Height => match &mut entity.body {
            Body::Rectangle(r) => r.height = value,
            Body::Conditional(c) => c.height = value,
            Body::Slider(s) => s.height = value,
            _ => return false,
        },
        Property::Diameter => match &mut entity.body {
            Body::Circle(c) => c.diameter = value,
            _ => return false,
        },
        Property::Rotation => match entity.shape_mut() {
            Some(style) => style.rotation = value,
            None => return false,
        },
        Property::Value => match entity.as_slider_mut() {
            Some(slider) => slider.value = slider.clamp(value),
            None => return false,
        },
        Property::Min
        | Property::Max
        | Property::Color
        | Property::IsColliding
        | Property::Name
        | Property::LastValue
        | Property::Status => return false,
    }
    true
}
