//! Shared numeric constants for the scene crate.

// ── Math ────────────────────────────────────────────────────────

/// Degrees → radians factor used when a slider writes an angular property.
pub const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Radians → degrees factor used when a slider reads an angular property back.
pub const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

// ── Scene ───────────────────────────────────────────────────────

/// Default scene width in scene units.
pub const DEFAULT_SCENE_WIDTH: f64 = 800.0;

/// Default scene height in scene units.
pub const DEFAULT_SCENE_HEIGHT: f64 = 600.0;

/// Default background color of the scene theme.
pub const DEFAULT_BACKGROUND: &str = "rgba(17, 24, 39, 1)";

// ── Input ───────────────────────────────────────────────────────

/// Maximum gap between two taps for them to count as a double-tap.
pub const DOUBLE_TAP_MS: f64 = 300.0;

// ── Editing ─────────────────────────────────────────────────────

/// Offset applied to both axes when duplicating an entity.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Suffix appended to a duplicated entity's name.
pub const DUPLICATE_SUFFIX: &str = " (copy)";

// ── Kind defaults ───────────────────────────────────────────────

/// Fixed width of an external receiver panel.
pub const RECEIVER_WIDTH: f64 = 220.0;

/// Fixed height of an external receiver panel.
pub const RECEIVER_HEIGHT: f64 = 100.0;

/// Default serial baud rate stored on new receivers.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default transform color of a conditional (opaque yellow).
pub const DEFAULT_TRANSFORM_COLOR: &str = "rgba(255, 255, 0, 1)";
