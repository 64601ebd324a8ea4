//! Update and constraint engine for an interactive 2D scene.
//!
//! This crate is headless: it owns the entity arena and everything that runs
//! once per animation frame or once per drag sample. Collision detection,
//! obstacle-aware movement, group propagation, conditional rules, and slider
//! value propagation all live here. The host is responsible only for feeding
//! pointer events, slider input, and external samples in, and for carrying
//! out the resulting [`engine::Action`]s (persist, render, readout).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Frame scheduler, gesture dispatch, and the [`engine::Engine`] facade |
//! | [`doc`] | Entity model and the [`doc::Scene`] arena |
//! | [`property`] | Named property reads/writes used by rules and sliders |
//! | [`collision`] | AABB overlap, the collision pass, obstacle queries, hit-testing |
//! | [`appearance`] | Displayed-color derivation from collision and rule state |
//! | [`movement`] | Drag resolution with obstacle blocking |
//! | [`group`] | Group delta propagation and membership wiring |
//! | [`rules`] | Conditional predicate evaluation and apply/revert |
//! | [`propagation`] | Slider → target, slider inheritance, external samples |
//! | [`edit`] | Create / update / delete / duplicate |
//! | [`snapshot`] | Import/export payloads and the default scene |
//! | [`input`] | Pointer events, drag state, double-tap detection |
//! | [`viewport`] | Scene bounds and client ↔ scene coordinates |
//! | [`error`] | Edit and import error types |
//! | [`consts`] | Shared numeric constants |

pub mod appearance;
pub mod collision;
pub mod consts;
pub mod doc;
pub mod edit;
pub mod engine;
pub mod error;
pub mod group;
pub mod input;
pub mod movement;
pub mod property;
pub mod propagation;
pub mod rules;
pub mod snapshot;
pub mod viewport;

pub use doc::{Entity, EntityId, EntityKind, Scene};
pub use engine::{Action, Engine, LinkEvent};
pub use error::{SceneError, SnapshotError};
