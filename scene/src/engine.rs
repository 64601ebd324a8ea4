use tracing::{debug, warn};

use crate::appearance;
use crate::collision;
use crate::doc::{Entity, EntityId, LinkStatus, Scene};
use crate::edit;
use crate::error::{SceneError, SnapshotError};
use crate::input::{InputState, PointerEvent, PointerPhase, TapTracker};
use crate::movement::{self, MoveOutcome};
use crate::propagation;
use crate::rules;
use crate::snapshot::{self, SceneSnapshot, Theme};
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Side effects returned from the engine for the host to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write the entity's current fields to storage (last write wins).
    Persist(EntityId),
    /// Redraw the entity from its current fields.
    Render(EntityId),
    /// The entity was deleted; drop its visual and stored record.
    Removed(EntityId),
    /// The user double-tapped an entity; open its edit form.
    EditRequested(EntityId),
    /// Coordinate readout text during a drag, `None` to clear it.
    Coordinates(Option<String>),
    /// The whole scene was replaced; redraw and persist everything.
    SceneReplaced,
}

/// Events reported by an external numeric source bound to a receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// The source opened successfully.
    Connected { port_info: String },
    /// One decoded numeric sample.
    Sample(f64),
    /// The source could not be opened or failed while reading.
    Failed(String),
    /// The source closed normally.
    Closed,
}

/// Core engine state: the scene plus everything needed to run frames and
/// gestures against it.
pub struct Engine {
    pub scene: Scene,
    pub viewport: Viewport,
    pub theme: Theme,
    pub input: InputState,
    /// Global toggle for the collision pass.
    pub collisions_enabled: bool,
    taps: TapTracker,
    pending_samples: Vec<(EntityId, f64)>,
    reported_cycles: Vec<EntityId>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

/// Append `action` unless an equal action is already queued.
fn push_unique(actions: &mut Vec<Action>, action: Action) {
    if !actions.contains(&action) {
        actions.push(action);
    }
}

fn persist_and_render(actions: &mut Vec<Action>, ids: &[EntityId]) {
    for id in ids {
        push_unique(actions, Action::Persist(*id));
        push_unique(actions, Action::Render(*id));
    }
}

fn render(actions: &mut Vec<Action>, ids: &[EntityId]) {
    for id in ids {
        push_unique(actions, Action::Render(*id));
    }
}

fn readout(entity: &Entity) -> String {
    format!("{}, {}", entity.x.round(), entity.y.round())
}

impl Engine {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            scene: Scene::new(),
            viewport,
            theme: Theme::default(),
            input: InputState::Idle,
            collisions_enabled: true,
            taps: TapTracker::default(),
            pending_samples: Vec::new(),
            reported_cycles: Vec::new(),
        }
    }

    // --- Snapshots ---

    /// Replace the working set with `snapshot`.
    pub fn load_snapshot(&mut self, snapshot: SceneSnapshot) -> Vec<Action> {
        snapshot::install(&mut self.scene, snapshot.objects);
        self.theme = snapshot.theme;
        self.input = InputState::Idle;
        self.taps.reset();
        self.pending_samples.clear();
        self.reported_cycles.clear();
        debug!(entities = self.scene.len(), "scene loaded");
        vec![Action::SceneReplaced]
    }

    /// Parse and install a JSON payload. On error the scene is untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`SnapshotError`] describing why the payload was rejected.
    pub fn import_json(&mut self, json: &str) -> Result<Vec<Action>, SnapshotError> {
        let snapshot = snapshot::parse(json)?;
        Ok(self.load_snapshot(snapshot))
    }

    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        snapshot::capture(&self.scene, &self.theme)
    }

    /// Export the scene as pretty JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn export_json(&self) -> Result<String, SnapshotError> {
        snapshot::to_json(&self.snapshot())
    }

    // --- Editing ---

    /// Create an entity from a submitted form.
    ///
    /// # Errors
    ///
    /// See [`edit::create`].
    pub fn create(&mut self, entity: Entity) -> Result<(EntityId, Vec<Action>), SceneError> {
        let id = edit::create(&mut self.scene, entity)?;
        let mut actions = Vec::new();
        persist_and_render(&mut actions, &[id]);
        Ok((id, actions))
    }

    /// Apply a direct edit.
    ///
    /// # Errors
    ///
    /// See [`edit::update`].
    pub fn update(&mut self, entity: Entity) -> Result<Vec<Action>, SceneError> {
        let touched = edit::update(&mut self.scene, entity)?;
        let mut actions = Vec::new();
        persist_and_render(&mut actions, &touched);
        Ok(actions)
    }

    /// Delete an entity, ending any drag on it.
    ///
    /// # Errors
    ///
    /// See [`edit::delete`].
    pub fn delete(&mut self, id: EntityId) -> Result<Vec<Action>, SceneError> {
        edit::delete(&mut self.scene, id)?;
        if self.input.dragging() == Some(id) {
            self.input = InputState::Idle;
        }
        self.pending_samples.retain(|(receiver, _)| *receiver != id);
        Ok(vec![Action::Removed(id)])
    }

    /// Duplicate an entity.
    ///
    /// # Errors
    ///
    /// See [`edit::duplicate`].
    pub fn duplicate(&mut self, id: EntityId) -> Result<(EntityId, Vec<Action>), SceneError> {
        let copy = edit::duplicate(&mut self.scene, id)?;
        let mut actions = Vec::new();
        persist_and_render(&mut actions, &[copy]);
        Ok((copy, actions))
    }

    // --- Value inputs ---

    /// The user moved a slider's range control.
    ///
    /// # Errors
    ///
    /// See [`propagation::set_value`].
    pub fn set_slider(&mut self, id: EntityId, value: f64) -> Result<Vec<Action>, SceneError> {
        let touched = propagation::set_value(&mut self.scene, id, value)?;
        let mut actions = Vec::new();
        persist_and_render(&mut actions, &touched);
        Ok(actions)
    }

    /// Record an event from the source bound to `receiver_id`. Samples are
    /// queued and applied during the next tick.
    pub fn on_link_event(&mut self, receiver_id: EntityId, event: LinkEvent) -> Vec<Action> {
        if let LinkEvent::Sample(value) = event {
            self.pending_samples.push((receiver_id, value));
            return Vec::new();
        }
        let Some(receiver) = self.scene.get_mut(&receiver_id).and_then(|e| e.as_receiver_mut()) else {
            return Vec::new();
        };
        match event {
            LinkEvent::Connected { port_info } => {
                receiver.link.status = LinkStatus::Connected;
                receiver.link.port_info = port_info;
            }
            LinkEvent::Failed(reason) => {
                warn!(receiver = %receiver_id, %reason, "external source failed");
                receiver.link.status = LinkStatus::Error;
                receiver.link.port_info = reason;
            }
            LinkEvent::Closed => {
                receiver.link.status = LinkStatus::Disconnected;
                receiver.link.port_info.clear();
            }
            LinkEvent::Sample(_) => {}
        }
        vec![Action::Render(receiver_id)]
    }

    // --- Pointer input ---

    /// Feed one pointer event through the drag gesture machine.
    pub fn on_pointer(&mut self, event: PointerEvent) -> Vec<Action> {
        match event.phase {
            PointerPhase::Down => self.on_pointer_down(event),
            PointerPhase::Move => self.on_pointer_move(event),
            PointerPhase::Up => self.on_pointer_up(event),
        }
    }

    fn on_pointer_down(&mut self, event: PointerEvent) -> Vec<Action> {
        if event.on_control {
            return Vec::new();
        }
        let scene_pt = self.viewport.client_to_scene(event.client);
        let Some(entity) = collision::hit_test(&self.scene, scene_pt).and_then(|id| self.scene.get(&id)) else {
            return Vec::new();
        };
        let (_, h) = entity.extent().unwrap_or((0.0, 0.0));
        let top_left = self.viewport.box_top_left(entity.x, entity.y, h);
        let grab = Point::new(event.client.x - top_left.x, event.client.y - top_left.y);
        let id = entity.id;
        self.input = InputState::Dragging { id, grab, moved: false };
        vec![Action::Render(id)]
    }

    fn on_pointer_move(&mut self, event: PointerEvent) -> Vec<Action> {
        let InputState::Dragging { id, grab, .. } = self.input else {
            return Vec::new();
        };
        let Some(entity) = self.scene.get(&id) else {
            self.input = InputState::Idle;
            return vec![Action::Coordinates(None)];
        };
        let (_, h) = entity.extent().unwrap_or((0.0, 0.0));
        let top_left = Point::new(event.client.x - grab.x, event.client.y - grab.y);
        let proposed = self.viewport.box_origin(top_left, h);

        let outcome = movement::resolve_drag(&mut self.scene, &self.viewport, id, proposed);
        if outcome == MoveOutcome::Missing {
            self.input = InputState::Idle;
            return vec![Action::Coordinates(None)];
        }
        self.input = InputState::Dragging { id, grab, moved: true };

        let mut actions = Vec::new();
        persist_and_render(&mut actions, &outcome.moved_ids());
        if let Some(entity) = self.scene.get(&id) {
            actions.push(Action::Coordinates(Some(readout(entity))));
        }
        actions
    }

    fn on_pointer_up(&mut self, event: PointerEvent) -> Vec<Action> {
        let InputState::Dragging { id, moved, .. } = self.input else {
            return Vec::new();
        };
        self.input = InputState::Idle;
        let mut actions = vec![Action::Coordinates(None), Action::Render(id)];
        if moved {
            self.taps.reset();
        } else if self.taps.register(id, event.time_ms) {
            actions.push(Action::EditRequested(id));
        }
        actions
    }

    // --- Frame ---

    /// Run one frame: collision → appearance → conditionals → inheritance →
    /// external samples.
    pub fn tick(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.collisions_enabled {
            collision::detect_all(&mut self.scene);
        } else {
            for style in self.scene.iter_mut().filter_map(Entity::shape_mut) {
                style.is_colliding = false;
            }
        }
        render(&mut actions, &appearance::refresh_all(&mut self.scene));
        render(&mut actions, &rules::evaluate_all(&mut self.scene));

        let report = propagation::propagate_inheritance(&mut self.scene);
        persist_and_render(&mut actions, &report.changed);
        if report.cyclic != self.reported_cycles {
            if !report.cyclic.is_empty() {
                warn!(sliders = ?report.cyclic, "inheritance cycle; sliders skipped");
            }
            self.reported_cycles = report.cyclic;
        }

        for (receiver_id, value) in std::mem::take(&mut self.pending_samples) {
            let touched = propagation::apply_sample(&mut self.scene, receiver_id, value);
            if let Some((receiver, writes)) = touched.split_first() {
                push_unique(&mut actions, Action::Render(*receiver));
                persist_and_render(&mut actions, writes);
            }
        }
        actions
    }
}
