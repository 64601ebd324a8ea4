//! Render side effect: logs each entity's visible state.
//!
//! The host has no canvas, so "drawing" is a structured `tracing` event per
//! entity. The last drawn state is kept per id and unchanged entities are
//! skipped, which keeps a 60 fps loop quiet unless something moves or
//! changes color.

use std::collections::HashMap;

use scene::appearance;
use scene::doc::{Body, Entity};
use scene::{Engine, EntityId};
use tracing::{debug, info};

/// What the renderer last drew for one entity.
#[derive(Debug, Clone, PartialEq)]
struct Drawn {
    x: f64,
    y: f64,
    render_order: i64,
    color: Option<String>,
    detail: String,
    /// Drawn on top while the drag lasts.
    dragging: bool,
}

impl Drawn {
    fn of(entity: &Entity, dragging: bool) -> Self {
        Self {
            x: entity.x,
            y: entity.y,
            render_order: entity.render_order,
            color: appearance::displayed_color(entity).map(str::to_string),
            detail: detail(entity),
            dragging,
        }
    }
}

fn detail(entity: &Entity) -> String {
    match &entity.body {
        Body::Slider(s) => format!("value={}", s.value),
        Body::ExternalReceiver(r) => {
            let last = r.link.last_value.map_or_else(|| "-".to_string(), |v| v.to_string());
            format!("status={:?} last={last} port={}", r.link.status, r.link.port_info)
        }
        Body::Group(g) => format!("children={}", g.child_ids.len()),
        Body::Rectangle(_) | Body::Circle(_) | Body::Conditional(_) => entity
            .shape()
            .map(|s| format!("rotation={:.3}", s.rotation))
            .unwrap_or_default(),
    }
}

#[derive(Debug, Default)]
pub struct Renderer {
    drawn: HashMap<EntityId, Drawn>,
    readout: Option<String>,
}

impl Renderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `id` if its visible state changed, or drop it if it no longer
    /// exists. Returns `true` when the output changed.
    pub fn render(&mut self, engine: &Engine, id: EntityId) -> bool {
        let Some(entity) = engine.scene.get(&id) else {
            return self.remove(id);
        };
        let next = Drawn::of(entity, engine.input.dragging() == Some(id));
        if self.drawn.get(&id) == Some(&next) {
            return false;
        }
        debug!(
            %id,
            kind = ?entity.kind(),
            name = %entity.name,
            x = next.x,
            y = next.y,
            z = next.render_order,
            color = next.color.as_deref().unwrap_or("-"),
            detail = %next.detail,
            dragging = next.dragging,
            "render"
        );
        self.drawn.insert(id, next);
        true
    }

    /// Forget a deleted entity. Returns `true` if it had been drawn.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let had = self.drawn.remove(&id).is_some();
        if had {
            debug!(%id, "render removed");
        }
        had
    }

    /// Drop everything and draw the whole scene in draw order.
    pub fn redraw_all(&mut self, engine: &Engine) -> usize {
        self.drawn.clear();
        let ids = engine.scene.sorted_ids();
        ids.into_iter().filter(|id| self.render(engine, *id)).count()
    }

    /// Update the drag coordinate readout.
    pub fn set_readout(&mut self, text: Option<String>) {
        if self.readout == text {
            return;
        }
        if let Some(text) = &text {
            info!(position = %text, "readout");
        }
        self.readout = text;
    }

    #[must_use]
    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }

    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.drawn.len()
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
