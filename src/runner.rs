//! Host loop: drives the engine from a frame timer, a flush timer, external
//! sources, and line commands, and carries out the actions it returns.
//!
//! DESIGN
//! ======
//! The engine is synchronous and owned by this loop alone. Source tasks and
//! the stdin reader communicate through channels, so every mutation happens
//! on one task in a fixed order: queued link events, then the frame tick.
//! Persistence is debounced through the store's dirty set and flushed on its
//! own interval, plus once more on shutdown.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use scene::input::{PointerEvent, PointerPhase};
use scene::snapshot;
use scene::{Action, Engine, Entity, EntityId, EntityKind, LinkEvent};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::command::{self, Command, CommandError, Toggle};
use crate::config::Config;
use crate::render::Renderer;
use crate::source::{self, SourceEvent};
use crate::store::{self, Store, StoreError};

const LINK_CHANNEL_CAPACITY: usize = 256;
const COMMAND_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One row of `list` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRow<'a> {
    id: EntityId,
    kind: EntityKind,
    name: &'a str,
    x: f64,
    y: f64,
    render_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_id: Option<EntityId>,
}

pub struct Runner {
    engine: Engine,
    store: Store,
    renderer: Renderer,
    config: Config,
    links: HashMap<EntityId, JoinHandle<()>>,
    link_tx: mpsc::Sender<SourceEvent>,
    link_rx: mpsc::Receiver<SourceEvent>,
    started: Instant,
}

impl Runner {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let mut engine = Engine::new(config.viewport());
        engine.collisions_enabled = config.collisions;
        let (link_tx, link_rx) = mpsc::channel(LINK_CHANNEL_CAPACITY);
        Self {
            engine,
            store: Store::new(config.store_path.clone()),
            renderer: Renderer::new(),
            config,
            links: HashMap::new(),
            link_tx,
            link_rx,
            started: Instant::now(),
        }
    }

    /// Load the stored scene, or seed the default scene when storage is empty.
    ///
    /// # Errors
    ///
    /// Returns the store error when the file exists but cannot be read or
    /// parsed. The file is left alone in that case.
    pub async fn bootstrap(&mut self) -> Result<(), StoreError> {
        let actions = match self.store.load().await? {
            Some(snapshot) => self.engine.load_snapshot(snapshot),
            None => {
                info!(path = %self.store.path().display(), "no stored scene; seeding default");
                self.engine.load_snapshot(snapshot::default_scene())
            }
        };
        self.dispatch(actions);
        Ok(())
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Carry out engine side effects.
    pub fn dispatch(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Persist(id) => self.store.mark(id),
                Action::Render(id) => {
                    self.renderer.render(&self.engine, id);
                }
                Action::Removed(id) => {
                    self.store.mark(id);
                    self.renderer.remove(id);
                    self.drop_link(id);
                }
                Action::EditRequested(id) => self.show_edit_form(id),
                Action::Coordinates(text) => self.renderer.set_readout(text),
                Action::SceneReplaced => {
                    self.store.mark_all();
                    let drawn = self.renderer.redraw_all(&self.engine);
                    let stale: Vec<EntityId> =
                        self.links.keys().filter(|id| !self.engine.scene.contains(id)).copied().collect();
                    for id in stale {
                        self.drop_link(id);
                    }
                    debug!(drawn, "scene redrawn");
                }
            }
        }
    }

    fn show_edit_form(&self, id: EntityId) {
        let Some(entity) = self.engine.scene.get(&id) else {
            return;
        };
        match serde_json::to_string(entity) {
            Ok(json) => info!(%id, entity = %json, "edit requested"),
            Err(e) => warn!(%id, error = %e, "edit requested; entity not serializable"),
        }
    }

    fn drop_link(&mut self, id: EntityId) {
        if let Some(handle) = self.links.remove(&id) {
            handle.abort();
            debug!(receiver = %id, "source task stopped");
        }
    }

    // =========================================================================
    // FRAME / FLUSH
    // =========================================================================

    /// Drain queued link events, then run one engine frame.
    pub fn frame(&mut self) {
        while let Ok((id, event)) = self.link_rx.try_recv() {
            if matches!(event, LinkEvent::Closed | LinkEvent::Failed(_)) {
                self.links.remove(&id);
            }
            let actions = self.engine.on_link_event(id, event);
            self.dispatch(actions);
        }
        let actions = self.engine.tick();
        self.dispatch(actions);
    }

    /// Write dirty state to the store. Failures keep the dirty set.
    pub async fn flush(&mut self) {
        if !self.store.is_dirty() {
            return;
        }
        match self.store.flush(&self.engine.snapshot()).await {
            Ok(written) => debug!(written, "scene flushed"),
            Err(e) => error!(error = %e, pending = self.store.dirty_count(), "scene flush failed"),
        }
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn pointer(&mut self, phase: PointerPhase, x: f64, y: f64) {
        let event = PointerEvent::new(phase, x, y, self.now_ms());
        let actions = self.engine.on_pointer(event);
        self.dispatch(actions);
    }

    pub async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Down { x, y } => self.pointer(PointerPhase::Down, x, y),
            Command::Move { x, y } => self.pointer(PointerPhase::Move, x, y),
            Command::Up { x, y } => self.pointer(PointerPhase::Up, x, y),
            Command::Slide { id, value } => match self.engine.set_slider(id, value) {
                Ok(actions) => self.dispatch(actions),
                Err(e) => warn!(%id, error = %e, "slide rejected"),
            },
            Command::Export { path } => self.export(path).await,
            Command::Import { path } => self.import(path).await,
            Command::Create { json } => self.create(&Command::payload(&json)),
            Command::Update { json } => self.update(&Command::payload(&json)),
            Command::Delete { id } => match self.engine.delete(id) {
                Ok(actions) => self.dispatch(actions),
                Err(e) => warn!(%id, error = %e, "delete rejected"),
            },
            Command::Dup { id } => match self.engine.duplicate(id) {
                Ok((copy, actions)) => {
                    info!(%id, %copy, "duplicated");
                    self.dispatch(actions);
                }
                Err(e) => warn!(%id, error = %e, "duplicate rejected"),
            },
            Command::Connect { id, path } => self.connect(id, path),
            Command::Disconnect { id } => {
                self.drop_link(id);
                let actions = self.engine.on_link_event(id, LinkEvent::Closed);
                self.dispatch(actions);
            }
            Command::Collisions { state } => {
                self.engine.collisions_enabled = state == Toggle::On;
                info!(enabled = self.engine.collisions_enabled, "collisions toggled");
            }
            Command::List => self.list(),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn export(&self, path: Option<PathBuf>) {
        let snapshot = self.engine.snapshot();
        match path {
            Some(path) => match store::export_to(&path, &snapshot).await {
                Ok(()) => info!(path = %path.display(), entities = snapshot.objects.len(), "scene exported"),
                Err(e) => error!(error = %e, "export failed"),
            },
            None => match snapshot::to_json(&snapshot) {
                Ok(json) => println!("{json}"),
                Err(e) => error!(error = %e, "export failed"),
            },
        }
    }

    async fn import(&mut self, path: PathBuf) {
        let payload = match store::read_payload(&path).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "import failed");
                return;
            }
        };
        match self.engine.import_json(&payload) {
            Ok(actions) => {
                info!(path = %path.display(), entities = self.engine.scene.len(), "scene imported");
                self.dispatch(actions);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "import rejected; scene unchanged"),
        }
    }

    fn create(&mut self, json: &str) {
        let entity: Entity = match serde_json::from_str(json) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(error = %e, "create rejected; invalid entity");
                return;
            }
        };
        match self.engine.create(entity) {
            Ok((id, actions)) => {
                info!(%id, "created");
                self.dispatch(actions);
            }
            Err(e) => warn!(error = %e, "create rejected"),
        }
    }

    fn update(&mut self, json: &str) {
        let entity: Entity = match serde_json::from_str(json) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(error = %e, "update rejected; invalid entity");
                return;
            }
        };
        let id = entity.id;
        match self.engine.update(entity) {
            Ok(actions) => self.dispatch(actions),
            Err(e) => warn!(%id, error = %e, "update rejected"),
        }
    }

    fn connect(&mut self, id: EntityId, path: Option<PathBuf>) {
        if self.engine.scene.get(&id).and_then(|e| e.as_receiver()).is_none() {
            warn!(%id, "connect: not an external receiver");
            return;
        }
        let Some(path) = path.or_else(|| self.config.serial_path.clone()) else {
            warn!(%id, "connect: no source path given or configured");
            return;
        };
        self.drop_link(id);
        let handle = source::spawn_source(path, id, self.link_tx.clone());
        self.links.insert(id, handle);
    }

    fn list(&self) {
        if let Some(readout) = self.renderer.readout() {
            info!(position = readout, "dragging");
        }
        for entity in self.engine.scene.sorted_entities() {
            let row = ListRow {
                id: entity.id,
                kind: entity.kind(),
                name: &entity.name,
                x: entity.x,
                y: entity.y,
                render_order: entity.render_order,
                group_id: entity.group_id,
            };
            match serde_json::to_string(&row) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(id = %entity.id, error = %e, "list row not serializable"),
            }
        }
    }

    // =========================================================================
    // LOOP
    // =========================================================================

    /// Run until `quit` or Ctrl-C. A closed command channel only stops
    /// command input; frames keep running.
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>) {
        let mut frames = time::interval(self.config.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut flushes = time::interval(self.config.flush_interval());
        flushes.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        info!(fps = self.config.fps, flush_ms = self.config.flush_ms, "frame loop started");
        loop {
            tokio::select! {
                _ = frames.tick() => self.frame(),
                _ = flushes.tick() => self.flush().await,
                line = lines.recv(), if commands_open => {
                    let Some(line) = line else {
                        debug!("command input closed");
                        commands_open = false;
                        continue;
                    };
                    match command::parse(&line) {
                        Ok(cmd) => {
                            if self.handle(cmd).await == Flow::Quit {
                                break;
                            }
                        }
                        Err(CommandError::Empty) => {}
                        Err(e) => warn!(input = %line.trim(), error = %e, "command ignored"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted");
                    break;
                }
            }
        }
        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        for (_, handle) in self.links.drain() {
            handle.abort();
        }
        self.flush().await;
        info!(entities = self.renderer.drawn_count(), "frame loop stopped");
    }
}

/// Forward stdin lines into a channel. The channel closes at end of input.
#[must_use]
pub fn spawn_stdin() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
