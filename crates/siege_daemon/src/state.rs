use parking_lot::Mutex;
use siege_control::AutopilotController;
use siege_core::{EventEnvelope, GameContent, GameState, Transition};
use siege_world::SaveStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

/// The single live game. Every operation runs under the lock, so callers are
/// serialized and each one sees the previous result.
pub struct SimState {
    pub game_state: GameState,
    pub content: GameContent,
    /// `None` when started without `--save-dir`.
    pub store: Option<SaveStore>,
    pub autopilot: AutopilotController,
    /// Bumped on every change to `game_state`; orders autosaves.
    pub revision: u64,
    /// Highest revision written to disk so far.
    pub saved_revision: Arc<Mutex<u64>>,
}

impl SimState {
    pub fn new(game_state: GameState, content: GameContent, store: Option<SaveStore>) -> Self {
        Self {
            game_state,
            content,
            store,
            autopilot: AutopilotController::default(),
            revision: 0,
            saved_revision: Arc::new(Mutex::new(0)),
        }
    }

    /// Keep the successor snapshot and hand back its events for broadcast.
    pub fn commit(&mut self, transition: Transition) -> Vec<EventEnvelope> {
        self.replace(transition.state);
        transition.events
    }

    pub fn replace(&mut self, game_state: GameState) {
        self.game_state = game_state;
        self.revision += 1;
    }

    /// Snapshot to write once the lock is released; `None` without a store.
    pub fn pending_save(&self) -> Option<PendingSave> {
        self.store.as_ref().map(|store| PendingSave {
            store: store.clone(),
            game_state: self.game_state.clone(),
            revision: self.revision,
            saved_revision: Arc::clone(&self.saved_revision),
        })
    }
}

pub struct PendingSave {
    store: SaveStore,
    game_state: GameState,
    revision: u64,
    saved_revision: Arc<Mutex<u64>>,
}

impl PendingSave {
    /// Write on the blocking pool. A snapshot older than one already on disk
    /// is skipped.
    pub async fn write(self) {
        let result = tokio::task::spawn_blocking(move || {
            let mut saved = self.saved_revision.lock();
            if self.revision >= *saved {
                self.store.save(&self.game_state);
                *saved = self.revision;
            }
        })
        .await;
        if let Err(err) = result {
            tracing::warn!("autosave task failed: {err}");
        }
    }
}

/// Write `pending` if there is one.
pub async fn persist(pending: Option<PendingSave>) {
    if let Some(pending) = pending {
        pending.write().await;
    }
}

pub type SharedSim = Arc<Mutex<SimState>>;
pub type EventTx = broadcast::Sender<Vec<EventEnvelope>>;

#[derive(Clone)]
pub struct AppState {
    pub sim: SharedSim,
    pub event_tx: EventTx,
    /// Pauses the autoplay loop; manual commands still go through.
    pub paused: Arc<AtomicBool>,
    /// Autoplay speed; 0 means the game only moves on `POST /advance`.
    pub cycles_per_sec: f64,
}
