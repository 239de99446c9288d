//! Shared application state: the live-game registry, the storage handle and
//! the degraded-mode flag.

pub mod broadcast;
pub mod clock;
pub mod live;
pub mod roster;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use crate::{config::GameRules, dao::game_store::GameStore, error::ServiceError};

pub use self::broadcast::GameHub;
pub use self::clock::{ClockError, ClockEvent, ClockPhase};
pub use self::live::{ActiveTimeout, LiveGame, LiveGameState, TeamLive};
pub use self::roster::{ON_COURT_SIZE, RosterError};

/// Shared handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state storing the scoring rules, storage handle and
/// the registry of games currently being scored.
pub struct AppState {
    rules: GameRules,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    live_games: DashMap<Uuid, Arc<LiveGame>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(rules: GameRules) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            rules,
            game_store: RwLock::new(None),
            live_games: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Scoring rules the server was started with.
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the game store or fail with [`ServiceError::Degraded`].
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn install_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Look up the in-memory session of a game being scored right now.
    pub fn live(&self, game_id: Uuid) -> Option<Arc<LiveGame>> {
        self.live_games.get(&game_id).map(|entry| entry.clone())
    }

    /// Register a game session in the live registry.
    ///
    /// Returns `false` without touching the registry when the game already has
    /// a live session, so concurrent starts of the same game cannot both win.
    pub fn register_live(&self, live: Arc<LiveGame>) -> bool {
        match self.live_games.entry(live.game_id) {
            dashmap::Entry::Occupied(_) => false,
            dashmap::Entry::Vacant(slot) => {
                slot.insert(live);
                true
            }
        }
    }

    /// Drop a finished game from the live registry.
    pub fn remove_live(&self, game_id: Uuid) {
        self.live_games.remove(&game_id);
    }

    /// Number of games currently being scored.
    pub fn live_count(&self) -> usize {
        self.live_games.len()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        let _ = self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
