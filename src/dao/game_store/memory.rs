//! In-memory [`GameStore`] used by tests and storage-less deployments.

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameActionEntity, GameEntity},
    storage::StorageResult,
};

/// Process-local store keeping games and journals in concurrent maps.
///
/// Journal order is tracked explicitly per game so `load_actions` returns rows
/// in recording order even after in-place updates.
#[derive(Default)]
pub struct MemoryGameStore {
    games: DashMap<Uuid, GameEntity>,
    actions: DashMap<Uuid, GameActionEntity>,
    journal_order: DashMap<Uuid, Vec<Uuid>>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.games.insert(game.id, game);
        Box::pin(async { Ok(()) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let found = self.games.get(&id).map(|entry| entry.clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let mut games: Vec<GameEntity> =
            self.games.iter().map(|entry| entry.value().clone()).collect();
        games.sort_by_key(|game| game.scheduled_at);
        Box::pin(async move { Ok(games) })
    }

    fn append_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.journal_order
            .entry(action.game_id)
            .or_default()
            .push(action.id);
        self.actions.insert(action.id, action);
        Box::pin(async { Ok(()) })
    }

    fn append_actions(
        &self,
        actions: Vec<GameActionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        for action in actions {
            self.journal_order
                .entry(action.game_id)
                .or_default()
                .push(action.id);
            self.actions.insert(action.id, action);
        }
        Box::pin(async { Ok(()) })
    }

    fn update_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.actions.insert(action.id, action);
        Box::pin(async { Ok(()) })
    }

    fn find_action(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameActionEntity>>> {
        let found = self.actions.get(&id).map(|entry| entry.clone());
        Box::pin(async move { Ok(found) })
    }

    fn load_actions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameActionEntity>>> {
        let order = self
            .journal_order
            .get(&game_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        let rows = order
            .into_iter()
            .filter_map(|action_id| self.actions.get(&action_id).map(|entry| entry.clone()))
            .collect();
        Box::pin(async move { Ok(rows) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
