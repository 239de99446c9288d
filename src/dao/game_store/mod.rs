//! Store abstraction over game records and their action journals.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameActionEntity, GameEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for games and their action journals.
///
/// Journal rows are append-only from the store's point of view: `update_action`
/// replaces a row in place (corrections and soft deletions) but never removes it.
pub trait GameStore: Send + Sync {
    /// Insert or replace a game record.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// List every stored game.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Append a new journal row.
    fn append_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Append a batch of journal rows in one call.
    ///
    /// Used for rows that only make sense together, such as the two halves of
    /// a substitution: a failure leaves none of them journaled.
    fn append_actions(
        &self,
        actions: Vec<GameActionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing journal row (correction or soft deletion).
    fn update_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a single journal row by id.
    fn find_action(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameActionEntity>>>;
    /// Load the full journal of a game in recording order, deleted rows included.
    fn load_actions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameActionEntity>>>;
    /// Probe backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a dropped backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
