//! Collection access and the trait implementation.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoActionDocument, MongoGameDocument, doc_game_id, doc_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameActionEntity, GameEntity},
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const ACTION_COLLECTION_NAME: &str = "game_actions";

/// [`GameStore`] backed by two MongoDB collections: game records and the
/// append-only action journal. The database handle is swapped atomically on
/// reconnection, so clones of the store always see the live connection.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let games = database.collection::<mongodb::bson::Document>(GAME_COLLECTION_NAME);
        let game_index = mongodb::IndexModel::builder()
            .keys(doc! {"scheduled_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_scheduled_at_idx".to_owned()))
                    .build(),
            )
            .build();
        games
            .create_index(game_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "scheduled_at",
                source,
            })?;

        // Journal reads are always per game and in recording order.
        let actions = database.collection::<mongodb::bson::Document>(ACTION_COLLECTION_NAME);
        let action_index = mongodb::IndexModel::builder()
            .keys(doc! {"game_id": 1, "recorded_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("action_journal_idx".to_owned()))
                    .build(),
            )
            .build();
        actions
            .create_index(action_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ACTION_COLLECTION_NAME,
                index: "game_id,recorded_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn actions(&self) -> Collection<MongoActionDocument> {
        self.database()
            .await
            .collection::<MongoActionDocument>(ACTION_COLLECTION_NAME)
    }

    async fn save_game(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveGame { id, source })?;
        Ok(())
    }

    async fn find_game(&self, id: Uuid) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;
        Ok(document.map(GameEntity::from))
    }

    async fn list_games(&self) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"scheduled_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        Ok(documents.into_iter().map(GameEntity::from).collect())
    }

    async fn append_action(&self, action: GameActionEntity) -> MongoResult<()> {
        let id = action.id;
        let document: MongoActionDocument = action.into();
        self.actions()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendAction { id, source })?;
        Ok(())
    }

    async fn append_actions(&self, actions: Vec<GameActionEntity>) -> MongoResult<()> {
        let Some(game_id) = actions.first().map(|action| action.game_id) else {
            return Ok(());
        };
        let documents: Vec<MongoActionDocument> =
            actions.into_iter().map(Into::into).collect();
        self.actions()
            .await
            .insert_many(&documents)
            .await
            .map_err(|source| MongoDaoError::AppendActions { game_id, source })?;
        Ok(())
    }

    async fn update_action(&self, action: GameActionEntity) -> MongoResult<()> {
        let id = action.id;
        let document: MongoActionDocument = action.into();
        self.actions()
            .await
            .replace_one(doc_id(id), &document)
            .await
            .map_err(|source| MongoDaoError::UpdateAction { id, source })?;
        Ok(())
    }

    async fn find_action(&self, id: Uuid) -> MongoResult<Option<GameActionEntity>> {
        let document = self
            .actions()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadAction { id, source })?;
        Ok(document.map(GameActionEntity::from))
    }

    async fn load_actions(&self, game_id: Uuid) -> MongoResult<Vec<GameActionEntity>> {
        let documents: Vec<MongoActionDocument> = self
            .actions()
            .await
            .find(doc_game_id(game_id))
            .sort(doc! {"recorded_at": 1})
            .await
            .map_err(|source| MongoDaoError::LoadJournal { game_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadJournal { game_id, source })?;

        Ok(documents.into_iter().map(GameActionEntity::from).collect())
    }
}

impl GameStore for MongoGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn append_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_action(action).await.map_err(Into::into) })
    }

    fn append_actions(
        &self,
        actions: Vec<GameActionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_actions(actions).await.map_err(Into::into) })
    }

    fn update_action(&self, action: GameActionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_action(action).await.map_err(Into::into) })
    }

    fn find_action(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameActionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_action(id).await.map_err(Into::into) })
    }

    fn load_actions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameActionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_actions(game_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
