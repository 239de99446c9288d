use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for the MongoDB store.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB game store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// Driver client could not be built.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// Initial connectivity probe never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// Periodic health probe failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    /// Game upsert failed.
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Game lookup failed.
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Game listing failed.
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    /// Journal insert failed.
    #[error("failed to append action `{id}`")]
    AppendAction {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Batched journal insert failed.
    #[error("failed to append the action batch for game `{game_id}`")]
    AppendActions {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
    /// In-place journal replacement failed.
    #[error("failed to update action `{id}`")]
    UpdateAction {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Journal row lookup failed.
    #[error("failed to load action `{id}`")]
    LoadAction {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    /// Journal scan failed.
    #[error("failed to load the action journal of game `{game_id}`")]
    LoadJournal {
        game_id: Uuid,
        #[source]
        source: MongoError,
    },
}
