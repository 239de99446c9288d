use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Connection parameters of the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed driver options.
    pub options: ClientOptions,
    /// Database holding the game collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI, defaulting the database name.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("courtside").to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
