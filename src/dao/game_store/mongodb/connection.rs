//! Initial MongoDB connection with a bounded ping-retry loop.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const MAX_PING_ATTEMPTS: u32 = 10;
const INITIAL_PING_DELAY: Duration = Duration::from_millis(250);
const MAX_PING_DELAY: Duration = Duration::from_secs(5);

/// Build the client and wait for the server to answer a ping before handing
/// the database out, so the caller never starts with a dead handle.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<Database> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut attempts = 0;
    let mut delay = INITIAL_PING_DELAY;

    while let Err(err) = database.run_command(doc! { "ping": 1 }).await {
        attempts += 1;
        if attempts >= MAX_PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts,
                source: err,
            });
        }
        debug!(attempts, "mongodb ping failed; retrying");
        sleep(delay).await;
        delay = (delay * 2).min(MAX_PING_DELAY);
    }

    Ok(database)
}
