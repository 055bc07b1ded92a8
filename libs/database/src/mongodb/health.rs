use mongodb::Client;
use mongodb::bson::doc;

use crate::common::DatabaseResult;

/// Runs `{ping: 1}` against the admin database.
pub async fn check_health(client: &Client) -> DatabaseResult<()> {
    client.database("admin").run_command(doc! { "ping": 1 }).await?;
    Ok(())
}
