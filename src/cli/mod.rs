mod broadcast;
mod commands;
pub mod http_client;
mod prompt;
mod token;
mod vapid;

pub use broadcast::run_broadcast;
pub use commands::{AdminCommands, BroadcastArgs, TokenCommands, VapidCommands};
pub use token::{run_token_create, run_token_list, run_token_revoke};
pub use vapid::run_vapid_show;

use crate::config::ServerConfig;
use crate::store::SqliteStore;

/// Initialize store from data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<SqliteStore> {
    let config = ServerConfig::with_data_dir(data_dir);
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'herald admin init' first.",
            db_path.display()
        );
    }

    SqliteStore::new(&db_path).map_err(Into::into)
}
