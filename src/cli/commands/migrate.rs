use crate::config::Config;
use crate::db::{MIGRATION_DISABLED, Store};

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let mut store = Store::open(&config.general.database_path).await?;
    let version = store.migrate().await?;

    if version == MIGRATION_DISABLED {
        println!("Schema migrations are disabled for {}", store.url());
    } else {
        println!("{store} is at schema version {version}");
    }

    store.close().await?;
    Ok(())
}
