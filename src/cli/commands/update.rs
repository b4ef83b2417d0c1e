//! Update command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{UpdateOptions, shows_to_update, update_shows};
use crate::sources::SourceSelector;
use anyhow::Context;
use chrono::{Local, NaiveDate};

pub async fn cmd_update(
    config: &Config,
    force: bool,
    show_id: Option<i32>,
    remove_before: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let mut store = Store::open(&config.general.database_path).await?;

    let shows = if let Some(id) = show_id {
        let Some(show) = store.get_show_by_id(id).await? else {
            println!("Show with ID {id} not found.");
            println!("Use 'episoder shows' to see show IDs.");
            return Ok(());
        };
        vec![show]
    } else {
        shows_to_update(&store, Local::now().date_naive(), force).await?
    };

    if shows.is_empty() {
        println!("All shows are up to date.");
        store.close().await?;
        return Ok(());
    }

    let mut selector = SourceSelector::new();
    let options = UpdateOptions { remove_before };
    let summary = update_shows(&mut store, &mut selector, config, shows, &options)
        .await
        .context("Update aborted")?;

    store.close().await?;

    println!(
        "Updated {} show(s), {} failed, {} without a parser.",
        summary.updated, summary.failed, summary.skipped
    );
    Ok(())
}
