//! Episode listing command handler

use crate::config::Config;
use crate::db::Store;
use crate::models::Episode;
use chrono::{Local, NaiveDate};

pub async fn cmd_list_episodes(
    config: &Config,
    date: Option<NaiveDate>,
    days: Option<u64>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let store = Store::open(&config.general.database_path).await?;

    let episodes = if let Some(text) = search {
        store.search(text).await?
    } else {
        let start = date.unwrap_or_else(|| Local::now().date_naive());
        store
            .get_episodes(start, days.unwrap_or(config.output.days))
            .await?
    };

    if episodes.is_empty() {
        println!("No episodes found.");
    }

    for episode in &episodes {
        println!("{}", format_episode(episode));
    }

    store.close().await?;
    Ok(())
}

fn format_episode(episode: &Episode) -> String {
    format!("{} {}", episode.airdate, episode)
}
