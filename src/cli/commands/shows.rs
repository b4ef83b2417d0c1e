use crate::config::Config;
use crate::db::Store;
use crate::models::Show;
use crate::sources::SourceSelector;

pub async fn cmd_list_shows(config: &Config) -> anyhow::Result<()> {
    let store = Store::open(&config.general.database_path).await?;
    let shows = store.get_shows().await?;

    if shows.is_empty() {
        println!("No shows tracked.");
        println!();
        println!("Add one with: episoder add http://epguides.com/<name>");
        store.close().await?;
        return Ok(());
    }

    println!("Tracked shows ({} total)", shows.len());
    println!("{:-<70}", "");

    for show in &shows {
        let id = show.id.map_or_else(|| "?".to_string(), |id| id.to_string());
        let enabled = if show.enabled { "" } else { " [disabled]" };
        println!("{id:>4} {}{enabled}", show.name);
        println!(
            "     {} | {} | updated {}",
            show.url,
            show.status,
            show.updated.format("%Y-%m-%d %H:%M")
        );
    }

    store.close().await?;
    Ok(())
}

pub async fn cmd_add_show(config: &Config, url: &str) -> anyhow::Result<()> {
    let mut store = Store::open(&config.general.database_path).await?;

    match SourceSelector::new().select(url) {
        Some(source) => println!("Using {}", source.name()),
        None => println!("Warning: no parser accepts {url}, it will never be updated."),
    }

    match store.add_show(&Show::new("Unknown Show", url)).await {
        Ok(show) => {
            store.commit().await?;
            println!(
                "✓ Added show {} (ID: {})",
                show.url,
                show.id.unwrap_or_default()
            );
        }
        Err(e) if e.is_duplicate_url() => {
            store.rollback().await?;
            println!("A show with url {url} is already tracked.");
        }
        Err(e) => return Err(e.into()),
    }

    store.close().await?;
    Ok(())
}

pub async fn cmd_remove_show(config: &Config, id: i32) -> anyhow::Result<()> {
    let mut store = Store::open(&config.general.database_path).await?;

    let Some(show) = store.get_show_by_id(id).await? else {
        println!("Show with ID {id} not found.");
        store.close().await?;
        return Ok(());
    };

    store.remove_show(id).await?;
    store.commit().await?;
    println!("✓ Removed: {}", show.name);

    store.close().await?;
    Ok(())
}

pub async fn cmd_set_enabled(config: &Config, id: i32, enabled: bool) -> anyhow::Result<()> {
    let mut store = Store::open(&config.general.database_path).await?;

    let Some(mut show) = store.get_show_by_id(id).await? else {
        println!("Show with ID {id} not found.");
        store.close().await?;
        return Ok(());
    };

    show.enabled = enabled;
    store.add_show(&show).await?;
    store.commit().await?;

    let state = if enabled { "enabled" } else { "disabled" };
    println!("✓ {} {state}", show.name);

    store.close().await?;
    Ok(())
}
