use crate::config::Config;
use crate::sources::{Source, Tvdb};

pub async fn cmd_lookup(config: &Config, term: &str) -> anyhow::Result<()> {
    let mut tvdb = Tvdb::new();
    tvdb.login(config).await?;

    let shows = tvdb.lookup(term, config).await?;
    if shows.is_empty() {
        println!("No results for '{term}'.");
        return Ok(());
    }

    println!("{:>8}  Name", "ID");
    for show in shows {
        println!("{:>8}  {}", show.url, show.name);
    }
    println!();
    println!("Add one with: episoder add <ID>");

    Ok(())
}
