use crate::expiry;
use crate::models::{Episode, Show};
use chrono::{Days, NaiveDate};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, DbBackend,
    TransactionTrait,
};
use sea_orm_migration::prelude::SchemaManager;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod error;
pub mod migrator;
pub mod repositories;

pub use error::StoreError;
pub use migrator::{LATEST_VERSION, MIGRATION_DISABLED};

use repositories::episode::EpisodeRepository;
use repositories::meta::MetaRepository;
use repositories::show::ShowRepository;

/// Durable storage for shows, episodes and metadata.
///
/// A `Store` is always inside a transaction: every read and write goes through it, and
/// [`commit`](Self::commit) or [`rollback`](Self::rollback) immediately opens the next
/// one. Callers must serialize access.
pub struct Store {
    url: String,
    conn: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

impl Store {
    /// Opens (creating if needed) the store behind `identifier` and migrates its schema.
    ///
    /// Identifiers containing `://` or starting with `sqlite:` are connection URLs;
    /// anything else is a path to a SQLite file.
    pub async fn open(identifier: &str) -> Result<Self, StoreError> {
        let url = connection_url(identifier).await?;

        let mut opt = ConnectOptions::new(url.clone());
        opt.max_connections(1)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        let txn = conn.begin().await?;
        let mut store = Self {
            url,
            conn,
            txn: Some(txn),
        };

        let version = store.migrate().await?;
        info!(url = %store.url, version, "Database opened");

        Ok(store)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn txn(&self) -> Result<&DatabaseTransaction, StoreError> {
        self.txn.as_ref().ok_or(StoreError::Closed)
    }

    fn show_repo(&self) -> Result<ShowRepository<'_>, StoreError> {
        Ok(ShowRepository::new(self.txn()?))
    }

    fn episode_repo(&self) -> Result<EpisodeRepository<'_>, StoreError> {
        Ok(EpisodeRepository::new(self.txn()?))
    }

    fn meta_repo(&self) -> Result<MetaRepository<'_>, StoreError> {
        Ok(MetaRepository::new(self.txn()?))
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Upgrades the schema to the latest version and commits.
    ///
    /// Anything pending in the current transaction is committed along with it.
    pub async fn migrate(&mut self) -> Result<i32, StoreError> {
        let version = migrator::migrate(&SchemaManager::new(self.txn()?)).await?;
        self.commit().await?;
        Ok(version)
    }

    pub async fn get_schema_version(&self) -> Result<i32, StoreError> {
        let version = migrator::detect_version(&SchemaManager::new(self.txn()?)).await?;
        Ok(version.unwrap_or(LATEST_VERSION))
    }

    pub async fn set_schema_version(&self, version: i32) -> Result<(), StoreError> {
        self.set_meta(migrator::SCHEMA_KEY, &version.to_string())
            .await
    }

    pub async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.meta_repo()?.get(key).await?)
    }

    pub async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.meta_repo()?.set(key, value).await?)
    }

    // ========================================================================
    // Shows
    // ========================================================================

    /// Persists `show`, returning it with its identity assigned.
    ///
    /// Fails with [`StoreError::DuplicateUrl`] when another show owns the same url.
    pub async fn add_show(&self, show: &Show) -> Result<Show, StoreError> {
        let saved = self.show_repo()?.save(show).await?;
        debug!(show_id = ?saved.id, url = %saved.url, "Saved show");
        Ok(saved)
    }

    pub async fn get_show_by_id(&self, id: i32) -> Result<Option<Show>, StoreError> {
        Ok(self.show_repo()?.get(id).await?)
    }

    pub async fn get_show_by_url(&self, url: &str) -> Result<Option<Show>, StoreError> {
        Ok(self.show_repo()?.get_by_url(url).await?)
    }

    pub async fn get_shows(&self) -> Result<Vec<Show>, StoreError> {
        Ok(self.show_repo()?.list().await?)
    }

    pub async fn get_enabled_shows(&self) -> Result<Vec<Show>, StoreError> {
        Ok(self.show_repo()?.list_enabled().await?)
    }

    /// Enabled shows that are due for a refresh on `today`.
    pub async fn get_expired_shows(&self, today: NaiveDate) -> Result<Vec<Show>, StoreError> {
        let shows = self.get_enabled_shows().await?;
        Ok(shows
            .into_iter()
            .filter(|show| expiry::is_expired(show, today))
            .collect())
    }

    pub async fn remove_show(&self, id: i32) -> Result<(), StoreError> {
        if self.show_repo()?.remove(id).await? {
            info!(show_id = id, "Removed show");
        } else {
            warn!(show_id = id, "No show with this id, nothing removed");
        }
        Ok(())
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    pub async fn add_episode(&self, episode: &Episode, show: &Show) -> Result<(), StoreError> {
        let show_id = show
            .id
            .ok_or_else(|| StoreError::UnsavedShow(show.name.clone()))?;
        Ok(self.episode_repo()?.upsert(show_id, episode).await?)
    }

    /// Episodes airing between `basedate` and `basedate + n_days`, both inclusive.
    pub async fn get_episodes(
        &self,
        basedate: NaiveDate,
        n_days: u64,
    ) -> Result<Vec<Episode>, StoreError> {
        let end = basedate
            .checked_add_days(Days::new(n_days))
            .unwrap_or(NaiveDate::MAX);
        Ok(self.episode_repo()?.between(basedate, end).await?)
    }

    pub async fn get_show_episodes(&self, show: &Show) -> Result<Vec<Episode>, StoreError> {
        let show_id = show
            .id
            .ok_or_else(|| StoreError::UnsavedShow(show.name.clone()))?;
        Ok(self.episode_repo()?.for_show(show_id).await?)
    }

    /// Case-insensitive substring match on episode title or show name.
    pub async fn search(&self, text: &str) -> Result<Vec<Episode>, StoreError> {
        Ok(self.episode_repo()?.search(text).await?)
    }

    pub async fn remove_before(
        &self,
        date: NaiveDate,
        show: Option<&Show>,
    ) -> Result<u64, StoreError> {
        let show_id = show.and_then(|s| s.id);
        if show.is_some() && show_id.is_none() {
            return Ok(0);
        }

        let removed = self.episode_repo()?.remove_before(date, show_id).await?;
        debug!(%date, ?show_id, removed, "Removed old episodes");
        Ok(removed)
    }

    /// Deletes every episode; shows are kept.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        Ok(self.episode_repo()?.clear().await?)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    pub async fn commit(&mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::Closed)?;
        let result = txn.commit().await;
        self.txn = Some(self.conn.begin().await?);
        Ok(result?)
    }

    pub async fn rollback(&mut self) -> Result<(), StoreError> {
        let txn = self.txn.take().ok_or(StoreError::Closed)?;
        let result = txn.rollback().await;
        self.txn = Some(self.conn.begin().await?);
        Ok(result?)
    }

    /// Commits pending work and releases the connection.
    pub async fn close(mut self) -> Result<(), StoreError> {
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
        }
        self.conn.close().await?;
        debug!(url = %self.url, "Database closed");
        Ok(())
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Episoder Database at {}", self.url)
    }
}

async fn connection_url(identifier: &str) -> Result<String, StoreError> {
    if identifier.contains("://") || identifier.starts_with("sqlite:") {
        backend_for(identifier)?;
        return Ok(identifier.to_string());
    }

    let path = Path::new(identifier);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    if !tokio::fs::try_exists(path).await? {
        tokio::fs::File::create(path).await?;
    }

    Ok(format!("sqlite:{identifier}"))
}

/// Backend selected by a connection URL's scheme.
fn backend_for(url: &str) -> Result<DbBackend, StoreError> {
    let scheme = url.split_once(':').map_or(url, |(scheme, _)| scheme);
    match scheme {
        "sqlite" => Ok(DbBackend::Sqlite),
        "postgres" | "postgresql" => Ok(DbBackend::Postgres),
        _ => Err(StoreError::UnsupportedBackend(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShowStatus;
    use chrono::NaiveDateTime;

    async fn memory_store() -> Store {
        Store::open("sqlite::memory:").await.unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
    }

    fn ep(title: &str, season: i32, episode: i32, airdate: NaiveDate) -> Episode {
        Episode::new(title, season, episode, airdate, "x", 1)
    }

    #[tokio::test]
    async fn fresh_store_is_latest_version() {
        let store = memory_store().await;
        assert_eq!(store.get_schema_version().await.unwrap(), LATEST_VERSION);
        assert_eq!(
            store.get_meta("schema").await.unwrap(),
            Some(LATEST_VERSION.to_string())
        );
        assert_eq!(store.to_string(), "Episoder Database at sqlite::memory:");
    }

    #[tokio::test]
    async fn add_show_assigns_identity() {
        let store = memory_store().await;

        let a = store.add_show(&Show::new("A", "a")).await.unwrap();
        let b = store.add_show(&Show::new("B", "b")).await.unwrap();
        assert!(a.id.is_some());
        assert_ne!(a.id, b.id);

        let shows = store.get_shows().await.unwrap();
        assert_eq!(shows.len(), 2);
        assert_eq!(store.get_show_by_url("b").await.unwrap(), Some(b.clone()));
        assert_eq!(store.get_show_by_id(b.id.unwrap()).await.unwrap(), Some(b));
        assert_eq!(store.get_show_by_url("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn add_show_updates_existing_row() {
        let store = memory_store().await;

        let mut show = store.add_show(&Show::new("A", "a")).await.unwrap();
        show.name = "Renamed".to_string();
        show.status = ShowStatus::Ended;
        show.updated = datetime(2017, 1, 1);
        show.enabled = false;
        store.add_show(&show).await.unwrap();

        let shows = store.get_shows().await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].name, "Renamed");
        assert_eq!(shows[0].status, ShowStatus::Ended);
        assert_eq!(shows[0].updated, datetime(2017, 1, 1));
        assert!(!shows[0].enabled);
    }

    #[tokio::test]
    async fn duplicate_url_is_rejected() {
        let mut store = memory_store().await;

        store.add_show(&Show::new("A", "a")).await.unwrap();
        store.commit().await.unwrap();

        let err = store.add_show(&Show::new("B", "a")).await.unwrap_err();
        assert!(err.is_duplicate_url(), "unexpected error: {err}");

        store.rollback().await.unwrap();
        let shows = store.get_shows().await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].name, "A");

        store.add_show(&Show::new("B", "b")).await.unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.get_shows().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn enabled_shows_only() {
        let store = memory_store().await;

        store.add_show(&Show::new("A", "a")).await.unwrap();
        let mut hidden = Show::new("B", "b");
        hidden.enabled = false;
        store.add_show(&hidden).await.unwrap();

        let enabled = store.get_enabled_shows().await.unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "A");
    }

    #[tokio::test]
    async fn expired_shows() {
        let store = memory_store().await;
        let today = date(2017, 1, 10);

        let mut fresh = Show::new("fresh", "1");
        fresh.updated = datetime(2017, 1, 9);
        let mut stale = Show::new("stale", "2");
        stale.updated = datetime(2017, 1, 5);
        let mut ended = Show::new("ended", "3");
        ended.updated = datetime(2017, 1, 5);
        ended.status = ShowStatus::Ended;
        let mut disabled = Show::new("disabled", "4");
        disabled.updated = datetime(2016, 1, 1);
        disabled.enabled = false;

        for show in [&fresh, &stale, &ended, &disabled] {
            store.add_show(show).await.unwrap();
        }

        let expired = store.get_expired_shows(today).await.unwrap();
        let names: Vec<&str> = expired.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["stale"]);
    }

    #[tokio::test]
    async fn add_episode_requires_saved_show() {
        let store = memory_store().await;
        let err = store
            .add_episode(&ep("e", 1, 1, date(2017, 1, 1)), &Show::new("A", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsavedShow(_)));
    }

    #[tokio::test]
    async fn add_episode_overwrites_same_key() {
        let store = memory_store().await;
        let show = store.add_show(&Show::new("A", "a")).await.unwrap();

        store
            .add_episode(&ep("First", 1, 1, date(2017, 1, 1)), &show)
            .await
            .unwrap();
        store
            .add_episode(&ep("Renamed", 1, 1, date(2017, 1, 2)), &show)
            .await
            .unwrap();

        let episodes = store.get_show_episodes(&show).await.unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].title, "Renamed");
        assert_eq!(episodes[0].airdate, date(2017, 1, 2));
        assert_eq!(episodes[0].show.as_ref().map(|s| s.name.as_str()), Some("A"));
    }

    #[tokio::test]
    async fn refetch_keeps_notified_date() {
        let store = memory_store().await;
        let show = store.add_show(&Show::new("A", "a")).await.unwrap();

        let mut episode = ep("First", 1, 1, date(2017, 1, 1));
        episode.notified = Some(date(2017, 1, 2));
        store.add_episode(&episode, &show).await.unwrap();
        store
            .add_episode(&ep("First", 1, 1, date(2017, 1, 1)), &show)
            .await
            .unwrap();

        let episodes = store.get_show_episodes(&show).await.unwrap();
        assert_eq!(episodes[0].notified, Some(date(2017, 1, 2)));
    }

    #[tokio::test]
    async fn get_episodes_window_is_inclusive() {
        let store = memory_store().await;
        let show = store.add_show(&Show::new("A", "a")).await.unwrap();

        store.add_episode(&ep("1", 1, 1, date(2017, 1, 1)), &show).await.unwrap();
        store.add_episode(&ep("3", 1, 3, date(2017, 1, 3)), &show).await.unwrap();
        store.add_episode(&ep("2", 1, 2, date(2017, 1, 2)), &show).await.unwrap();
        store.add_episode(&ep("4", 1, 4, date(2017, 1, 4)), &show).await.unwrap();

        let episodes = store.get_episodes(date(2017, 1, 2), 1).await.unwrap();
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["2", "3"]);

        let episodes = store.get_episodes(date(2017, 1, 1), 0).await.unwrap();
        assert_eq!(episodes.len(), 1);
    }

    #[tokio::test]
    async fn search_matches_title_or_show_name() {
        let store = memory_store().await;
        let lost = store.add_show(&Show::new("Lost", "a")).await.unwrap();
        let other = store.add_show(&Show::new("Other", "b")).await.unwrap();

        store
            .add_episode(&ep("Pilot", 1, 1, date(2017, 1, 1)), &lost)
            .await
            .unwrap();
        store
            .add_episode(&ep("The Lost Key", 1, 1, date(2017, 1, 2)), &other)
            .await
            .unwrap();
        store
            .add_episode(&ep("Nothing", 1, 2, date(2017, 1, 3)), &other)
            .await
            .unwrap();

        let found = store.search("lost").await.unwrap();
        let titles: Vec<&str> = found.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Pilot", "The Lost Key"]);
        assert!(store.search("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_before_is_strict_and_scoped() {
        let store = memory_store().await;
        let a = store.add_show(&Show::new("A", "a")).await.unwrap();
        let b = store.add_show(&Show::new("B", "b")).await.unwrap();

        for show in [&a, &b] {
            store.add_episode(&ep("old", 1, 1, date(2017, 1, 1)), show).await.unwrap();
            store.add_episode(&ep("edge", 1, 2, date(2017, 1, 5)), show).await.unwrap();
        }

        assert_eq!(store.remove_before(date(2017, 1, 5), Some(&a)).await.unwrap(), 1);
        assert_eq!(store.get_show_episodes(&a).await.unwrap().len(), 1);
        assert_eq!(store.get_show_episodes(&b).await.unwrap().len(), 2);

        assert_eq!(store.remove_before(date(2017, 1, 5), None).await.unwrap(), 1);
        assert_eq!(store.get_show_episodes(&b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_show_cascades_to_episodes() {
        let store = memory_store().await;
        let a = store.add_show(&Show::new("A", "a")).await.unwrap();
        let b = store.add_show(&Show::new("B", "b")).await.unwrap();
        store.add_episode(&ep("1", 1, 1, date(2017, 1, 1)), &a).await.unwrap();
        store.add_episode(&ep("2", 1, 1, date(2017, 1, 1)), &b).await.unwrap();

        store.remove_show(a.id.unwrap()).await.unwrap();
        store.remove_show(a.id.unwrap()).await.unwrap();
        store.remove_show(9999).await.unwrap();

        assert_eq!(store.get_shows().await.unwrap(), vec![b]);
        assert_eq!(store.get_episodes(date(2017, 1, 1), 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_keeps_shows() {
        let store = memory_store().await;
        let a = store.add_show(&Show::new("A", "a")).await.unwrap();
        store.add_episode(&ep("1", 1, 1, date(2017, 1, 1)), &a).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.get_episodes(date(2017, 1, 1), 0).await.unwrap().is_empty());
        assert_eq!(store.get_shows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_uncommitted_work() {
        let mut store = memory_store().await;

        store.add_show(&Show::new("kept", "a")).await.unwrap();
        store.commit().await.unwrap();
        store.add_show(&Show::new("dropped", "b")).await.unwrap();
        store.rollback().await.unwrap();

        let shows = store.get_shows().await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].name, "kept");
    }

    #[tokio::test]
    async fn meta_is_an_upsert() {
        let store = memory_store().await;
        assert_eq!(store.get_meta("k").await.unwrap(), None);
        store.set_meta("k", "1").await.unwrap();
        store.set_meta("k", "2").await.unwrap();
        assert_eq!(store.get_meta("k").await.unwrap(), Some("2".to_string()));

        store.set_schema_version(3).await.unwrap();
        assert_eq!(store.get_schema_version().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let mut store = memory_store().await;
        assert_eq!(store.migrate().await.unwrap(), LATEST_VERSION);
        assert_eq!(store.migrate().await.unwrap(), LATEST_VERSION);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn file_identifier_creates_parent_directory() {
        let dir = std::env::temp_dir().join(format!("episoder-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("episodes.db");

        let store = Store::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        assert!(store.url().starts_with("sqlite:"));
        store.close().await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn backend_follows_url_scheme() {
        assert_eq!(backend_for("sqlite::memory:").unwrap(), DbBackend::Sqlite);
        assert_eq!(backend_for("sqlite:///tmp/x.db").unwrap(), DbBackend::Sqlite);
        assert_eq!(
            backend_for("postgres://user@localhost/episoder").unwrap(),
            DbBackend::Postgres
        );
        assert_eq!(
            backend_for("postgresql://localhost/episoder").unwrap(),
            DbBackend::Postgres
        );
        assert!(matches!(
            backend_for("mysql://localhost/episoder"),
            Err(StoreError::UnsupportedBackend(scheme)) if scheme == "mysql"
        ));
    }

    #[tokio::test]
    async fn unsupported_backend_is_rejected_before_connecting() {
        let err = Store::open("mysql://localhost/episoder")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::UnsupportedBackend(_)), "unexpected error: {err}");
    }
}
