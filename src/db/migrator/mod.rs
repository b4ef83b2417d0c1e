//! Versioned schema upgrades.
//!
//! The schema version lives in the `meta` table under the `schema` key. Stores written
//! before that table existed are version 1. A version of `-1` marks a database whose
//! schema is managed by hand and is never touched.

use crate::entities::{meta, prelude::Meta};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm_migration::prelude::*;
use tracing::{info, warn};

mod m0001_initial;
mod m0002_recreate_tables;
mod m0003_show_status;
mod m0004_episode_notified;

pub const LATEST_VERSION: i32 = 4;
pub const MIGRATION_DISABLED: i32 = -1;
pub const SCHEMA_KEY: &str = "schema";

/// Upgrade steps, indexed by `from_version - 1`.
fn steps() -> Vec<Box<dyn MigrationTrait>> {
    vec![
        Box::new(m0002_recreate_tables::Migration),
        Box::new(m0003_show_status::Migration),
        Box::new(m0004_episode_notified::Migration),
    ]
}

/// Brings the schema reachable through `manager` up to [`LATEST_VERSION`].
///
/// Returns the version the database is at afterwards. Safe to call repeatedly.
pub async fn migrate(manager: &SchemaManager<'_>) -> Result<i32, DbErr> {
    let Some(mut version) = detect_version(manager).await? else {
        info!(version = LATEST_VERSION, "Creating database schema");
        m0001_initial::Migration.up(manager).await?;
        write_version(manager, LATEST_VERSION).await?;
        return Ok(LATEST_VERSION);
    };

    if version == MIGRATION_DISABLED {
        info!("Schema migrations disabled for this database");
        return Ok(version);
    }

    if !(1..=LATEST_VERSION).contains(&version) {
        warn!(version, "Unknown schema version, leaving database untouched");
        return Ok(version);
    }

    let steps = steps();
    while version < LATEST_VERSION {
        let Some(step) = usize::try_from(version - 1).ok().and_then(|i| steps.get(i)) else {
            return Err(DbErr::Migration(format!(
                "no migration from schema version {version}"
            )));
        };

        info!(
            from = version,
            to = version + 1,
            migration = step.name(),
            "Migrating database schema"
        );
        step.up(manager).await?;
        version += 1;
        write_version(manager, version).await?;
    }

    Ok(version)
}

/// Reads the stored schema version.
///
/// `None` means the database is empty and has never been initialised.
pub async fn detect_version(manager: &SchemaManager<'_>) -> Result<Option<i32>, DbErr> {
    let has_meta = manager.has_table("meta").await?;
    let has_shows = manager.has_table("shows").await?;

    if !has_meta {
        return Ok(has_shows.then_some(1));
    }

    let row = Meta::find()
        .filter(meta::Column::Key.eq(SCHEMA_KEY))
        .one(manager.get_connection())
        .await?;

    match row {
        None => Ok(Some(1)),
        Some(row) => row
            .value
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| DbErr::Custom(format!("invalid schema version: {}", row.value))),
    }
}

/// Stores `version` under the schema key.
///
/// Written as update-then-insert since older `meta` tables carry no primary key.
pub async fn write_version(manager: &SchemaManager<'_>, version: i32) -> Result<(), DbErr> {
    let conn = manager.get_connection();
    let result = Meta::update_many()
        .col_expr(meta::Column::Value, Expr::value(version.to_string()))
        .filter(meta::Column::Key.eq(SCHEMA_KEY))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        Meta::insert(meta::ActiveModel {
            key: Set(SCHEMA_KEY.to_string()),
            value: Set(version.to_string()),
        })
        .exec_without_returning(conn)
        .await?;
    }

    Ok(())
}

/// Swallows the error raised when a column being added already exists.
///
/// SQLite reports `duplicate column name`, Postgres `column ... already exists`.
pub(crate) fn ignore_duplicate_column(result: Result<(), DbErr>) -> Result<(), DbErr> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if is_duplicate_column(&e.to_string()) => Ok(()),
        Err(e) => Err(e),
    }
}

fn is_duplicate_column(message: &str) -> bool {
    message.contains("duplicate column")
        || (message.contains("column") && message.contains("already exists"))
}
