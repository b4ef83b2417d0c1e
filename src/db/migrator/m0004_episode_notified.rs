use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

/// Version 3 to 4: adds `episodes.notified` and tightens both data tables.
///
/// Older layouts allow NULL names and urls and do not enforce unique urls, and
/// constraints cannot be added to existing SQLite tables, so `shows` and `episodes` are
/// rebuilt as `*_new` copies and renamed into place.
///
/// Rows are carried over as follows:
/// - shows without a url are dropped, a missing name falls back to the url
/// - of several shows sharing a url, the one with the lowest id is kept
/// - episodes of dropped shows, or lacking part of their key, are dropped
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let conn = manager.get_connection();

        conn.execute_unprepared(create_shows_sql(backend)).await?;
        conn.execute_unprepared(create_episodes_sql(backend)).await?;

        conn.execute_unprepared(
            r"
            INSERT INTO shows_new (show_id, show_name, url, updated, enabled, status)
            SELECT
                show_id, COALESCE(show_name, url), url, updated,
                COALESCE(enabled, TRUE), COALESCE(status, 1)
            FROM shows
            WHERE show_id IN (
                SELECT MIN(show_id) FROM shows WHERE url IS NOT NULL GROUP BY url
            )
        ",
        )
        .await?;

        conn.execute_unprepared(
            r"
            INSERT INTO episodes_new (show_id, num, airdate, season, title, totalnum, prodnum)
            SELECT
                show_id, num, airdate, season,
                COALESCE(title, ''), COALESCE(totalnum, 0), COALESCE(CAST(prodnum AS TEXT), 'UNK')
            FROM episodes
            WHERE show_id IN (SELECT show_id FROM shows_new)
              AND num IS NOT NULL
              AND season IS NOT NULL
              AND airdate IS NOT NULL
            ON CONFLICT (show_id, season, num) DO NOTHING
        ",
        )
        .await?;

        conn.execute_unprepared("DROP TABLE episodes").await?;
        conn.execute_unprepared("DROP TABLE shows").await?;
        conn.execute_unprepared("ALTER TABLE shows_new RENAME TO shows")
            .await?;
        conn.execute_unprepared("ALTER TABLE episodes_new RENAME TO episodes")
            .await?;

        // Copied ids do not advance the serial sequence.
        if backend == DbBackend::Postgres {
            conn.execute_unprepared(
                "SELECT setval(pg_get_serial_sequence('shows', 'show_id'), \
                 COALESCE((SELECT MAX(show_id) FROM shows), 0) + 1, false)",
            )
            .await?;
        }

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

fn create_shows_sql(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => {
            r"
            CREATE TABLE shows_new (
                show_id SERIAL PRIMARY KEY,
                show_name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                updated TIMESTAMP,
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                status INTEGER NOT NULL DEFAULT 1
            )
        "
        }
        _ => {
            r"
            CREATE TABLE shows_new (
                show_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
                show_name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                updated DATETIME,
                enabled BOOLEAN NOT NULL DEFAULT 1,
                status INTEGER NOT NULL DEFAULT 1
            )
        "
        }
    }
}

fn create_episodes_sql(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => {
            r"
            CREATE TABLE episodes_new (
                show_id INTEGER NOT NULL,
                num INTEGER NOT NULL,
                airdate DATE NOT NULL,
                season INTEGER NOT NULL,
                title TEXT NOT NULL,
                totalnum INTEGER NOT NULL,
                prodnum TEXT NOT NULL,
                notified DATE,
                PRIMARY KEY (show_id, season, num),
                FOREIGN KEY (show_id) REFERENCES shows_new (show_id) ON DELETE CASCADE
            )
        "
        }
        _ => {
            r"
            CREATE TABLE episodes_new (
                show_id INTEGER NOT NULL,
                num INTEGER NOT NULL,
                airdate DATE NOT NULL,
                season INTEGER NOT NULL,
                title TEXT NOT NULL,
                totalnum INTEGER NOT NULL,
                prodnum TEXT NOT NULL,
                notified DATE,
                PRIMARY KEY (show_id, season, num),
                FOREIGN KEY (show_id) REFERENCES shows_new (show_id) ON DELETE CASCADE ON UPDATE NO ACTION
            )
        "
        }
    }
}
