//! Sequential refresh of tracked shows.
//!
//! Shows are processed one at a time. A failure while fetching one show is logged, its
//! uncommitted work rolled back, and the run moves on to the next show.

use crate::config::Config;
use crate::db::{Store, StoreError};
use crate::models::Show;
use crate::sources::{Source, SourceError, SourceSelector};
use chrono::NaiveDate;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Drop each updated show's episodes that aired before this date.
    pub remove_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: usize,
    pub failed: usize,
    /// Shows no source would accept.
    pub skipped: usize,
}

/// Every enabled show when `force` is set, otherwise only the expired ones.
pub async fn shows_to_update(
    store: &Store,
    today: NaiveDate,
    force: bool,
) -> Result<Vec<Show>, StoreError> {
    if force {
        store.get_enabled_shows().await
    } else {
        store.get_expired_shows(today).await
    }
}

/// Refreshes `shows` through the matching sources.
///
/// # Errors
///
/// Rejected credentials abort the run with [`SourceError::InvalidLogin`]. Storage
/// failures other than a duplicate url are fatal as well. Anything else only marks the
/// show as failed.
pub async fn update_shows(
    store: &mut Store,
    selector: &mut SourceSelector,
    config: &Config,
    shows: Vec<Show>,
    options: &UpdateOptions,
) -> Result<UpdateSummary, SourceError> {
    let mut summary = UpdateSummary::default();

    for mut show in shows {
        let Some(source) = selector.select(&show.url) else {
            warn!(show_id = ?show.id, url = %show.url, "No parser found for show");
            summary.skipped += 1;
            continue;
        };

        info!(show = %show.name, source = source.name(), "Updating show");
        match update_one(source, &mut show, store, config, options).await {
            Ok(()) => summary.updated += 1,
            Err(e) if is_fatal(&e) => {
                error!(show = %show.name, error = %e, "Aborting update");
                store.rollback().await?;
                return Err(e);
            }
            Err(e) => {
                error!(show = %show.name, url = %show.url, error = %e, "Failed to update show");
                store.rollback().await?;
                summary.failed += 1;
            }
        }
    }

    info!(
        updated = summary.updated,
        failed = summary.failed,
        skipped = summary.skipped,
        "Update finished"
    );
    Ok(summary)
}

fn is_fatal(err: &SourceError) -> bool {
    match err {
        SourceError::InvalidLogin(_) => true,
        SourceError::Store(e) => !e.is_duplicate_url(),
        _ => false,
    }
}

async fn update_one(
    source: &mut dyn Source,
    show: &mut Show,
    store: &mut Store,
    config: &Config,
    options: &UpdateOptions,
) -> Result<(), SourceError> {
    source.login(config).await?;
    source.parse(show, store, config).await?;

    if let Some(date) = options.remove_before {
        store.remove_before(date, Some(show)).await?;
        store.commit().await?;
    }

    Ok(())
}
