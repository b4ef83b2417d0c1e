pub mod updater;

pub use updater::{UpdateOptions, UpdateSummary, shows_to_update, update_shows};
