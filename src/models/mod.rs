pub mod episode;
pub mod show;

pub use episode::{Episode, UNKNOWN_PRODNUM};
pub use show::{Show, ShowStatus};
