pub mod episode;
pub mod meta;
pub mod show;
