//! Adapters that fetch a show's episode list from an external site and store it.

use crate::config::Config;
use crate::db::{Store, StoreError};
use crate::models::Show;
use thiserror::Error;

pub mod epguides;
pub mod tvcom;
pub mod tvdb;

pub use epguides::Epguides;
pub use tvcom::TvCom;
pub use tvdb::Tvdb;

/// Errors raised while fetching or normalizing a show.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid login: {0}")]
    InvalidLogin(String),

    #[error("Show not found: {0}")]
    ShowNotFound(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid show id: {0}")]
    InvalidShowId(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One external source of episode data.
///
/// Implementations keep whatever session state they need (such as an API token) on
/// themselves, so a single instance is reused for every show in a run.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Human-readable parser name.
    fn name(&self) -> &'static str;

    /// Whether this source recognizes `url`. Pure; performs no I/O.
    fn accept(&self, url: &str) -> bool;

    /// Establishes a session. Sources that need none do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidLogin`] when the credentials are rejected.
    async fn login(&mut self, _config: &Config) -> Result<(), SourceError> {
        Ok(())
    }

    /// Fetches `show`, updates its name, status and timestamp, stores its episodes and
    /// commits.
    ///
    /// # Errors
    ///
    /// Nothing is committed when an error is returned; the caller decides whether to
    /// roll back.
    async fn parse(
        &mut self,
        show: &mut Show,
        store: &mut Store,
        config: &Config,
    ) -> Result<(), SourceError>;
}

/// Routes a show url to the first source that accepts it.
pub struct SourceSelector {
    sources: Vec<Box<dyn Source>>,
}

impl Default for SourceSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceSelector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_sources(vec![
            Box::new(Epguides::new()),
            Box::new(TvCom),
            Box::new(Tvdb::new()),
        ])
    }

    #[must_use]
    pub fn with_sources(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    pub fn select(&mut self, url: &str) -> Option<&mut (dyn Source + 'static)> {
        self.sources
            .iter_mut()
            .find(|source| source.accept(url))
            .map(|source| &mut **source)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.iter().map(|source| source.name())
    }
}
