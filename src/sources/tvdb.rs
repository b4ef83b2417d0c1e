use super::{Source, SourceError};
use crate::config::Config;
use crate::db::Store;
use crate::models::{Episode, Show, ShowStatus, UNKNOWN_PRODNUM};
use chrono::{Local, NaiveDate};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.thetvdb.com";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Series {
    series_name: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    id: i64,
    series_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EpisodePage {
    #[serde(default)]
    data: Vec<EpisodeRow>,
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeRow {
    aired_episode_number: Option<i32>,
    aired_season: Option<i32>,
    first_aired: Option<String>,
    episode_name: Option<String>,
}

impl EpisodeRow {
    /// Rows without a usable air date are unscheduled and yield nothing.
    fn into_episode(self) -> Option<Episode> {
        let aired = self.first_aired.filter(|s| !s.trim().is_empty())?;
        let airdate = NaiveDate::parse_from_str(aired.trim(), "%Y-%m-%d").ok()?;
        let title = self
            .episode_name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unnamed episode".to_string());

        Some(Episode::new(
            title,
            self.aired_season.unwrap_or(0),
            self.aired_episode_number.unwrap_or(0),
            airdate,
            UNKNOWN_PRODNUM,
            0,
        ))
    }
}

/// Session state. Only an online client can look up or fetch shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TvdbState {
    Offline,
    Online { token: String },
}

/// Client for the thetvdb.com REST API.
#[derive(Debug, Clone)]
pub struct Tvdb {
    client: Client,
    state: TvdbState,
}

impl Default for Tvdb {
    fn default() -> Self {
        Self::new()
    }
}

impl Tvdb {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            state: TvdbState::Offline,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &TvdbState {
        &self.state
    }

    fn token(&self) -> Result<&str, SourceError> {
        match &self.state {
            TvdbState::Online { token } => Ok(token),
            TvdbState::Offline => Err(SourceError::NotLoggedIn),
        }
    }

    fn endpoint(
        config: &Config,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Url, SourceError> {
        let base = config.tvdb.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/{path}"))
            .map_err(|e| SourceError::InvalidData(format!("invalid API url: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn with_headers(builder: RequestBuilder, config: &Config) -> RequestBuilder {
        builder
            .header(USER_AGENT, &config.general.agent)
            .header(CONTENT_TYPE, "application/json")
    }

    async fn get<T: DeserializeOwned>(
        &self,
        config: &Config,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let token = self.token()?;
        let url = Self::endpoint(config, path, query)?;

        let response = Self::with_headers(self.client.get(url), config)
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            let error: ApiError = response.json().await.unwrap_or_default();
            return Err(SourceError::ShowNotFound(
                error.error.unwrap_or_else(|| path.to_string()),
            ));
        }

        Ok(response.error_for_status()?.json().await?)
    }

    async fn post_login(&self, config: &Config) -> Result<String, SourceError> {
        let api_key = config
            .tvdb
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| SourceError::InvalidLogin("no TVDB API key configured".to_string()))?;

        let url = Self::endpoint(config, "login", &[])?;
        let response = Self::with_headers(self.client.post(url), config)
            .json(&serde_json::json!({ "apikey": api_key }))
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let error: ApiError = response.json().await.unwrap_or_default();
            return Err(SourceError::InvalidLogin(
                error.error.unwrap_or_else(|| "unauthorized".to_string()),
            ));
        }

        let body: LoginResponse = response.error_for_status()?.json().await?;
        body.token
            .ok_or_else(|| SourceError::InvalidData("login response carries no token".to_string()))
    }

    /// Searches for shows by name. The candidates are not persisted.
    pub async fn lookup(&self, term: &str, config: &Config) -> Result<Vec<Show>, SourceError> {
        let result: Envelope<Vec<SearchResult>> = self
            .get(config, "search/series", &[("name", term.to_string())])
            .await?;

        Ok(result
            .data
            .into_iter()
            .map(|entry| {
                let id = entry.id.to_string();
                Show::new(entry.series_name.unwrap_or_else(|| id.clone()), id)
            })
            .collect())
    }

    async fn fetch_episodes(&self, id: u64, config: &Config) -> Result<Vec<Episode>, SourceError> {
        let path = format!("series/{id}/episodes");
        let mut episodes = Vec::new();
        let mut page = 1u32;

        loop {
            let result: EpisodePage = self
                .get(config, &path, &[("page", page.to_string())])
                .await?;
            debug!(series = id, page, rows = result.data.len(), "Fetched episode page");
            episodes.extend(result.data.into_iter().filter_map(EpisodeRow::into_episode));

            match result.links.and_then(|links| links.next) {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(episodes)
    }
}

#[async_trait::async_trait]
impl Source for Tvdb {
    fn name(&self) -> &'static str {
        "thetvdb.com parser"
    }

    fn accept(&self, url: &str) -> bool {
        !url.is_empty() && url.bytes().all(|b| b.is_ascii_digit())
    }

    async fn login(&mut self, config: &Config) -> Result<(), SourceError> {
        if matches!(self.state, TvdbState::Offline) {
            let token = self.post_login(config).await?;
            info!("Logged in to thetvdb.com");
            self.state = TvdbState::Online { token };
        }
        Ok(())
    }

    async fn parse(
        &mut self,
        show: &mut Show,
        store: &mut Store,
        config: &Config,
    ) -> Result<(), SourceError> {
        self.token()?;
        let id: u64 = show
            .url
            .trim()
            .parse()
            .map_err(|_| SourceError::InvalidShowId(show.url.clone()))?;

        let series: Envelope<Series> = self.get(config, &format!("series/{id}"), &[]).await?;
        let mut episodes = self.fetch_episodes(id, config).await?;

        if let Some(name) = series.data.series_name.filter(|n| !n.is_empty()) {
            show.name = name;
        }
        show.status = match series.data.status.as_deref() {
            Some("Continuing") => ShowStatus::Running,
            _ => ShowStatus::Ended,
        };
        show.updated = Local::now().naive_local();
        *show = store.add_show(show).await?;

        number_densely(&mut episodes);
        for episode in &episodes {
            store.add_episode(episode, show).await?;
        }

        store.commit().await?;
        info!(show = %show.name, episodes = episodes.len(), status = %show.status, "Parsed thetvdb.com series");
        Ok(())
    }
}

/// Sorts by (season, episode), drops repeated slots and reassigns absolute numbers 1..n.
fn number_densely(episodes: &mut Vec<Episode>) {
    episodes.sort();
    episodes.dedup();
    for (idx, episode) in episodes.iter_mut().enumerate() {
        episode.total = i32::try_from(idx + 1).unwrap_or(i32::MAX);
    }
}
