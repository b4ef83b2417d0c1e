//! Scraper for epguides.com episode listings.
//!
//! Pages are treated as plain text: the show title comes from `<title>`, the status from
//! a status marker, and every line matching the episode row pattern yields one episode.

use super::{Source, SourceError};
use crate::config::Config;
use crate::db::Store;
use crate::models::{Episode, Show, ShowStatus, UNKNOWN_PRODNUM};
use chrono::{Local, NaiveDate};
use regex::{Captures, Regex};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::sync::OnceLock;
use tracing::{debug, info, trace};

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^https?://(www\.)?epguides\.com/")
}

fn latin1_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(
        &RE,
        r#"(?i)charset\s*=\s*["']?\s*(iso-8859-1|iso8859-1|latin-?1)\b"#,
    )
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"(?is)<title>\s*(.*?)\s*</title>")
}

fn status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r#"(?is)<span\s+class\s*=\s*["']?Status["']?\s*>(.*?)</span>"#)
}

fn aired_range_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"(?i)aired.*to.*\d")
}

fn episode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(
        &RE,
        r"^\s*(?:<[^>]*>\s*)*(?:&bull;|•)?\s*(?P<total>\d+)?\.?\s+(?P<season>\d*)-\s*(?P<episode>\d*)\s+(?:(?P<prodnum>[A-Za-z0-9-]+)\s+)?(?P<day>\d{1,2})[ /](?P<month>[A-Za-z]{3})[ /](?P<year>\d{2})\s+<a[^>]*>(?P<title>[^<]+)</a>",
    )
}

#[derive(Debug, Clone, Default)]
pub struct Epguides {
    client: Client,
}

impl Epguides {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn fetch(&self, url: &str, config: &Config) -> Result<String, SourceError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &config.general.agent)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(decode_page(&body, content_type.as_deref()))
    }
}

/// Decodes a page, honouring a declared ISO-8859-1 charset and defaulting to UTF-8.
fn decode_page(body: &[u8], content_type: Option<&str>) -> String {
    let declared_in_header = content_type.is_some_and(|ct| latin1_regex().is_match(ct));
    let head = String::from_utf8_lossy(&body[..body.len().min(4096)]);

    if declared_in_header || latin1_regex().is_match(&head) {
        body.iter().copied().map(char::from).collect()
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

fn decode_text(text: &str) -> String {
    html_escape::decode_html_entities(text).trim().to_string()
}

/// Show name from `<title>`, without the "(a Titles & Air Dates Guide)" suffix.
fn extract_title(page: &str) -> Option<String> {
    let raw = title_regex().captures(page)?.get(1)?.as_str();
    let name = raw.split(" (a ").next().unwrap_or(raw);
    let name = decode_text(name);
    (!name.is_empty()).then_some(name)
}

fn extract_status(page: &str) -> ShowStatus {
    if let Some(caps) = status_regex().captures(page) {
        let marker = caps.get(1).map_or("", |m| m.as_str());
        return if marker.to_lowercase().contains("current") {
            ShowStatus::Running
        } else {
            ShowStatus::Ended
        };
    }

    if aired_range_regex().is_match(page) {
        ShowStatus::Ended
    } else {
        ShowStatus::Running
    }
}

fn number(caps: &Captures<'_>, name: &str) -> i32 {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Two-digit years: 00-68 are 2000s, 69-99 are 1900s.
fn parse_airdate(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    let year = if year < 69 { 2000 + year } else { 1900 + year };
    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %b %Y").ok()
}

fn parse_episode_line(line: &str) -> Option<Episode> {
    let caps = episode_regex().captures(line)?;

    let airdate = parse_airdate(
        caps.name("day")?.as_str(),
        caps.name("month")?.as_str(),
        caps.name("year")?.as_str(),
    )?;

    let prodnum = caps
        .name("prodnum")
        .map_or(UNKNOWN_PRODNUM, |m| m.as_str());

    Some(Episode::new(
        decode_text(caps.name("title")?.as_str()),
        number(&caps, "season"),
        number(&caps, "episode"),
        airdate,
        prodnum,
        number(&caps, "total"),
    ))
}

#[async_trait::async_trait]
impl Source for Epguides {
    fn name(&self) -> &'static str {
        "epguides.com parser"
    }

    fn accept(&self, url: &str) -> bool {
        url_regex().is_match(url)
    }

    async fn parse(
        &mut self,
        show: &mut Show,
        store: &mut Store,
        config: &Config,
    ) -> Result<(), SourceError> {
        let page = self.fetch(&show.url, config).await?;

        if let Some(name) = extract_title(&page) {
            show.name = name;
        }
        show.status = extract_status(&page);
        show.updated = Local::now().naive_local();
        *show = store.add_show(show).await?;

        let mut count = 0usize;
        for line in page.lines() {
            let Some(episode) = parse_episode_line(line) else {
                trace!(line, "Skipping line");
                continue;
            };

            debug!(episode = %episode.title, season = episode.season, number = episode.episode, "Found episode");
            store.add_episode(&episode, show).await?;
            count += 1;
        }

        store.commit().await?;
        info!(show = %show.name, episodes = count, status = %show.status, "Parsed epguides page");
        Ok(())
    }
}
