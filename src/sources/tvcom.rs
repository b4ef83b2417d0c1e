use super::{Source, SourceError};
use crate::config::Config;
use crate::db::Store;
use crate::models::Show;
use regex::Regex;
use std::sync::OnceLock;
use tracing::error;

/// Recognizes urls from the retired tv.com guides so users learn to replace them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TvCom;

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://(www\.)?tv\.com/").expect("Invalid regex"))
}

#[async_trait::async_trait]
impl Source for TvCom {
    fn name(&self) -> &'static str {
        "dummy tv.com parser to detect old urls (DO NOT USE)"
    }

    fn accept(&self, url: &str) -> bool {
        url_regex().is_match(url)
    }

    async fn parse(
        &mut self,
        show: &mut Show,
        _store: &mut Store,
        _config: &Config,
    ) -> Result<(), SourceError> {
        error!(
            show = %show.name,
            url = %show.url,
            "tv.com is no longer supported, please change the url of this show"
        );
        Ok(())
    }
}
