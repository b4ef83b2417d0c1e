use super::show::Show;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Production code used when a source does not provide one.
pub const UNKNOWN_PRODNUM: &str = "UNK";

/// One installment of a show.
///
/// Identity is the `(show_id, season, episode)` triple: two records describing the same
/// slot compare equal even when title or air date differ, so freshly parsed data can be
/// matched against what the store already holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub show_id: Option<i32>,
    pub title: String,
    pub season: i32,
    pub episode: i32,
    pub airdate: NaiveDate,
    pub prodnum: String,
    pub total: i32,
    pub notified: Option<NaiveDate>,
    /// Parent show, populated when the episode is read back from the store.
    #[serde(skip)]
    pub show: Option<Show>,
}

impl Episode {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        season: i32,
        episode: i32,
        airdate: NaiveDate,
        prodnum: impl Into<String>,
        total: i32,
    ) -> Self {
        Self {
            show_id: None,
            title: title.into(),
            season,
            episode,
            airdate,
            prodnum: prodnum.into(),
            total,
            notified: None,
            show: None,
        }
    }

    #[must_use]
    pub const fn key(&self) -> (Option<i32>, i32, i32) {
        (self.show_id, self.season, self.episode)
    }
}

impl PartialEq for Episode {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Episode {}

impl Hash for Episode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

// Season and episode first; the show id only breaks ties between shows so that the
// ordering stays consistent with equality.
impl Ord for Episode {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.season, self.episode, self.show_id).cmp(&(other.season, other.episode, other.show_id))
    }
}

impl PartialOrd for Episode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = self.show.as_ref().map_or("<unknown show>", |s| s.name.as_str());
        write!(
            f,
            "{} {}x{:02}: {}",
            show, self.season, self.episode, self.title
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(title: &str, season: i32, episode: i32) -> Episode {
        Episode::new(
            title,
            season,
            episode,
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
            "",
            1,
        )
    }

    #[test]
    fn construct() {
        let e = Episode::new(
            "First",
            3,
            8,
            NaiveDate::from_ymd_opt(2017, 1, 1).unwrap(),
            "0XOR",
            117,
        );
        assert_eq!(e.show_id, None);
        assert_eq!(e.season, 3);
        assert_eq!(e.episode, 8);
        assert_eq!(e.title, "First");
        assert_eq!(e.total, 117);
        assert_eq!(e.prodnum, "0XOR");
        assert_eq!(e.notified, None);
    }

    #[test]
    fn display_uses_show_name() {
        let mut e = ep("First", 1, 1);
        e.show = Some(Show::new("TvShow", ""));
        assert_eq!(e.to_string(), "TvShow 1x01: First");
    }

    #[test]
    fn equality_is_by_show_season_and_number() {
        let mut a = ep("First", 1, 1);
        a.show_id = Some(1);
        let mut b = ep("Second", 2, 2);
        b.show_id = Some(2);
        assert_ne!(a, b);

        a.show_id = Some(2);
        assert_ne!(a, b);
        a.season = 2;
        assert_ne!(a, b);
        a.episode = 2;
        assert_eq!(a, b);

        a.season = 1;
        assert_ne!(a, b);
        a.season = 2;
        a.show_id = Some(1);
        assert_ne!(a, b);
    }

    #[test]
    fn sorts_by_season_then_episode() {
        let e1 = ep("A", 1, 1);
        let e2 = ep("D", 2, 2);
        let e3 = ep("E", 3, 1);
        let e4 = ep("B", 1, 2);
        let e5 = ep("C", 2, 1);

        let mut episodes = vec![e1.clone(), e2.clone(), e3.clone(), e4.clone(), e5.clone()];
        episodes.sort();
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
    }
}
