//! When a show is due for a refresh.

use crate::models::{Show, ShowStatus};
use chrono::{Days, NaiveDate};

/// How long a show may go without a refresh before it is considered stale.
#[must_use]
pub const fn threshold_days(status: ShowStatus) -> u64 {
    match status {
        ShowStatus::Running => 2,
        ShowStatus::Suspended => 7,
        ShowStatus::Ended => 14,
    }
}

/// A show expires once its last update lies strictly before `today - threshold`.
/// Disabled shows never expire.
#[must_use]
pub fn is_expired(show: &Show, today: NaiveDate) -> bool {
    if !show.enabled {
        return false;
    }

    match today.checked_sub_days(Days::new(threshold_days(show.status))) {
        Some(limit) => show.updated.date() < limit,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(status: ShowStatus, updated: NaiveDate) -> Show {
        let mut show = Show::new("A", "a");
        show.status = status;
        show.updated = updated.and_hms_opt(12, 0, 0).unwrap();
        show
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn running_shows_expire_after_two_days() {
        let today = date(2017, 1, 10);
        assert!(!is_expired(&show(ShowStatus::Running, date(2017, 1, 8)), today));
        assert!(is_expired(&show(ShowStatus::Running, date(2017, 1, 7)), today));
    }

    #[test]
    fn suspended_shows_expire_after_a_week() {
        let today = date(2017, 1, 10);
        assert!(!is_expired(&show(ShowStatus::Suspended, date(2017, 1, 3)), today));
        assert!(is_expired(&show(ShowStatus::Suspended, date(2017, 1, 2)), today));
    }

    #[test]
    fn ended_shows_expire_after_two_weeks() {
        let today = date(2017, 1, 20);
        assert!(!is_expired(&show(ShowStatus::Ended, date(2017, 1, 6)), today));
        assert!(is_expired(&show(ShowStatus::Ended, date(2017, 1, 5)), today));
    }

    #[test]
    fn disabled_shows_never_expire() {
        let mut stale = show(ShowStatus::Running, date(2000, 1, 1));
        stale.enabled = false;
        assert!(!is_expired(&stale, date(2017, 1, 1)));
    }

    #[test]
    fn never_updated_show_is_expired() {
        assert!(is_expired(&Show::new("A", "a"), date(2017, 1, 1)));
    }
}
