//! Command-line interface for episoder.

mod commands;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// episoder - track upcoming TV episodes
#[derive(Debug, Parser)]
#[command(name = "episoder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path or URL, overriding the config file
    #[arg(short = 'D', long, global = true)]
    pub database: Option<String>,

    /// More output (repeat for even more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Refresh expired shows (or all shows with --force)
    #[command(alias = "u")]
    Update {
        /// Refresh every enabled show regardless of age
        #[arg(short, long)]
        force: bool,

        /// Only refresh the show with this id
        #[arg(short, long)]
        show: Option<i32>,

        /// Drop episodes that aired before this date (YYYY-MM-DD)
        #[arg(long)]
        remove_before: Option<NaiveDate>,
    },

    /// List upcoming episodes
    #[command(alias = "ls", alias = "l")]
    List {
        /// First day to show (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of days to show after the first day
        #[arg(short = 'n', long)]
        days: Option<u64>,

        /// Search episode titles and show names instead
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List tracked shows
    Shows,

    /// Track a new show by url or TVDB id
    #[command(alias = "a")]
    Add {
        /// epguides.com url or numeric thetvdb.com id
        url: String,
    },

    /// Stop tracking a show and drop its episodes
    #[command(alias = "rm")]
    Remove {
        /// Show id
        id: i32,
    },

    /// Resume updates for a show
    Enable {
        /// Show id
        id: i32,
    },

    /// Pause updates for a show without removing it
    Disable {
        /// Show id
        id: i32,
    },

    /// Search thetvdb.com for shows
    Lookup {
        /// Search terms
        #[arg(required = true)]
        term: Vec<String>,
    },

    /// Upgrade the database schema
    Migrate,

    /// Create default config file
    Init,
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_update_flags() {
        let cli = Cli::parse_from([
            "episoder",
            "-vv",
            "update",
            "--force",
            "--remove-before",
            "2017-01-01",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Update {
                force,
                show,
                remove_before,
            } => {
                assert!(force);
                assert_eq!(show, None);
                assert_eq!(remove_before, NaiveDate::from_ymd_opt(2017, 1, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_list_options() {
        let cli = Cli::parse_from(["episoder", "list", "-d", "2017-05-01", "-n", "7"]);
        match cli.command {
            Commands::List { date, days, search } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2017, 5, 1));
                assert_eq!(days, Some(7));
                assert_eq!(search, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(Cli::try_parse_from(["episoder", "list", "--date", "yesterday"]).is_err());
    }
}
