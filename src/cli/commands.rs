use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::cli::duration::parse_duration;

#[derive(Parser)]
#[command(name = "gator")]
#[command(about = "RSS aggregator: follow feeds and browse their latest posts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a user and log in as them
    Register {
        /// Username to create
        name: String,
    },

    /// Log in as an existing user
    Login {
        /// Username to log in as
        name: String,
    },

    /// List all users
    Users,

    /// Delete all users and everything they own
    Reset,

    /// Add a feed and follow it
    Addfeed {
        /// Display name for the feed
        name: String,
        /// RSS feed URL
        url: String,
    },

    /// List all feeds
    Feeds,

    /// Follow an existing feed
    Follow {
        /// Feed URL to follow
        url: String,
    },

    /// List the feeds you follow
    Following,

    /// Stop following a feed
    Unfollow {
        /// Feed URL to unfollow
        url: String,
    },

    /// Fetch feeds forever, one feed per interval
    Agg {
        /// Time between fetches, e.g. 30s, 1m, 1h30m
        #[arg(value_parser = parse_duration)]
        interval: Duration,
    },

    /// Show the latest posts from followed feeds
    Browse {
        /// Number of posts to show
        limit: Option<usize>,
    },
}
