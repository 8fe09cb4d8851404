//! [`Args`] definitions.

use std::time::Duration;

use clap::{Parser, Subcommand};
use humantime_serde::re::humantime;
use uuid::Uuid;

/// Server of the room booking system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    /// [`Command`] to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Command to run.
#[derive(Clone, Copy, Debug, Default, Subcommand)]
pub enum Command {
    /// Runs the GraphQL server (default).
    #[default]
    Serve,

    /// Prints a bearer token authenticating the provided user.
    IssueToken {
        /// ID of the user to issue the token for.
        #[arg(long)]
        user: Uuid,

        /// Grants the user the admin role.
        #[arg(long)]
        admin: bool,

        /// Duration the token stays valid for.
        #[arg(
            long,
            default_value = "30m",
            value_parser = humantime::parse_duration,
        )]
        ttl: Duration,
    },
}
