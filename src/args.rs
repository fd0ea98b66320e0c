//! This module defines the command line arguments memberhub accepts.

use std::{io::IsTerminal, path::PathBuf};
use termcolor::ColorChoice;

use crate::{cmd, db::cmd::DbCommand};


#[derive(Debug, clap::Parser)]
#[command(about = "GraphQL API for users, profiles, posts and subscriptions.")]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) cmd: Command,

    /// Whether to use colors and other ANSI codes in output.
    #[arg(long, value_enum, default_value_t = ColorArg::Auto, global = true)]
    color: ColorArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Starts the HTTP server serving the GraphQL API.
    Serve {
        #[command(flatten)]
        shared: Shared,
    },

    /// Database operations.
    Db {
        #[command(subcommand)]
        cmd: DbCommand,

        #[command(flatten)]
        shared: Shared,
    },

    /// Checks the configuration and the DB connection.
    ///
    /// Exits with 0 if everything is Ok, and with 1 otherwise.
    Check {
        #[command(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions of all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },

    /// Exports the API as GraphQL schema.
    ExportApiSchema {
        #[command(flatten)]
        args: cmd::export_api_schema::Args,
    },
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, memberhub
    /// will check `MEMBERHUB_CONFIG_PATH`, then try opening `config.toml` and
    /// `/etc/memberhub/config.toml`.
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,
}

impl Args {
    pub(crate) fn color(&self) -> ColorChoice {
        match self.color {
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
            ColorArg::Auto => ColorChoice::Auto,
        }
    }

    pub(crate) fn stdout_color(&self) -> ColorChoice {
        self.resolved(std::io::stdout().is_terminal())
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        self.resolved(std::io::stderr().is_terminal())
    }

    fn resolved(&self, is_terminal: bool) -> ColorChoice {
        match self.color() {
            ColorChoice::Auto if !is_terminal => ColorChoice::Never,
            other => other,
        }
    }

    /// Short name of the subcommand, used for the log file name.
    pub(crate) fn cmd_name(&self) -> &'static str {
        match self.cmd {
            Command::Serve { .. } => "serve",
            Command::Db { .. } => "db",
            _ => "other",
        }
    }
}
