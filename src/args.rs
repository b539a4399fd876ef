//! These structs provide the CLI interface for the rollup CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// rollup: A command-line tool for rolling up monthly item quantities.
///
/// The program reads a data table of (month, category, item, quantity) rows from a workbook,
/// totals the quantities of each item and category by month, and writes a running total per
/// month to an output table that a chart can consume.
///
/// The workbook is a directory of CSV files. Run `rollup init` to create one.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, its configuration file and a workbook.
    ///
    /// The workbook gets four tables: `data` (month, category, item, quantity), `operation`
    /// (where the rollup is written), `categories` (category, color) and `config` (key, value
    /// rows read by the chart).
    Init(InitArgs),
    /// Roll up the data table and replace the contents of the operation table with the result.
    Transform,
    /// Roll up the data table and print the result as CSV without writing anything.
    Preview,
    /// Print the display color of each category as JSON.
    Colors,
    /// Print the chart payload (operation table, settings and colors) as JSON.
    Chart,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the rollup configuration is held. Defaults to ~/rollup
    #[arg(long, env = "ROLLUP_HOME", default_value_t = default_rollup_home())]
    rollup_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, rollup_home: PathBuf) -> Self {
        Self {
            log_level,
            rollup_home: rollup_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn rollup_home(&self) -> &DisplayPath {
        &self.rollup_home
    }
}

/// Args for the `rollup init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where to create the workbook directory. A relative path is taken relative to the rollup
    /// home. Defaults to $ROLLUP_HOME/workbook.
    #[arg(long)]
    workbook: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(workbook: Option<PathBuf>) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> Option<&Path> {
        self.workbook.as_deref()
    }
}

fn default_rollup_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("rollup"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --rollup-home or ROLLUP_HOME instead of relying on the default \
                rollup home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("rollup")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
