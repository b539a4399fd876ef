use clap::Parser;
use sheet_rollup::args::{Args, Command};
use sheet_rollup::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().rollup_home().path();

    // This allows for running the program against an in-memory sample workbook. When
    // ROLLUP_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Csv.
    let mode = Mode::from_env();

    match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.workbook()).await?.print(),

        Command::Transform => {
            let mut store = commands::store(&Config::load(home).await?, mode).await?;
            commands::transform(&mut store).await?.print()
        }

        Command::Preview => {
            let mut store = commands::store(&Config::load(home).await?, mode).await?;
            let out = commands::preview(&mut store).await?;
            out.print();
            if let Some(matrix) = out.structure() {
                print!("{}", matrix.to_csv_string()?);
            }
        }

        Command::Colors => {
            let mut store = commands::store(&Config::load(home).await?, mode).await?;
            commands::colors(&mut store).await?.print_json()?
        }

        Command::Chart => {
            let mut store = commands::store(&Config::load(home).await?, mode).await?;
            commands::chart_data(&mut store).await?.print_json()?
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                "sheet_rollup",
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
