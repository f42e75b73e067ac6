use clap::Parser;
use pnl_rollup::args::{Args, Command};
use pnl_rollup::{commands, Config, Result};
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
    let home = args.common().pnl_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.ledger()).await?.print(),

        Command::Report => commands::report(Config::load(home).await?).await?.print(),

        Command::Summary => commands::summary(Config::load(home).await?).await?.print(),

        Command::Simplified => commands::simplified(Config::load(home).await?)
            .await?
            .print(),

        Command::Drill(drill_args) => {
            commands::drill(Config::load(home).await?, drill_args.code())
                .await?
                .print()
        }

        Command::Tag(tag_args) => {
            let config = Config::load(home).await?;
            commands::tag(
                config,
                tag_args.id(),
                tag_args.category(),
                tag_args.sub_account(),
            )
            .await?
            .print()
        }

        Command::Untag(untag_args) => commands::untag(Config::load(home).await?, untag_args.id())
            .await?
            .print(),

        Command::SubAccount(sub_args) => {
            let config = Config::load(home).await?;
            commands::sub_account(config, sub_args.category(), sub_args.label())
                .await?
                .print()
        }

        Command::Excluded => commands::excluded(Config::load(home).await?).await?.print(),

        Command::Validate => commands::validate(Config::load(home).await?).await?.print(),
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
            // RUST_LOG does not exist; use default log level for the library and binary only.
            EnvFilter::new(format!(
                "pnl_rollup={level},{}={level}",
                env!("CARGO_BIN_NAME")
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
