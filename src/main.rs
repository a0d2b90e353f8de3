use anyhow::Context;
use clap::Parser;
use imageset::{
    catalog::ProcessRunner,
    cli::commands::{
        CatalogsCommand, CommandContext, CommandHandler, GenerateCommand, MappingsCommand,
        OperatorsCommand, ReleasesCommand, ValidateCommand,
    },
    cli::{Cli, Commands, LogLevel},
    config::SettingsLoader,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout carries only command output
fn initialize_tracing(log_level: &LogLevel, json: bool) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn handler(command: Commands) -> Box<dyn CommandHandler> {
    match command {
        Commands::Generate(args) => Box::new(GenerateCommand::new(args)),
        Commands::Validate { request } => Box::new(ValidateCommand::new(request)),
        Commands::Releases {
            channels,
            channel,
            refresh,
        } => Box::new(ReleasesCommand::new(channels, channel, refresh)),
        Commands::Catalogs { version, probe } => Box::new(CatalogsCommand::new(version, probe)),
        Commands::Operators {
            catalog,
            version,
            refresh,
            package,
            dump_tables,
        } => Box::new(OperatorsCommand::new(
            catalog,
            version,
            refresh,
            package,
            dump_tables,
        )),
        Commands::Mappings => Box::new(MappingsCommand),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level, cli.log_json);

    let mut loader = SettingsLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut settings = loader.load().context("Failed to load settings")?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    debug!("Cache directory: {}", settings.data_dir.display());

    let context = CommandContext::new(settings, Arc::new(ProcessRunner)).with_json(cli.json);
    let command = handler(cli.command);

    match command.execute(&context).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(command = command.name(), "{}", err);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&err.report())?);
                Ok(ExitCode::FAILURE)
            } else {
                Err(anyhow::Error::new(err).context(format!("imageset {} failed", command.name())))
            }
        }
    }
}
