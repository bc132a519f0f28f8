use clap::Parser;
use flashgen::cli::handle_config_command;
use flashgen::cli::handle_generate;
use flashgen::cli::handle_key_command;
use flashgen::cli::handle_serve_api;
use flashgen::cli::Cli;
use flashgen::cli::Commands;
use flashgen::cli::GenerateArgs;
use flashgen::config::AppConfig;
use flashgen::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging with configuration
    flashgen::logging::init_logging_with_config(&config, cli.verbose)?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Generate {
            topic,
            count,
            grade,
            api_key,
            endpoint,
            download,
            copy,
        } => {
            let args = GenerateArgs {
                topic: topic.unwrap_or_default(),
                count,
                grade: grade.into(),
                api_key,
                endpoint,
                download,
                copy,
            };
            handle_generate(&config, args).await?;
        }
        Commands::Key(command) => {
            handle_key_command(&config, command)?;
        }
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
