use anyhow::Result;
use clap::{Parser, Subcommand};
use ghconnect::commands::validators;
use ghconnect::{commands::*, config::ConnectorConfig, constants};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ghconnect")]
#[command(about = "Issue GitHub API requests through a revalidating response cache")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send GET requests for an API path or URL
    Get {
        /// API path (e.g. /repos/owner/name) or absolute URL
        target: String,

        /// Configuration file path
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        config: String,

        /// GitHub token (defaults to GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Forced Cache-Control max-age in seconds; negative disables it
        #[arg(long, allow_negative_numbers = true)]
        max_age: Option<i32>,

        /// Run without a response cache
        #[arg(long)]
        no_cache: bool,

        /// Number of times to send the request
        #[arg(short, long, default_value_t = 1)]
        repeat: u32,

        /// Print the body of the last response
        #[arg(long)]
        body: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output file name
        #[arg(short, long, default_value_t = constants::config::DEFAULT_CONFIG_FILE.to_string())]
        output: String,

        /// Overwrite existing file if it exists
        #[arg(long)]
        overwrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            target,
            config,
            token,
            max_age,
            no_cache,
            repeat,
            body,
        } => {
            validators::validate_get_args(&target, repeat)?;
            validators::validate_token(&token)?;

            let context = CommandContext {
                config: ConnectorConfig::load_or_default(&config)?,
            };
            GetCommand {
                target,
                token,
                max_age,
                no_cache,
                repeat,
                body,
            }
            .execute(&context)
            .await?;
        }
        Commands::Init { output, overwrite } => {
            // Init doesn't read a config since it creates one
            let context = CommandContext {
                config: ConnectorConfig::default(),
            };
            InitCommand { output, overwrite }.execute(&context).await?;
        }
    }

    Ok(())
}
