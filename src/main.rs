use clap::{Parser, Subcommand};
use review_wait::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(about = "fetches the chat channel history into the snapshot file")]
    Snapshot,
    #[clap(about = "prints review wait times for the configured repositories")]
    Report {
        #[arg(long, help = "print the reports as JSON instead of text")]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    // Initialize tracing (logging); the report itself goes to stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_wait=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}. Exiting.", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Snapshot => review_wait::run_snapshot(&config).await,
        Command::Report { json } => review_wait::run_report(&config, json).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
