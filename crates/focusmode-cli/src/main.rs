use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusmode", version, about = "Focus Mode Pomodoro timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session API server
    Serve(commands::serve::ServeArgs),
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Dashboard statistics from the API server
    Stats(commands::stats::StatsArgs),
    /// Download a session report
    Export(commands::export::ExportArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

const DEFAULT_LOG_FILTER: &str = "focusmode=info,focusmode_core=info,focusmode_server=info";

fn init_logging() {
    // RUST_LOG replaces the defaults entirely.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::Stats(args) => commands::stats::run(args).await,
        Commands::Export(args) => commands::export::run(args).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
