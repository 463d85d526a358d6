use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zinefocus_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "zinefocus-cli", version, about = "Zinefocus focus timer CLI")]
struct Cli {
    /// Act on this user's workspace instead of the configured one
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Project selection and history
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let mut config = Config::load_or_default();
    init_tracing(&config);
    if let Some(user) = cli.user {
        config.user_id = user;
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Project { action } => commands::project::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
