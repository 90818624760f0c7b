use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use daydeck_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "daydeck", version, about = "Daydeck CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Countdown timers
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Notes
    Note {
        #[command(subcommand)]
        action: commands::note::NoteAction,
    },
    /// Calendar events
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// World clocks
    Clock {
        #[command(subcommand)]
        action: commands::clock::ClockAction,
    },
    /// User settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Ask the assistant for a meeting slot
    Suggest(commands::suggest::SuggestArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Today at a glance
    Dashboard,
    /// Print shell completions
    Completions { shell: Shell },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("DAYDECK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action, &config),
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Note { action } => commands::note::run(action, &config),
        Commands::Event { action } => commands::event::run(action, &config),
        Commands::Clock { action } => commands::clock::run(action, &config).await,
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Suggest(args) => commands::suggest::run(args, &config).await,
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Dashboard => commands::dashboard::run(&config),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "daydeck", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
