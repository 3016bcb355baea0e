use anyhow::Result;
use clap::{Parser, Subcommand};
use daemon_launcher::commands;
use daemon_launcher::services::SettingsStore;
use daemon_launcher::state::AppState;
use daemon_launcher::ScriptCheck;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "daemon-launcher")]
#[command(about = "Validate and launch daemon process configurations", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Launcher data directory (settings.json, default logs)
    #[arg(long, global = true, env = "DAEMON_LAUNCHER_HOME")]
    home: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print the resulting descriptors
    Check {
        /// Configuration file (.json or ecosystem-style .js)
        file: PathBuf,

        /// Merge the env_<PROFILE> block over env
        #[arg(long = "env")]
        env_profile: Option<String>,

        /// Fail when a script does not exist
        #[arg(long)]
        require_script: bool,

        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Launch every configured process and stop them on Ctrl-C
    Start {
        /// Configuration file (.json or ecosystem-style .js)
        file: PathBuf,

        /// Merge the env_<PROFILE> block over env
        #[arg(long = "env")]
        env_profile: Option<String>,

        /// Only start the named processes
        #[arg(long)]
        only: Vec<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = match cli.home {
        Some(home) => SettingsStore::new(home),
        None => SettingsStore::from_user_home()?,
    };
    let settings = store.load()?;
    tracing::debug!(home = %store.home().display(), ?settings, "launcher settings loaded");

    let state = AppState::new(store, settings);
    let mut options = state.load_options();

    match cli.command {
        Commands::Check {
            file,
            env_profile,
            require_script,
            json,
        } => {
            if env_profile.is_some() {
                options.env_profile = env_profile;
            }
            if require_script {
                options.script_check = ScriptCheck::Required;
            }
            let report = commands::check_config(&file, &options, json)?;
            println!("{}", report);
        }
        Commands::Start {
            file,
            env_profile,
            only,
        } => {
            if env_profile.is_some() {
                options.env_profile = env_profile;
            }
            commands::start::run(&state, &file, &options, &only).await?;
        }
    }

    Ok(())
}
