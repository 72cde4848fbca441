mod colors;
mod commands;
mod progress;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::path::PathBuf;
use steamsweep::SteamConfig;
use steamsweep::library::STEAM_ROOT_ENV;

#[derive(Parser)]
#[command(name = "steamsweep")]
#[command(author, version, about = "Cleanly uninstall Steam games on Linux", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Steam installation to use instead of the default locations
    #[arg(long, global = true, env = STEAM_ROOT_ENV, value_name = "DIR")]
    steam_root: Option<PathBuf>,

    /// Include Proton and Steam runtime entries
    #[arg(long, global = true)]
    include_tools: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List installed games
    List {
        /// Only show games whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show Steam roots and library folders
    Libraries {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Uninstall games by appid or exact name
    Uninstall {
        /// Appids or game names
        #[arg(required = true)]
        games: Vec<String>,

        /// Show what would be removed without removing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Proceed even if Steam is running
        #[arg(long)]
        force: bool,

        /// Games removed in parallel
        #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..=16))]
        jobs: u16,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let json = matches!(
        cli.command,
        Some(Commands::List { json: true, .. }) | Some(Commands::Libraries { json: true })
    );
    colors::init_colors(json);

    let config = SteamConfig::detect()
        .with_override(cli.steam_root)
        .with_tools(cli.include_tools);

    match cli.command {
        Some(Commands::List { filter, json }) => {
            commands::list(&config, filter.as_deref(), json)?;
        }
        Some(Commands::Libraries { json }) => {
            commands::libraries(&config, json)?;
        }
        Some(Commands::Uninstall {
            games,
            dry_run,
            yes,
            force,
            jobs,
        }) => {
            let args = commands::UninstallArgs {
                dry_run,
                yes,
                force,
                jobs: usize::from(jobs),
            };
            commands::uninstall(&config, &games, args)?;
        }
        Some(Commands::Completions { shell }) => {
            commands::completions(shell, &mut Cli::command());
        }
        None => {
            println!(
                "{} - remove Steam games so the client sees them as not installed",
                "steamsweep".bold()
            );
            println!("\nRun {} to see installed games.", "steamsweep list".cyan());
            println!("Run {} for all commands.", "steamsweep --help".cyan());
        }
    }

    Ok(())
}
