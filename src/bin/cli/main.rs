mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flashdeck-cli", about = "Study a markdown flashcard deck", version)]
struct Cli {
    /// Configuration file (default: ~/.config/flashdeck/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the card store location
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build the card store from the corpus
    Build {
        /// Delete an existing store and build it again
        #[arg(long)]
        rebuild: bool,
    },

    /// Print the number of cards
    Count,

    /// Draw one random card
    Draw {
        /// Comma-separated ids to skip
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<i64>,
    },

    /// Draw one random card matching every keyword
    Search {
        /// Keywords (all must match)
        #[arg(required = true)]
        keywords: Vec<String>,
        /// Comma-separated ids to skip
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<i64>,
    },

    /// Interactive study session
    Practice {
        /// Start in search mode with these keywords
        #[arg(long, num_args = 1..)]
        search: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();

    let app = app::App::new(cli.config.as_deref(), cli.database)?;

    match cli.command {
        Command::Build { rebuild } => {
            commands::build::run(&app, rebuild, &cli.format)?;
        }
        Command::Count => {
            app.ensure_store()?;
            commands::count::run(&app, &cli.format)?;
        }
        Command::Draw { exclude } => {
            app.ensure_store()?;
            commands::draw::run(&app, &exclude, &cli.format, use_color)?;
        }
        Command::Search { keywords, exclude } => {
            app.ensure_store()?;
            commands::search::run(&app, &keywords, &exclude, &cli.format, use_color)?;
        }
        Command::Practice { search } => {
            app.ensure_store()?;
            commands::practice::run(&app, &search, use_color)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
