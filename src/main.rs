#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use sessionfile::config::Config;
use sessionfile::sessions;
use sessionfile::SessionCommands;
use std::io::Write;
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

/// `sessionfile` - conversation transcripts as newline-delimited JSON.
#[derive(Parser, Debug)]
#[command(name = "sessionfile")]
#[command(version)]
#[command(about = "Store and inspect conversation session transcripts.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage session transcripts (list, show, path, latest, append)
    #[command(long_about = "\
Manage session transcripts.

Sessions are stored one file per session in the configured sessions \
directory, one JSON message per line.

Examples:
  sessionfile session list
  sessionfile session show project-x --limit 10
  sessionfile session path project-x
  sessionfile session latest
  sessionfile session append --resume \"Where were we?\"")]
    Session {
        #[command(subcommand)]
        session_command: SessionCommands,
    },

    /// Show configuration and storage status
    Status,

    /// Generate shell completion script to stdout
    #[command(long_about = "\
Generate shell completion scripts for `sessionfile`.

The script is printed to stdout so it can be sourced directly:

Examples:
  source <(sessionfile completions bash)
  sessionfile completions zsh > ~/.zfunc/_sessionfile")]
    Completions {
        /// Target shell (bash, elvish, fish, powershell, zsh)
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Completions must remain stdout-only and should not load config or initialize logging.
    if let Commands::Completions { shell } = cli.command {
        return print_completions(shell, &mut std::io::stdout().lock());
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO.
    // Logs go to stderr so command output stays pipeable.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match &cli.config_dir {
        Some(dir) if dir.trim().is_empty() => bail!("--config-dir cannot be empty"),
        Some(dir) => Config::load_or_init_in(Path::new(dir)).await?,
        None => Config::load_or_init().await?,
    };

    match cli.command {
        Commands::Completions { .. } => unreachable!(),

        Commands::Session { session_command } => {
            sessions::handle_session_command(session_command, &config)
        }

        Commands::Status => {
            let store = sessions::create_session_store(&config.sessions)?;
            println!("sessionfile Status");
            println!();
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Config:      {}", config.config_path.display());
            println!();
            println!("Sessions:");
            println!("  Directory:  {}", config.sessions.dir.display());
            println!("  Suffix:     {}", config.sessions.suffix);
            println!("  Backend:    {}", store.name());
            if store.has_sessions() {
                let sessions = store.list()?;
                println!("  Count:      {}", sessions.len());
                if let Some(latest) = sessions.first() {
                    println!(
                        "  Latest:     {} ({})",
                        latest.name,
                        latest.modified.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
            } else {
                println!("  Count:      0");
            }
            Ok(())
        }
    }
}

/// Render the completion script for `shell` into `out`.
fn print_completions(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, out);
    out.flush()?;
    Ok(())
}
