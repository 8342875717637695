mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use sprout_sdk::PromptPurpose;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprout",
    about = "Developer workflow CLI driven by a compiled sprout.config.rs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from sprout.config.rs, .sprout/ or .git/)
    #[arg(long, global = true, env = "SPROUT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Default log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold sprout.config.rs and .sprout/config.yaml in the current project
    Init,

    /// Build, inspect and reset the compiled configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Fetch tasks from the configured ticket source
    Tasks {
        /// Free-form query passed to the ticket source
        #[arg(default_value = "")]
        query: String,
    },

    /// Show the current branch and the issue it refers to
    Branch,

    /// Send a prompt to the language model configured for its purpose
    Prompt {
        #[arg(long, default_value = "text")]
        purpose: PromptPurpose,
        text: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Tasks { query } => cmd::tasks::run(&root, &query, cli.json),
        Commands::Branch => cmd::branch::run(&root, cli.json),
        Commands::Prompt { purpose, text } => cmd::prompt::run(&root, purpose, &text, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
