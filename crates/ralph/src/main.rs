use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cancel;
mod init;
mod run;

#[derive(Parser)]
#[command(
    name = "ralph",
    about = "Ralph Wiggum iterative loop technique for Kiro CLI",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize Ralph Wiggum in the current project
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
    /// Start an iterative loop
    Loop {
        /// Task prompt for the loop
        prompt: String,
        #[command(flatten)]
        opts: LoopOpts,
    },
    /// Resume a stopped loop from its persisted state
    Resume {
        #[command(flatten)]
        opts: LoopOpts,
    },
    /// Cancel an active loop
    Cancel,
}

#[derive(Args)]
struct LoopOpts {
    /// Minimum iterations before checking completion
    #[arg(short = 'n', long)]
    min_iterations: Option<String>,

    /// Max iterations (0 = unlimited)
    #[arg(short = 'm', long)]
    max_iterations: Option<String>,

    /// Promise phrase that signals completion (default: COMPLETE)
    #[arg(short = 'p', long)]
    completion_promise: Option<String>,

    /// Agent name (default: ralph-wiggum)
    #[arg(short = 'a', long = "agent")]
    agent_name: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Init { force } => init::init_cmd(force),
        Command::Loop { prompt, opts } => run::loop_cmd(prompt, opts).await,
        Command::Resume { opts } => run::resume_cmd(opts).await,
        Command::Cancel => cancel::cancel_cmd(),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".bright_red());
            std::process::exit(1);
        }
    }
}
