mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{StackArgs, cmd_diff, cmd_init, cmd_list, cmd_synth};
use output::print_error;

/// lstack - declare and synthesize the Go Lambda stack
#[derive(Parser)]
#[command(name = "lstack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compose the stack and write its template to the assembly directory
  Synth(StackArgs),

  /// Compare the stack against the last synthesized assembly
  Diff(StackArgs),

  /// List declared resources in creation order with their deployment wave
  List(StackArgs),

  /// Write a sample stack.json
  Init {
    /// Directory to initialize
    #[arg(default_value = ".")]
    path: PathBuf,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match &cli.command {
    Commands::Synth(args) => cmd_synth(args),
    Commands::Diff(args) => cmd_diff(args),
    Commands::List(args) => cmd_list(args),
    Commands::Init { path } => cmd_init(path),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
