use std::path::PathBuf;

use clap::{
  ArgAction,
  Parser,
};

#[derive(Parser, Debug)]
#[command(name = "quill", about = "Proof-of-life client for the quill authoring assistant")]
pub struct Cli {
  /// Path to a text file to edit; starts with a sample document if omitted
  pub file: Option<PathBuf>,

  /// Path to the assistant configuration (TOML)
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long, value_name = "FILE")]
  pub log_file: Option<PathBuf>,

  /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, action = ArgAction::Count)]
  pub verbosity: u8,
}
