use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

/// Command line interface for nixplug
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Generate Nix modules from client mod plugin settings"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`]). Runs `generate` with the
  /// configured sources when omitted.
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the nixplug CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new nixplug configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "nixplug.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Extract settings from both source trees and write the Nix modules.
  Generate {
    /// Source root of the first variant.
    #[arg(short = 'a', long = "variant-a")]
    variant_a: Option<PathBuf>,

    /// Source root of the second variant.
    #[arg(short = 'b', long = "variant-b")]
    variant_b: Option<PathBuf>,

    /// Output directory for generated modules.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of threads to use for parallel extraction.
    #[arg(short = 'p', long = "jobs")]
    jobs: Option<usize>,

    /// Also write the extracted schemas as JSON to this path.
    #[arg(short, long)]
    json: Option<PathBuf>,
  },

  /// Extract a single plugin and print its schema.
  Inspect {
    /// Plugin entry file (e.g. `src/plugins/foo/index.tsx`).
    file: PathBuf,

    /// Source root used to resolve aliased imports. Defaults to the current
    /// directory.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Print the generated Nix module instead of JSON.
    #[arg(long)]
    nix: bool,
  },
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Copy `generate` flags into `config`. Flags win over file values.
  pub fn apply_to(&self, config: &mut Config) {
    if let Some(Commands::Generate {
      variant_a,
      variant_b,
      output_dir,
      jobs,
      ..
    }) = &self.command
    {
      if variant_a.is_some() {
        config.variant_a.source.clone_from(variant_a);
      }
      if variant_b.is_some() {
        config.variant_b.source.clone_from(variant_b);
      }
      if let Some(dir) = output_dir {
        config.output_dir.clone_from(dir);
      }
      if jobs.is_some() {
        config.jobs = *jobs;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]

  use super::*;

  #[test]
  fn test_generate_flags_override_config() {
    let cli = Cli::try_parse_from([
      "nixplug",
      "--config",
      "jobs=2",
      "generate",
      "-a",
      "vendor/Vencord",
      "--output-dir",
      "out",
      "-p",
      "8",
    ])
    .expect("parses");
    assert_eq!(cli.config_overrides, ["jobs=2"]);

    let mut config = Config::default();
    config.variant_b.source = Some(PathBuf::from("eq"));
    cli.apply_to(&mut config);

    assert_eq!(config.variant_a.source, Some(PathBuf::from("vendor/Vencord")));
    assert_eq!(config.variant_b.source, Some(PathBuf::from("eq")));
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.jobs, Some(8));
  }

  #[test]
  fn test_no_subcommand_leaves_config_alone() {
    let cli = Cli::try_parse_from(["nixplug", "-v"]).expect("parses");
    assert!(cli.verbose);
    assert!(cli.command.is_none());

    let mut config = Config::default();
    cli.apply_to(&mut config);
    assert_eq!(config.output_dir, Config::default().output_dir);
  }
}
