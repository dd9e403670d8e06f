use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;
use nixplug::{cli::Cli, config::DEFAULT_TOML_TEMPLATE};

const BIN_NAME: &str = "nixplug";

#[derive(Parser)]
#[command(author, version, about = "Release tasks for nixplug")]
struct Xtask {
  #[command(subcommand)]
  command: Task,
}

#[derive(Subcommand)]
enum Task {
  /// Write completions, man pages and an example configuration.
  Dist {
    /// Output directory for generated files.
    #[arg(short, long, default_value = "dist")]
    output_dir: PathBuf,

    /// Shells to write completions for. Defaults to all supported shells.
    #[arg(short, long, value_enum, action = clap::ArgAction::Append)]
    shell: Vec<Shell>,

    /// Skip shell completions.
    #[arg(long)]
    no_completions: bool,

    /// Skip man pages.
    #[arg(long)]
    no_manpages: bool,
  },
}

fn main() -> Result<()> {
  match Xtask::parse().command {
    Task::Dist {
      output_dir,
      shell,
      no_completions,
      no_manpages,
    } => {
      if !no_completions {
        let shells = if shell.is_empty() {
          Shell::value_variants().to_vec()
        } else {
          shell
        };
        write_completions(&output_dir.join("completions"), &shells)?;
      }
      if !no_manpages {
        write_manpages(&output_dir.join("man"))?;
      }
      write_example_config(&output_dir)?;
    },
  }
  Ok(())
}

fn cli_command() -> Command {
  Cli::command().name(BIN_NAME).bin_name(BIN_NAME)
}

fn write_completions(dir: &Path, shells: &[Shell]) -> Result<()> {
  fs::create_dir_all(dir)?;
  let mut cmd = cli_command();
  for &shell in shells {
    let path = generate_to(shell, &mut cmd, BIN_NAME, dir)
      .with_context(|| format!("Failed to write {shell} completions"))?;
    println!("Wrote {}", path.display());
  }
  Ok(())
}

/// One page for the CLI plus one per subcommand, named like
/// `nixplug-generate.1`.
fn write_manpages(dir: &Path) -> Result<()> {
  fs::create_dir_all(dir)?;
  let cmd = cli_command();

  render_manpage(dir, BIN_NAME, cmd.clone())?;
  for sub in cmd.get_subcommands().filter(|sub| sub.get_name() != "help") {
    let name = format!("{BIN_NAME}-{}", sub.get_name());
    render_manpage(dir, &name, sub.clone())?;
  }
  Ok(())
}

fn render_manpage(dir: &Path, name: &str, cmd: Command) -> Result<()> {
  let path = dir.join(format!("{name}.1"));
  let mut file = fs::File::create(&path)
    .with_context(|| format!("Failed to create manpage file at {}", path.display()))?;
  Man::new(cmd)
    .title(name.to_uppercase())
    .render(&mut file)
    .with_context(|| format!("Failed to render manpage {name}"))?;
  println!("Wrote {}", path.display());
  Ok(())
}

fn write_example_config(dir: &Path) -> Result<()> {
  fs::create_dir_all(dir)?;
  let path = dir.join(format!("{BIN_NAME}.toml.example"));
  fs::write(&path, DEFAULT_TOML_TEMPLATE)
    .with_context(|| format!("Failed to write {}", path.display()))?;
  println!("Wrote {}", path.display());
  Ok(())
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]

  use super::*;

  #[test]
  fn test_dist_writes_pages_for_every_subcommand() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_completions(&dir.path().join("completions"), &[Shell::Bash, Shell::Fish])
      .expect("completions");
    write_manpages(&dir.path().join("man")).expect("manpages");
    write_example_config(dir.path()).expect("config");

    assert!(dir.path().join("completions/nixplug.bash").is_file());
    assert!(dir.path().join("completions/nixplug.fish").is_file());
    for page in ["nixplug", "nixplug-init", "nixplug-generate", "nixplug-inspect"] {
      assert!(dir.path().join(format!("man/{page}.1")).is_file(), "{page}");
    }
    let example =
      fs::read_to_string(dir.path().join("nixplug.toml.example")).expect("example");
    assert_eq!(example, DEFAULT_TOML_TEMPLATE);
  }
}
