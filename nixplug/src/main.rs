use std::{
  fs,
  io::{self, Write},
  path::Path,
};

use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info, warn};
use nixplug::{
  cli::{Cli, Commands},
  config::{Config, Variant},
  runner,
};
use nixplug_codegen::{ModuleOptions, generate_module};

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  match &cli.command {
    Some(Commands::Init {
      output,
      format,
      force,
    }) => init(output, format, *force),

    Some(Commands::Inspect { file, root, nix }) => {
      let config = Config::load(&cli.config_files, &cli.config_overrides)?;
      inspect(&config, file, root.as_deref(), *nix)
    },

    Some(Commands::Generate { json, .. }) => {
      let mut config = Config::load(&cli.config_files, &cli.config_overrides)?;
      cli.apply_to(&mut config);
      generate(&config, json.as_deref())
    },

    None => {
      let config = Config::load(&cli.config_files, &cli.config_overrides)?;
      generate(&config, None)
    },
  }
}

fn init(output: &Path, format: &str, force: bool) -> Result<()> {
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  if let Some(parent) = output.parent()
    && !parent.as_os_str().is_empty()
    && !parent.exists()
  {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
    info!("Created directory: {}", parent.display());
  }

  Config::generate_default_config(format, output).wrap_err_with(|| {
    format!(
      "Failed to generate configuration file: {}",
      output.display()
    )
  })?;

  info!(
    "Configuration file created. Point variant_a.source and variant_b.source \
     at your checkouts."
  );
  Ok(())
}

fn generate(config: &Config, json: Option<&Path>) -> Result<()> {
  info!("Starting module generation...");

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get);
  rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build_global()?;

  let summary = runner::generate(config, json).wrap_err("Module generation failed")?;

  if summary.failed > 0 {
    warn!("{} plugins could not be loaded and were skipped", summary.failed);
  }
  if summary.degraded_settings > 0 {
    warn!(
      "{} settings could not be fully extracted, see warnings above",
      summary.degraded_settings
    );
  }
  info!(
    "Generated {} shared, {} {} and {} {} plugin modules in {}",
    summary.shared,
    summary.variant_a,
    config.label(Variant::A),
    summary.variant_b,
    config.label(Variant::B),
    config.output_dir.display()
  );
  Ok(())
}

fn inspect(config: &Config, file: &Path, root: Option<&Path>, nix: bool) -> Result<()> {
  let root = match root {
    Some(root) => root.to_path_buf(),
    None => std::env::current_dir()?,
  };
  let options = config.load_options(&root);

  let schema = runner::extract_entry(file, &options)
    .wrap_err_with(|| format!("Failed to load plugin {}", file.display()))?;

  let text = if nix {
    let module_options = ModuleOptions {
      header: config.header.clone(),
      ..ModuleOptions::new(
        config.label(Variant::A),
        config.label(Variant::B),
      )
    };
    generate_module(&[&schema], None, &module_options)
  } else {
    let mut json = serde_json::to_string_pretty(&schema)?;
    json.push('\n');
    json
  };

  let mut stdout = io::stdout().lock();
  stdout.write_all(text.as_bytes())?;
  stdout.flush()?;
  Ok(())
}
