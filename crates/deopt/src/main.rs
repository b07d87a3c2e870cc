use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use deopt::{config::Config, output, split};
use log::{LevelFilter, debug, info};

/// deopt: split a CommonJS bundle into independently loadable fragments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Modules that are part of the bundle, relative to the base directory
    files: Vec<PathBuf>,

    /// Configuration file (defaults to ./deopt.toml, then the user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory module ids are computed against
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Directory the fragments are written to
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Entry point run when the fragments load (repeatable)
    #[arg(short, long = "entry")]
    entries: Vec<PathBuf>,

    /// Alias registration in the form `name=target` (repeatable)
    #[arg(short, long = "alias", value_parser = parse_alias)]
    aliases: Vec<(String, String)>,

    /// Also write a JSON manifest with the fragment load order
    #[arg(long)]
    manifest: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_alias(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, target)) if !name.is_empty() && !target.is_empty() => {
            Ok((name.to_owned(), target.to_owned()))
        }
        _ => Err(format!("expected `name=target`, got `{value}`")),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None);
    // RUST_LOG takes precedence over -v
    builder.parse_default_env();
    builder.init();
}

/// Apply command line flags on top of the file configuration
fn merge_cli(mut config: Config, cli: Cli) -> Config {
    if let Some(base_dir) = cli.base_dir {
        config.base_dir = Some(base_dir);
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }
    config.files.extend(cli.files);
    config.entries.extend(cli.entries);
    config.aliases.extend(cli.aliases);
    config.manifest |= cli.manifest;
    config
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let config = merge_cli(config, cli);
    debug!("Effective configuration: {config:?}");

    let base_dir = config.resolve_base_dir()?;
    let mut bundle = config
        .build_bundle(&base_dir)
        .context("Failed to assemble the bundle")?;

    let result = split(&mut bundle, Some(&base_dir))?;

    let out_dir = base_dir.join(&config.out_dir);
    output::write_fragments(&result, &out_dir)?;
    if config.manifest {
        let manifest = output::write_manifest(&result, &out_dir)?;
        info!("Wrote manifest {}", manifest.display());
    }

    Ok(())
}
