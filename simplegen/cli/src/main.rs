//! simplegen
//!
//! Scans crate modules for `simplegen:<directive>` annotations and writes the
//! generated `<directive>_gen.rs` files next to them.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use simplegen::{GeneratorConfig, SimpleGenerator};
use simplegen_cli::directives;
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Looked up in the working directory when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "simplegen.toml";

/// Annotation-driven Rust source generator
#[derive(Parser, Debug)]
#[command(name = "simplegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Module to scan for annotations, e.g. `models` or `crate::api::types` (repeatable)
    #[arg(short, long = "package", value_name = "MODULE", required = true)]
    packages: Vec<String>,

    /// Directory holding the crate root (`lib.rs` / `main.rs`); overrides the config file
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Configuration file (defaults to ./simplegen.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v INFO, -vv DEBUG, -vvv TRACE, -vvvv TRACE with file/line)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Initialize tracing subscriber based on verbosity level.
///
/// `RUST_LOG` wins over the `-v` count when set.
fn init_tracing(verbose: u8) {
    if verbose == 0 {
        return;
    }

    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            1 => "warn,simplegen=info,simplegen_cli=info".to_string(),
            2 => "warn,simplegen=debug,simplegen_cli=debug".to_string(),
            _ => "info,simplegen=trace,simplegen_cli=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_file(verbose >= 4)
                .with_line_number(verbose >= 4)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)
            .wrap_err_with(|| format!("failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            GeneratorConfig::from_file(DEFAULT_CONFIG_FILE)
                .wrap_err_with(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.source_root = root.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    info!(root = %config.source_root.display(), packages = ?cli.packages, "starting");

    let generator = SimpleGenerator::new(
        config,
        &cli.packages,
        directives::registry(),
        directives::helpers(),
    )
    .wrap_err("failed to load packages")?;

    if cli.dry_run {
        let report = generator.preview().wrap_err("generation failed")?;
        for file in &report.files {
            println!("// {}\n{}", file.path.display(), file.content);
        }
        return Ok(());
    }

    let report = generator.generate().wrap_err("generation failed")?;
    for file in &report.files {
        println!("{}", file.path.display());
    }
    if report.is_empty() {
        eprintln!("No annotations found.");
    }

    Ok(())
}
