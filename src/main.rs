//! Picslim CLI - batch image optimizer
//!
//! Resizes and re-encodes every JPEG/PNG under the input directory into a
//! mirrored output tree, optionally adding WebP and AVIF variants.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use console::style;

use picslim::config::{ConfigOverrides, ConfigResolver};
use picslim::parallel::{BarProgress, NoProgress, ProgressSink};
use picslim::{init_logging, optimize, report};

/// Picslim - batch image optimizer
#[derive(Parser, Debug)]
#[command(
    name = "picslim",
    version,
    about = "Resize and re-encode a directory of JPEG/PNG images",
    long_about = "Picslim walks an input directory, resizes JPEG and PNG images to fit a bounding \
                  box without enlarging them, re-encodes them at the requested quality and writes \
                  the results, plus optional WebP/AVIF variants, to a mirrored output directory."
)]
struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image quality (1-100)
    #[arg(short, long, value_name = "QUALITY")]
    quality: Option<u32>,

    /// PNG compression level (0-9)
    #[arg(short = 'l', long, value_name = "LEVEL")]
    compression_level: Option<u32>,

    /// Maximum output width in pixels
    #[arg(long, value_name = "PIXELS")]
    max_width: Option<u32>,

    /// Maximum output height in pixels
    #[arg(long, value_name = "PIXELS")]
    max_height: Option<u32>,

    /// Input directory
    #[arg(short, long, value_name = "PATH")]
    input_dir: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "PATH")]
    output_dir: Option<String>,

    /// Output formats, comma separated (source, webp, avif)
    #[arg(short, long, value_name = "LIST")]
    formats: Option<String>,

    /// Process subdirectories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Images processed concurrently (default: number of CPUs)
    #[arg(short = 'j', long, value_name = "COUNT")]
    concurrency: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            quality: self.quality,
            max_width: self.max_width,
            max_height: self.max_height,
            compression_level: self.compression_level,
            formats: self.formats.clone(),
            recursive: self.recursive.then_some(true),
            concurrency: self.concurrency,
        }
    }

    fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    if let Err(e) = run(&cli).await {
        eprintln!("{}: {:#}", style("Error").red().bold(), e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = ConfigResolver::new()
        .resolve(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;

    let progress: Arc<dyn ProgressSink> = if cli.no_progress || cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(BarProgress::new())
    };

    let outcome = optimize(&config, progress)
        .await
        .with_context(|| format!("Processing failed for {}", config.input_dir.display()))?;

    report::print_summary(&outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_from_args() {
        let cli = Cli::parse_from([
            "picslim", "-q", "70", "--max-width", "1200", "-f", "source,webp", "-r", "-o", "dist",
        ]);
        let overrides = cli.overrides();

        assert_eq!(overrides.quality, Some(70));
        assert_eq!(overrides.max_width, Some(1200));
        assert_eq!(overrides.max_height, None);
        assert_eq!(overrides.formats.as_deref(), Some("source,webp"));
        assert_eq!(overrides.recursive, Some(true));
        assert_eq!(overrides.output_dir.as_deref(), Some("dist"));
        assert_eq!(overrides.input_dir, None);
    }

    #[test]
    fn test_recursive_flag_absent_leaves_file_value() {
        let cli = Cli::parse_from(["picslim"]);
        assert_eq!(cli.overrides().recursive, None);
        assert_eq!(cli.log_level(), "warn");
    }
}
