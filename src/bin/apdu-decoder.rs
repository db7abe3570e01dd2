//! Command line front end for the APDU log decoder
//!
//! Usage:
//!   apdu-decoder --file card.apdures --format mastercard
//!   apdu-decoder --list-formats

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};

use apdu_decoder::format::{self, FormatStore};
use apdu_decoder::{decode, DecoderConfig};

#[derive(Parser)]
#[command(name = "apdu-decoder")]
#[command(about = "Decode NFC APDU response logs with format templates", long_about = None)]
struct Cli {
    /// Response log to decode (`.apdures`)
    #[arg(short, long, required_unless_present = "list_formats")]
    file: Option<PathBuf>,

    /// Format template: file name, name without extension, or 1-based index
    #[arg(short = 't', long)]
    format: Option<String>,

    /// Directory holding `.apdufmt` templates
    #[arg(long)]
    format_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append the summary of failed responses
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// List available format templates and exit
    #[arg(short, long, default_value_t = false)]
    list_formats: bool,

    /// Log decoder internals to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => DecoderConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DecoderConfig::default(),
    };
    if let Some(dir) = cli.format_dir {
        config.format_dir = dir;
    }
    if cli.debug {
        config.debug = true;
    }
    debug!("{:?}", config);

    let store = FormatStore::new(&config.format_dir);

    if cli.list_formats {
        print_formats(&store)?;
        return Ok(());
    }

    let Some(file) = cli.file else {
        bail!("--file is required");
    };

    let format_name = match cli.format {
        Some(name) => name,
        None => pick_single_format(&store)?,
    };

    let template = store
        .load(&format_name)
        .with_context(|| format!("failed to load format '{}'", format_name))?;
    let log = format::load_log(&file)?;

    let output = decode(&log, &template, &config.render_options());
    print!("{}", output);
    Ok(())
}

fn print_formats(store: &FormatStore) -> Result<()> {
    let names = store
        .list()
        .with_context(|| format!("failed to list {}", store.dir().display()))?;

    if names.is_empty() {
        println!("No format files found in {}", store.dir().display());
        return Ok(());
    }

    println!("Available format files:");
    for (i, name) in names.iter().enumerate() {
        println!("{}. {}", i + 1, name);
    }
    Ok(())
}

/// Use the only template when there is exactly one
fn pick_single_format(store: &FormatStore) -> Result<String> {
    let names = store
        .list()
        .with_context(|| format!("failed to list {}", store.dir().display()))?;

    match names.as_slice() {
        [] => bail!("no format files found in {}", store.dir().display()),
        [only] => Ok(only.clone()),
        _ => {
            print_formats(store)?;
            bail!("multiple format files found, choose one with --format");
        }
    }
}
