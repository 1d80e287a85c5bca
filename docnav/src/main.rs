//! docnav - Read long Markdown documents with a live table of contents

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use docnav_core::{Config, Document, ThemeVariant};
use docnav_tui::App;
use std::fs::File;
use std::path::PathBuf;

/// A terminal reader for long Markdown documents
#[derive(Parser, Debug)]
#[command(name = "docnav")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to markdown file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Section or heading id to open at (with or without the leading '#')
    #[arg(short, long, value_name = "ID")]
    anchor: Option<String>,

    /// Color theme: dark or light
    #[arg(short, long, value_name = "THEME")]
    theme: Option<String>,

    /// Jump instead of animating scrolls
    #[arg(long)]
    reduced_motion: bool,

    /// Write logs to this file (level from RUST_LOG, default info)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// The terminal belongs to the UI, so logs go to a file or nowhere
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let default_level = if log_file.is_some() { "info" } else { "off" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    );
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    // Load configuration
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(theme) = &args.theme {
        let variant = ThemeVariant::parse(theme)
            .ok_or_else(|| anyhow!("Unknown theme: {}", theme))?;
        config.theme = Some(variant);
    }
    if args.reduced_motion {
        config.motion.reduced_motion = true;
    }

    // Load document
    let doc = Document::load(&args.file)
        .with_context(|| format!("Failed to load document: {}", args.file.display()))?;
    log::info!("opened {}", doc.path.display());

    // Create app
    let anchor = args.anchor.as_deref().map(|a| a.trim_start_matches('#'));
    let app = App::new(config, doc, anchor);

    // Run TUI
    docnav_tui::run(app).context("TUI application error")?;

    Ok(())
}
