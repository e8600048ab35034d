use anyhow::{Context, Result};
use clap::Parser;
use ipogmp::{
    config::Config,
    fetch::HttpSource,
    output::render_table,
    pipeline::{self, matcher_for},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ipogmp")]
#[command(about = "Merge IPO subscription figures with grey-market premiums")]
struct Cli {
    /// YAML config; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output JSON file (overrides the config)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Skip printing the merged table to stdout
    #[arg(long)]
    no_print: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) config ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(out) = cli.output {
        cfg.output = out;
    }
    cfg.validate()?;

    // ─── 3) fetch, merge, write ──────────────────────────────────────
    let pages = HttpSource::new(&cfg.http)?;
    let matcher = matcher_for(&cfg);
    let merged = pipeline::run(&cfg, &pages, matcher.as_ref()).context("IPO data run failed")?;

    if !cli.no_print {
        println!("\n--- Merged IPO Data ---");
        print!("{}", render_table(&merged));
    }
    info!(
        path = %cfg.output.display(),
        records = merged.len(),
        "merged data saved"
    );
    Ok(())
}
