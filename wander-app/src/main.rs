use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wander_common::LogFormat;
use wander_common::observability::init_logging;
use wander_config::WanderConfigLoader;
use wander_session::Action;
mod wiring;

/// Wander through Wikipedia one random link at a time.
#[derive(Debug, Parser)]
#[command(name = "wander", version, about)]
struct Args {
    /// YAML config file; a missing `wander.yaml` in the working directory is ignored.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Open this title (or the best search match) instead of a random article.
    #[arg(short, long)]
    start: Option<String>,

    /// Number of suggested links per article (1-9).
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=9))]
    links: Option<u8>,

    /// Write logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    /// Print the first article and its leads as JSON and exit.
    #[arg(long)]
    print: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // env wins over the file
    let loader = match &args.config {
        Some(path) => WanderConfigLoader::new().with_file(path),
        None => WanderConfigLoader::new().with_optional_file("wander.yaml"),
    };
    let mut cfg = loader.load().context("loading configuration")?;
    if let Some(n) = args.links {
        cfg.session.max_links = n.into();
    }
    if args.log_json {
        cfg.log.format = LogFormat::Json;
    }

    let log_path = init_logging(wiring::log_config(&cfg))?;
    tracing::info!(
        target: "app",
        log = %log_path.display(),
        rest_base = %cfg.wiki.rest_base,
        max_links = cfg.session.max_links,
        "app.start"
    );

    let mut wanderer = wiring::build_wanderer(&cfg)?;

    if args.print {
        let first = match args.start {
            Some(title) => Action::Jump(title),
            None => Action::RandomStart,
        };
        if let Err(e) = wanderer.apply(first).await {
            anyhow::bail!("{}", e.user_message());
        }
        println!("{}", serde_json::to_string_pretty(&wanderer.view())?);
        return Ok(());
    }

    wander_tui::run(&mut wanderer, args.start).await
}
