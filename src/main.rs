use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use image_weaver::config::{default_config_path, load_json_config, save_json_config, WeaverConfig};
use image_weaver::session::{GenerateOutcome, ImageStatus, Session};
use image_weaver::{build_session, logging};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "image-weaver", version, about = "Turn an article into illustrated image prompts")]
struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the image prompts suggested for an article.
    Prompts(PromptsArgs),
    /// Generate prompts and images for an article and export the results.
    Run(RunArgs),
    /// Write the default configuration file.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Parser)]
struct PromptsArgs {
    /// Article file, or `-` for stdin.
    article: PathBuf,
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Article file, or `-` for stdin.
    article: PathBuf,
    /// Extra prompt batches to request before generating.
    #[arg(long, default_value_t = 0)]
    more: usize,
    /// Where finished images are copied.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Only generate these indices, concurrently.
    #[arg(long, value_delimiter = ',')]
    only: Vec<usize>,
}

#[derive(Debug, Parser)]
struct InitConfigArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("image-weaver error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    // init-config must work even when the existing file is broken.
    if let Command::InitConfig(args) = cli.command {
        logging::init_tracing(cli.log_level.as_deref().unwrap_or("info"));
        return run_init_config(&config_path, args);
    }

    let config: WeaverConfig = load_json_config(&config_path, "weaver")
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    logging::init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level));
    info!(path = %config_path.display(), exists = config_path.exists(), "configuration loaded");

    match cli.command {
        Command::Prompts(args) => run_prompts(&config, args).await,
        Command::Run(args) => run_run(&config, args).await,
        Command::InitConfig(args) => run_init_config(&config_path, args),
    }
}

fn read_article(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read article from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read article {}", path.display()))
}

async fn prepared_session(config: &WeaverConfig, article: &Path) -> Result<Session> {
    let text = read_article(article)?;
    let session = build_session(config)
        .await
        .context("failed to set up prompt service")?;
    session.set_article(text).await;
    session.submit_article().await?;
    Ok(session)
}

async fn run_prompts(config: &WeaverConfig, args: PromptsArgs) -> Result<()> {
    let session = prepared_session(config, &args.article).await?;
    for (index, item) in session.snapshot().items.iter().enumerate() {
        println!("{}. {}", index + 1, item.prompt);
    }
    Ok(())
}

async fn run_run(config: &WeaverConfig, args: RunArgs) -> Result<()> {
    let session = prepared_session(config, &args.article).await?;

    for batch in 0..args.more {
        match session.generate_more().await {
            Ok(count) => info!(batch, count, "extra prompts added"),
            Err(err) => warn!(batch, error = %err, "could not add more prompts"),
        }
    }

    let outcomes: Vec<(usize, GenerateOutcome)> = if args.only.is_empty() {
        session.generate_all().await
    } else {
        let total = session.snapshot().items.len();
        if let Some(bad) = args.only.iter().find(|&&index| index >= total) {
            bail!("index {} is out of range (session has {} items)", bad, total);
        }
        let runs = args.only.iter().map(|&index| {
            let session = session.clone();
            async move { (index, session.generate(index).await) }
        });
        join_all(runs).await
    };

    let failed = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, GenerateOutcome::Failed { .. }))
        .count();
    info!(attempted = outcomes.len(), failed, "generation finished");

    let out_dir = args.out.unwrap_or_else(|| config.resolve_output_dir().join("exports"));
    let snapshot = session.snapshot();
    for (index, item) in snapshot.items.iter().enumerate() {
        if item.status() != ImageStatus::Success {
            continue;
        }
        let path = session
            .export_image(index, &out_dir)
            .await
            .with_context(|| format!("failed to export image {}", index))?;
        eprintln!("saved {}", path.display());
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("failed to serialize session")?
    );

    if let Some(notice) = &snapshot.error {
        eprintln!("{}", notice);
    }
    Ok(())
}

fn run_init_config(path: &Path, args: InitConfigArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    save_json_config(path, &WeaverConfig::default(), "weaver")?;
    println!("wrote {}", path.display());
    Ok(())
}
