//! notion-mdx - export Notion problem write-ups to MDX

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use notion_mdx_core::{Assembler, Block, Config, Materializer};

#[derive(Parser)]
#[command(name = "notion-mdx")]
#[command(version, about = "Export a Notion database to MDX documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export every database row to the content directory
    Sync {
        /// Project root that output paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Config file (default: <root>/notion-mdx.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render a JSON array of blocks to stdout without contacting Notion
    Render {
        /// Block JSON with children embedded
        #[arg(value_name = "BLOCKS")]
        input: PathBuf,

        /// Container id used for media paths
        #[arg(long, default_value = "page")]
        page_id: String,

        /// Where images are downloaded
        #[arg(long, default_value = "public/notion")]
        media_dir: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Sync { root, config } => sync(&root, config.as_deref()).await,
        Command::Render {
            input,
            page_id,
            media_dir,
        } => render(&input, &page_id, media_dir).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn sync(root: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(root, config_path)?;
    let report = notion_mdx_core::sync::run(&config, root).await?;
    if report.removed > report.written.len() {
        info!(
            "{} documents from the previous run were not regenerated",
            report.removed - report.written.len()
        );
    }
    Ok(())
}

async fn render(input: &Path, page_id: &str, media_dir: PathBuf) -> Result<()> {
    let blocks = read_blocks(input)?;
    debug!("Rendering {} top-level blocks from {}", blocks.len(), input.display());
    let materializer = Materializer::http(media_dir);

    let document = Assembler::new(&materializer)
        .assemble(page_id, &blocks, None)
        .await?;
    println!("{}", document.text);
    Ok(())
}

fn read_blocks(path: &Path) -> Result<Vec<Block>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("{} is not a block array", path.display()))
}
