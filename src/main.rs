//! pipelog - Entry Point

use clap::Parser;
use pipelog::config::{self, KeyBindings, ResolvedConfig};
use pipelog::model::AppError;
use pipelog::orchestrator::{AutoOpen, FetchOrchestrator};
use pipelog::source::{discover_units, DirectoryProvider};
use pipelog::state::UiEvent;
use pipelog::view::{self, ColorConfig, ViewOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// pipelog - browse the logs of a pipeline execution, one section per unit
#[derive(Parser, Debug)]
#[command(name = "pipelog")]
#[command(version)]
#[command(about = "TUI viewer for per-unit execution logs")]
pub struct Args {
    /// Directory holding one `<unit>.jsonl` or `<unit>.log` file per unit
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Start with search query active
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sections to fetch on startup
    #[arg(long, value_enum)]
    pub auto_open: Option<AutoOpen>,

    /// Match case exactly when searching
    #[arg(long)]
    pub case_sensitive: bool,

    /// Hide the time column
    #[arg(long)]
    pub no_timestamps: bool,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Defaults → Config File → Env Vars → CLI Args
fn resolve_config(args: &Args) -> Result<ResolvedConfig, AppError> {
    let config_file = config::load_config_with_precedence(args.config.clone())?;
    let merged = config::merge_config(config_file);
    let with_env = config::apply_env_overrides(merged);

    // Boolean flags only override when actually passed.
    let case_sensitive_override = args.case_sensitive.then_some(true);
    let show_timestamps_override = args.no_timestamps.then_some(false);

    Ok(config::apply_cli_overrides(
        with_env,
        args.auto_open,
        case_sensitive_override,
        show_timestamps_override,
    ))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    pipelog::logging::init(&config.log_file_path)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let units = discover_units(&args.dir).await?;
    info!(
        dir = %args.dir.display(),
        sections = units.len(),
        "Discovered execution units"
    );

    let provider = Arc::new(DirectoryProvider::new(args.dir.clone()));
    let mut orchestrator = FetchOrchestrator::new(provider)
        .with_auto_open(config.auto_open)
        .with_search_options(config.search_options());
    orchestrator.create_sections(units)?;
    if let Some(query) = args.search.clone() {
        orchestrator.handle_event(UiEvent::SearchTextChange(query))?;
    }

    let options = ViewOptions {
        show_timestamps: config.show_timestamps,
        colors: ColorConfig::from_env_and_args(args.no_color),
    };
    view::run_with_orchestrator(orchestrator, KeyBindings::default(), options).await?;

    Ok(())
}
