mod catalog;
mod library;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;

use beatdrop_proto::config::Config;
use beatdrop_songlist::runtime::SongListRuntime;
use beatdrop_songlist::session::FileSessionStore;
use beatdrop_songlist::SongListController;
use clap::Parser;

/// Browse a song catalog in the terminal.
#[derive(Parser, Debug)]
#[command(name = "beatdrop", version)]
struct Args {
    /// JSON file with catalog song records (an array, or `{"songs": [...]}`).
    catalog: PathBuf,

    /// JSON file with locally scanned song records.
    #[arg(long)]
    local: Option<PathBuf>,

    /// Config file (default: platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with compact rows.
    #[arg(long)]
    compact: bool,

    /// Only load more songs on request, not when scrolled to the bottom.
    #[arg(long)]
    no_auto_load_more: bool,

    /// Records per catalog page.
    #[arg(long)]
    page_size: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = beatdrop_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("beatdrop.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("beatdrop log: {}", log_path.display());
    tracing::info!("beatdrop starting…");

    // ── Config ───────────────────────────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!("config: falling back to defaults: {:#}", e);
            Config::default()
        }),
    };
    if args.compact {
        config.list.compact = true;
    }
    if args.no_auto_load_more {
        config.list.auto_load_more = false;
    }
    if let Some(page_size) = args.page_size {
        config.list.page_size = page_size;
    }

    // ── Collaborators ────────────────────────────────────────────────────────
    let catalog = catalog::JsonCatalog::load(&args.catalog).await?;
    let library = library::LocalLibrary::open(args.local.clone()).await?;
    let store = FileSessionStore::open(config.paths.session_file.clone());

    let controller = SongListController::new(&config, Box::new(store));
    let runtime = SongListRuntime::new(
        controller,
        Arc::new(catalog),
        Arc::new(library),
        Box::new(terminal::StderrNotices),
        Box::new(terminal::StdoutPresenter),
    );

    eprintln!("{}", terminal::HELP);
    let viewport = terminal::TerminalViewport::new(config.list.compact, config.list.auto_load_more);
    let controller = runtime.run(viewport).await;

    tracing::info!(
        "beatdrop exiting at scroll_top={}",
        controller.session().scroll_top()
    );
    Ok(())
}
