//! playvault - inspect video URLs, search the catalog provider and exercise
//! playlist sync against an in-memory store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use playvault_core::drag::{sortable_ids, DragEvent};
use playvault_core::ops::ListOp;
use playvault_core::playlist::PlaylistDraft;
use playvault_core::types::{Playlist, VideoEntry};
use playvault_core::video_ref::{self, ThumbnailSize};
use playvault_sync::pager::{CatalogBrowser, CatalogPager};
use playvault_sync::{
    ClientConfig, MemoryStore, PlaylistReconciler, Session, VideoSearch, YouTubeDataApi,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "playvault")]
#[command(about = "Video playlist sync toolkit", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the canonical video id from a URL
    Parse {
        url: String,
    },
    /// Search the video catalog provider
    Search {
        term: String,
        /// Maximum number of results (defaults to the configured value)
        #[arg(short, long)]
        max: Option<usize>,
    },
    /// Show details for a single video id
    Video {
        id: String,
    },
    /// Write a config file with default values
    InitConfig {
        path: PathBuf,
    },
    /// Seed an in-memory catalog, page through it and edit a playlist
    Demo {
        /// Number of playlists to seed
        #[arg(short, long, default_value_t = 20)]
        playlists: usize,
        /// Simulate a sort index that is still building
        #[arg(long)]
        index_building: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { path } => {
            ClientConfig::default()
                .save_to_file(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote default config to {}", path.display());
        }
        Commands::Parse { url } => parse_url(&url)?,
        Commands::Search { term, max } => {
            search(&load_config(cli.config.as_deref())?, &term, max).await?;
        }
        Commands::Video { id } => video(&load_config(cli.config.as_deref())?, &id).await?,
        Commands::Demo {
            playlists,
            index_building,
        } => demo(&load_config(cli.config.as_deref())?, playlists, index_building).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    ClientConfig::load(path).context("loading configuration")
}

fn parse_url(url: &str) -> anyhow::Result<()> {
    let parsed = video_ref::parse(url);
    let Some(id) = parsed.canonical_id.as_deref() else {
        bail!("not a recognised video URL: {url}");
    };
    println!("id:        {id}");
    println!("watch:     {}", video_ref::watch_url(id));
    println!("thumbnail: {}", video_ref::thumbnail_url(id, ThumbnailSize::List));
    println!("player:    {}", video_ref::thumbnail_url(id, ThumbnailSize::Player));
    Ok(())
}

async fn search(config: &ClientConfig, term: &str, max: Option<usize>) -> anyhow::Result<()> {
    let api = YouTubeDataApi::new(config).context("creating search client")?;
    let results = api
        .lookup(term, max.unwrap_or(config.search_max_results))
        .await
        .context("searching videos")?;
    if results.is_empty() {
        println!("no results");
    }
    for c in results {
        println!("{}  {}  ({})", c.id, c.title, c.channel_title);
    }
    Ok(())
}

async fn video(config: &ClientConfig, id: &str) -> anyhow::Result<()> {
    let api = YouTubeDataApi::new(config).context("creating search client")?;
    let c = api.video_details(id).await.context("fetching video details")?;
    println!("{}\n{}\n{}", c.title, c.url, c.description);
    Ok(())
}

async fn demo(config: &ClientConfig, count: usize, index_building: bool) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let reconciler = PlaylistReconciler::new(store.clone(), config);
    let session = Session::new("demo-user").with_display_name("Demo");

    let mut first: Option<Playlist> = None;
    for i in 0..count {
        let mut draft = PlaylistDraft::new(format!("Demo playlist {i:02}"));
        draft.is_hidden = i % 5 == 4;
        draft.videos = (0..3)
            .map(|n| {
                let url = format!("https://youtu.be/dm{i:03}vid{n:03}");
                VideoEntry::new(url, &format!("Video {n}"), "", Utc::now())
            })
            .collect();
        let created = reconciler
            .create_playlist(&session, draft)
            .await
            .context("seeding catalog")?;
        first.get_or_insert(created);
    }
    info!(count, "catalog seeded");

    store.set_index_ready(!index_building);
    let mut browser = CatalogBrowser::new(CatalogPager::new(store.clone(), config), config.page_size);
    browser.load_first().await.context("loading first page")?;
    let mut page = 1;
    print_page(page, browser.items(), browser.is_index_building());
    while browser.has_more() {
        let seen = browser.items().len();
        browser.load_more().await.context("loading next page")?;
        page += 1;
        print_page(page, &browser.items()[seen..], browser.is_index_building());
    }

    let Some(playlist) = first else {
        return Ok(());
    };
    let mut edit = reconciler.open_for_edit(&session, &playlist.id).await?;
    let ids = sortable_ids(edit.playlist().videos.len());
    if let (Some(active), Some(over)) = (ids.last(), ids.first()) {
        let event = DragEvent::new(active.clone(), Some(over.clone()));
        if let Some(result) = reconciler.apply_drag(&mut edit, &event).await {
            result.context("reordering")?;
        }
    }
    reconciler
        .apply_and_persist(&mut edit, ListOp::Remove { index: 1 })
        .await
        .context("removing video")?;

    let views = reconciler.update_view_count(&playlist.id).await?;
    let stored = reconciler.get_playlist(&playlist.id).await?;
    let creator = reconciler.resolve_creator_name(&stored).await;
    println!("\n{} by {creator} ({views} views)", stored.name);
    for (i, v) in stored.videos.iter().enumerate() {
        println!("  {i}. {} {}", v.title, v.url);
    }
    Ok(())
}

fn print_page(page: usize, items: &[Playlist], index_building: bool) {
    let note = if index_building { " (index building)" } else { "" };
    println!("page {page}{note}");
    for p in items {
        println!("  {}  {}", p.created_at.format("%H:%M:%S%.3f"), p.name);
    }
}
