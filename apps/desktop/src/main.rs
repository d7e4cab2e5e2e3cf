use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::load_settings, list_sync::ListState, spread, MangaClient, ReaderSession, Spread,
    StateCell,
};
use futures::StreamExt;
use shared::domain::MangaId;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod fixture_core;

use fixture_core::FixtureCore;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the spread layout for a chapter of `pages` images.
    Spreads {
        #[arg(long)]
        pages: usize,
        /// Pair the first page with the second instead of showing it alone.
        #[arg(long)]
        paired: bool,
    },
    /// Walk migration, library, chapters and reader against a JSON fixture.
    Run {
        #[arg(long)]
        fixture: PathBuf,
        /// Library entry to open; defaults to the most recent one.
        #[arg(long)]
        manga: Option<i64>,
        /// Search the first site and add the first hit to the library.
        #[arg(long)]
        search: Option<String>,
        /// Wipe the database and retry when migration fails.
        #[arg(long)]
        reset_on_failure: bool,
    },
}

fn format_spread(spread: &Spread) -> String {
    let page = |image: Option<usize>| image.map_or_else(|| "-".to_string(), |i| i.to_string());
    format!(
        "spread {}: right={} left={}",
        spread.index,
        page(spread.right),
        page(spread.left)
    )
}

fn print_session(session: &ReaderSession) {
    let title = session
        .chapter
        .as_ref()
        .map(|chapter| chapter.title.as_str())
        .unwrap_or("<none>");
    println!(
        "reader: {title} ({} images, {} spreads, single_first_page={})",
        session.images.len(),
        session.spread_count(),
        session.single_first_page_mode
    );
    for spread in session.spreads() {
        let marker = if spread.index == session.current_spread_index {
            ">"
        } else {
            " "
        };
        println!("{marker} {}", format_spread(&spread));
    }
}

fn log_list_updates<T>(area: &'static str, state: &StateCell<ListState<T>>) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    let mut updates = state.stream();
    tokio::spawn(async move {
        while let Some(state) = updates.next().await {
            debug!(
                area,
                loading = state.loading,
                items = state.items.len(),
                error = ?state.error,
                "list state changed"
            );
        }
    })
}

async fn run(
    fixture: PathBuf,
    manga: Option<i64>,
    search: Option<String>,
    reset_on_failure: bool,
) -> Result<()> {
    let settings = load_settings();
    let core_config = settings.core_config()?;
    let core = FixtureCore::load(&fixture, &core_config)?;
    info!(
        database_url = %core.config().database_url,
        single_first_page = settings.single_first_page_default,
        "desktop: core ready"
    );
    let client = MangaClient::new(core, settings);

    let migration = client.migration();
    migration.migrate().await;
    if let Some(error) = migration.snapshot().error().cloned() {
        if !reset_on_failure {
            bail!("migration failed: {error}");
        }
        warn!(error = %error, "desktop: migration failed, resetting database");
        migration.reset_and_migrate().await;
    }
    if let Some(error) = migration.snapshot().error() {
        bail!("migration failed: {error}");
    }
    migration.wait_finished().await;
    println!("migration: finished");

    let library = client.library();
    let library_log = log_list_updates("library", library.state());

    if let Some(query) = search {
        let search = client.search();
        search.set_query(query);
        search.select(0);
        if !search.can_search() {
            warn!("desktop: no searchable site in fixture");
        }
        search.search().await;
        let hits = search.snapshot();
        if let Some(error) = &hits.error {
            warn!(error = %error, "desktop: search failed");
        }
        for hit in &hits.items {
            println!("search: {} <{}>", hit.text, hit.url);
        }
        if let Some(first) = hits.items.first() {
            if let Some(added) = search.open_link(first).await {
                println!("search: opened {} as manga {}", added.title, added.id.0);
            }
        }
    }

    library.load().await;
    let shelf = library.snapshot();
    if let Some(error) = &shelf.error {
        bail!("library failed to load: {error}");
    }
    for manga in &shelf.items {
        println!("library: [{}] {}", manga.id.0, manga.title);
    }

    let Some(manga_id) = manga.map(MangaId).or_else(|| shelf.items.first().map(|m| m.id)) else {
        println!("library: empty");
        library_log.abort();
        return Ok(());
    };
    let Some(opened) = library.open(manga_id).await else {
        library_log.abort();
        bail!("manga {} could not be opened", manga_id.0);
    };

    let chapters = client.chapters();
    let chapters_log = log_list_updates("chapters", chapters.state());
    chapters.load(opened.id).await;
    let listing = chapters.snapshot();
    if let Some(error) = &listing.error {
        warn!(error = %error, "desktop: chapter refresh failed");
    }
    for chapter in &listing.items {
        let read = if chapter.is_read { "x" } else { " " };
        println!("chapters: [{read}] {} ({})", chapter.title, chapter.id.0);
    }

    if let Some(first) = listing.items.first() {
        let reader = client.reader();
        reader.load(first.id).await;
        let session = reader.snapshot();
        if let Some(error) = &session.error {
            warn!(error = %error, "desktop: chapter failed to open");
        } else {
            print_session(&session);
            reader.next();
            reader.toggle_first_page_mode();
            print_session(&reader.snapshot());
        }
    }

    library_log.abort();
    chapters_log.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Spreads { pages, paired } => {
            let single_first_page = !paired;
            println!(
                "{pages} images, {} spreads",
                spread::spread_count(pages, single_first_page)
            );
            for spread in spread::spreads(pages, single_first_page) {
                println!("{}", format_spread(&spread));
            }
        }
        Command::Run {
            fixture,
            manga,
            search,
            reset_on_failure,
        } => run(fixture, manga, search, reset_on_failure).await?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
