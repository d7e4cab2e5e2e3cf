use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::{
    domain::{ChapterId, ChapterSnapshot, Link, MangaId, MangaSnapshot},
    error::{CoreError, CoreResult},
};

pub mod chapters;
pub mod config;
pub mod library;
pub mod list_sync;
pub mod migration;
pub mod reader;
pub mod search;
pub mod spread;
pub mod state;

pub use chapters::ChapterListController;
pub use config::{ClientSettings, CoreConfig};
pub use library::LibraryController;
pub use list_sync::{ListState, ListSync};
pub use migration::{MigrationController, MigrationEvent, MigrationState};
pub use reader::{ReaderController, ReaderSession};
pub use search::{SearchController, SearchForm};
pub use spread::Spread;
pub use state::StateCell;

const CORE_UNAVAILABLE: &str = "manga core unavailable";

#[async_trait]
pub trait MangaSite: Send + Sync {
    fn name(&self) -> String;
    async fn search(&self, query: &str) -> CoreResult<Vec<Link>>;
}

/// Contract of the data/storage core. Every call may block on disk or network;
/// implementations are expected to offload that work themselves.
#[async_trait]
pub trait MangaCore: Send + Sync {
    async fn list_library(&self) -> CoreResult<Vec<MangaSnapshot>>;
    async fn delete_from_library(&self, id: MangaId) -> CoreResult<()>;
    /// Returns the entry and bumps its last-visited time.
    async fn open_by_id(&self, id: MangaId) -> CoreResult<MangaSnapshot>;
    async fn get_manga(&self, id: MangaId) -> CoreResult<Option<MangaSnapshot>>;
    /// Chapters already stored locally. Fast, possibly stale.
    async fn get_chapters_cache(&self, manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>>;
    /// Chapters refreshed from the site. Slow, authoritative.
    async fn get_chapters(&self, manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>>;
    async fn get_chapter(&self, id: ChapterId) -> CoreResult<Option<ChapterSnapshot>>;
    async fn mark_read(&self, id: ChapterId, is_read: bool) -> CoreResult<()>;
    async fn get_images(&self, chapter_url: &str) -> CoreResult<Vec<String>>;
    /// Request headers the site behind `url` expects on image fetches.
    async fn site_headers(&self, url: &str) -> CoreResult<HashMap<String, String>>;
    fn supported_sites(&self) -> Vec<Arc<dyn MangaSite>>;
    async fn open_link(&self, link: &Link) -> CoreResult<MangaSnapshot>;
    async fn migration_available(&self) -> CoreResult<bool>;
    async fn run_migration(&self) -> CoreResult<()>;
    /// Destroys all stored data.
    async fn reset_database(&self) -> CoreResult<()>;
}

pub struct MissingMangaCore;

#[async_trait]
impl MangaCore for MissingMangaCore {
    async fn list_library(&self) -> CoreResult<Vec<MangaSnapshot>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn delete_from_library(&self, _id: MangaId) -> CoreResult<()> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn open_by_id(&self, id: MangaId) -> CoreResult<MangaSnapshot> {
        Err(CoreError::new(format!("{CORE_UNAVAILABLE}: cannot open manga {}", id.0)))
    }

    async fn get_manga(&self, _id: MangaId) -> CoreResult<Option<MangaSnapshot>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn get_chapters_cache(&self, _manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn get_chapters(&self, _manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn get_chapter(&self, _id: ChapterId) -> CoreResult<Option<ChapterSnapshot>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn mark_read(&self, _id: ChapterId, _is_read: bool) -> CoreResult<()> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn get_images(&self, _chapter_url: &str) -> CoreResult<Vec<String>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn site_headers(&self, _url: &str) -> CoreResult<HashMap<String, String>> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    fn supported_sites(&self) -> Vec<Arc<dyn MangaSite>> {
        Vec::new()
    }

    async fn open_link(&self, _link: &Link) -> CoreResult<MangaSnapshot> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn migration_available(&self) -> CoreResult<bool> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn run_migration(&self) -> CoreResult<()> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }

    async fn reset_database(&self) -> CoreResult<()> {
        Err(CoreError::new(CORE_UNAVAILABLE))
    }
}

/// Application-lifetime owner of the core handle. Every controller it hands out
/// shares the same injected core; dropping the client and its controllers
/// releases it.
pub struct MangaClient {
    core: Arc<dyn MangaCore>,
    settings: ClientSettings,
}

impl MangaClient {
    pub fn new(core: Arc<dyn MangaCore>, settings: ClientSettings) -> Self {
        Self { core, settings }
    }

    pub fn unavailable() -> Self {
        Self::new(Arc::new(MissingMangaCore), ClientSettings::default())
    }

    pub fn core(&self) -> Arc<dyn MangaCore> {
        self.core.clone()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn migration(&self) -> Arc<MigrationController> {
        MigrationController::new(self.core.clone())
    }

    pub fn library(&self) -> Arc<LibraryController> {
        LibraryController::new(self.core.clone())
    }

    pub fn chapters(&self) -> Arc<ChapterListController> {
        ChapterListController::new(self.core.clone())
    }

    pub fn search(&self) -> Arc<SearchController> {
        SearchController::new(self.core.clone())
    }

    pub fn reader(&self) -> Arc<ReaderController> {
        ReaderController::new(self.core.clone(), self.settings.single_first_page_default)
    }
}

#[cfg(test)]
#[path = "tests/fake_core.rs"]
pub(crate) mod fake_core;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
