//! A `MangaCore` served from a JSON fixture, for driving the controllers from
//! the command line without a storage engine.

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use client_core::{CoreConfig, MangaCore, MangaSite};
use serde::Deserialize;
use shared::{
    domain::{ChapterId, ChapterSnapshot, Link, MangaId, MangaSnapshot},
    error::{CoreError, CoreResult},
};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub library: Vec<MangaSnapshot>,
    /// Chapters the site reports, keyed by manga url.
    pub chapters: HashMap<String, Vec<ChapterSnapshot>>,
    /// Chapters already stored locally, keyed by manga url.
    pub cached_chapters: HashMap<String, Vec<ChapterSnapshot>>,
    pub images: HashMap<String, Vec<String>>,
    /// Image request headers, keyed by url prefix.
    pub headers: HashMap<String, HashMap<String, String>>,
    pub sites: Vec<FixtureSite>,
    pub migration_pending: bool,
    pub migration_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSite {
    pub name: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[async_trait]
impl MangaSite for FixtureSite {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn search(&self, query: &str) -> CoreResult<Vec<Link>> {
        let needle = query.to_lowercase();
        Ok(self
            .links
            .iter()
            .filter(|link| link.text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

pub struct FixtureCore {
    config: CoreConfig,
    data: Mutex<Fixture>,
    sites: Vec<Arc<dyn MangaSite>>,
}

impl FixtureCore {
    pub fn new(fixture: Fixture, config: CoreConfig) -> Arc<Self> {
        let sites = fixture
            .sites
            .iter()
            .cloned()
            .map(|site| Arc::new(site) as Arc<dyn MangaSite>)
            .collect();
        Arc::new(Self {
            config,
            data: Mutex::new(fixture),
            sites,
        })
    }

    pub fn from_json(raw: &str, config: CoreConfig) -> anyhow::Result<Arc<Self>> {
        let fixture: Fixture = serde_json::from_str(raw).context("invalid fixture json")?;
        Ok(Self::new(fixture, config))
    }

    /// Stands in for the database named by `config`; the database itself is
    /// never opened.
    pub fn load(path: &Path, config: &CoreConfig) -> anyhow::Result<Arc<Self>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture '{}'", path.display()))?;
        let core = Self::from_json(&raw, config.clone())?;
        info!(
            fixture = %path.display(),
            database_url = %config.database_url,
            "fixture: serving fixture in place of database"
        );
        Ok(core)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn find_chapter(data: &Fixture, id: ChapterId) -> Option<ChapterSnapshot> {
        data.chapters
            .values()
            .chain(data.cached_chapters.values())
            .flatten()
            .find(|chapter| chapter.id == id)
            .cloned()
    }
}

fn not_found(what: &str, id: i64) -> CoreError {
    CoreError::new(format!("{what} {id} not found"))
}

#[async_trait]
impl MangaCore for FixtureCore {
    async fn list_library(&self) -> CoreResult<Vec<MangaSnapshot>> {
        let data = self.data.lock().await;
        let mut library = data.library.clone();
        library.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(library)
    }

    async fn delete_from_library(&self, id: MangaId) -> CoreResult<()> {
        let mut data = self.data.lock().await;
        let before = data.library.len();
        data.library.retain(|manga| manga.id != id);
        if data.library.len() == before {
            return Err(not_found("manga", id.0));
        }
        Ok(())
    }

    async fn open_by_id(&self, id: MangaId) -> CoreResult<MangaSnapshot> {
        let mut data = self.data.lock().await;
        let manga = data
            .library
            .iter_mut()
            .find(|manga| manga.id == id)
            .ok_or_else(|| not_found("manga", id.0))?;
        manga.updated_at = Some(Utc::now());
        Ok(manga.clone())
    }

    async fn get_manga(&self, id: MangaId) -> CoreResult<Option<MangaSnapshot>> {
        let data = self.data.lock().await;
        Ok(data.library.iter().find(|manga| manga.id == id).cloned())
    }

    async fn get_chapters_cache(&self, manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        let data = self.data.lock().await;
        Ok(data
            .cached_chapters
            .get(manga_url)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_chapters(&self, manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        let mut data = self.data.lock().await;
        let fresh = data.chapters.get(manga_url).cloned().unwrap_or_default();
        data.cached_chapters
            .insert(manga_url.to_string(), fresh.clone());
        Ok(fresh)
    }

    async fn get_chapter(&self, id: ChapterId) -> CoreResult<Option<ChapterSnapshot>> {
        let data = self.data.lock().await;
        Ok(Self::find_chapter(&data, id))
    }

    async fn mark_read(&self, id: ChapterId, is_read: bool) -> CoreResult<()> {
        let mut guard = self.data.lock().await;
        let data = &mut *guard;
        let mut found = false;
        for chapter in data
            .chapters
            .values_mut()
            .chain(data.cached_chapters.values_mut())
            .flatten()
            .filter(|chapter| chapter.id == id)
        {
            chapter.is_read = is_read;
            found = true;
        }
        if !found {
            return Err(not_found("chapter", id.0));
        }
        Ok(())
    }

    async fn get_images(&self, chapter_url: &str) -> CoreResult<Vec<String>> {
        let data = self.data.lock().await;
        data.images
            .get(chapter_url)
            .cloned()
            .ok_or_else(|| CoreError::new(format!("no images for {chapter_url}")))
    }

    async fn site_headers(&self, url: &str) -> CoreResult<HashMap<String, String>> {
        let data = self.data.lock().await;
        Ok(data
            .headers
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, headers)| headers.clone())
            .unwrap_or_default())
    }

    fn supported_sites(&self) -> Vec<Arc<dyn MangaSite>> {
        self.sites.clone()
    }

    async fn open_link(&self, link: &Link) -> CoreResult<MangaSnapshot> {
        let mut data = self.data.lock().await;
        let now = Some(Utc::now());
        if let Some(existing) = data.library.iter_mut().find(|manga| manga.url == link.url) {
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let next_id = data.library.iter().map(|manga| manga.id.0).max().unwrap_or(0) + 1;
        let manga = MangaSnapshot {
            id: MangaId(next_id),
            title: link.text.clone(),
            url: link.url.clone(),
            image: link.image.clone(),
            updated_at: now,
        };
        data.library.push(manga.clone());
        Ok(manga)
    }

    async fn migration_available(&self) -> CoreResult<bool> {
        Ok(self.data.lock().await.migration_pending)
    }

    async fn run_migration(&self) -> CoreResult<()> {
        let mut data = self.data.lock().await;
        if let Some(message) = &data.migration_error {
            return Err(CoreError::new(message.clone()));
        }
        data.migration_pending = false;
        Ok(())
    }

    async fn reset_database(&self) -> CoreResult<()> {
        let mut data = self.data.lock().await;
        data.library.clear();
        data.cached_chapters.clear();
        data.migration_error = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/fixture_core_tests.rs"]
mod tests;
