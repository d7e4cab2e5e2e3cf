use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use client_core::{ClientSettings, MangaClient, MangaCore, MangaSite, MigrationEvent};
use shared::{
    domain::{ChapterId, ChapterSnapshot, Link, MangaId, MangaSnapshot},
    error::{CoreError, CoreResult},
};

struct ShelfCore {
    library: Mutex<Vec<MangaSnapshot>>,
    chapters: Vec<ChapterSnapshot>,
    migrated: Mutex<bool>,
    broken_schema: Mutex<bool>,
}

impl ShelfCore {
    fn new(broken_schema: bool) -> Arc<Self> {
        let manga = |id: i64, title: &str| MangaSnapshot {
            id: MangaId(id),
            title: title.into(),
            url: format!("https://shelf.example/manga/{id}"),
            image: Some(format!("https://shelf.example/cover/{id}.jpg")),
            updated_at: None,
        };
        let chapters = (1..=3)
            .map(|n| ChapterSnapshot {
                id: ChapterId(100 + n),
                manga_url: "https://shelf.example/manga/1".into(),
                title: format!("Chapter {n}"),
                url: format!("https://shelf.example/chapter/{n}"),
                is_read: false,
            })
            .collect();
        Arc::new(Self {
            library: Mutex::new(vec![manga(1, "Blame!"), manga(2, "Dorohedoro")]),
            chapters,
            migrated: Mutex::new(false),
            broken_schema: Mutex::new(broken_schema),
        })
    }
}

#[async_trait]
impl MangaCore for ShelfCore {
    async fn list_library(&self) -> CoreResult<Vec<MangaSnapshot>> {
        Ok(self.library.lock().expect("library").clone())
    }

    async fn delete_from_library(&self, id: MangaId) -> CoreResult<()> {
        self.library
            .lock()
            .expect("library")
            .retain(|manga| manga.id != id);
        Ok(())
    }

    async fn open_by_id(&self, id: MangaId) -> CoreResult<MangaSnapshot> {
        self.get_manga(id)
            .await?
            .ok_or_else(|| CoreError::new("not found"))
    }

    async fn get_manga(&self, id: MangaId) -> CoreResult<Option<MangaSnapshot>> {
        Ok(self
            .library
            .lock()
            .expect("library")
            .iter()
            .find(|manga| manga.id == id)
            .cloned())
    }

    async fn get_chapters_cache(&self, _manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        Ok(self.chapters[..1].to_vec())
    }

    async fn get_chapters(&self, manga_url: &str) -> CoreResult<Vec<ChapterSnapshot>> {
        Ok(self
            .chapters
            .iter()
            .filter(|chapter| chapter.manga_url == manga_url)
            .cloned()
            .collect())
    }

    async fn get_chapter(&self, id: ChapterId) -> CoreResult<Option<ChapterSnapshot>> {
        Ok(self.chapters.iter().find(|chapter| chapter.id == id).cloned())
    }

    async fn mark_read(&self, _id: ChapterId, _is_read: bool) -> CoreResult<()> {
        Ok(())
    }

    async fn get_images(&self, chapter_url: &str) -> CoreResult<Vec<String>> {
        Ok((0..7).map(|page| format!("{chapter_url}/p{page}.webp")).collect())
    }

    async fn site_headers(&self, _url: &str) -> CoreResult<HashMap<String, String>> {
        Ok(HashMap::from([(
            "Referer".to_string(),
            "https://shelf.example/".to_string(),
        )]))
    }

    fn supported_sites(&self) -> Vec<Arc<dyn MangaSite>> {
        Vec::new()
    }

    async fn open_link(&self, _link: &Link) -> CoreResult<MangaSnapshot> {
        Err(CoreError::new("search disabled"))
    }

    async fn migration_available(&self) -> CoreResult<bool> {
        Ok(!*self.migrated.lock().expect("migrated"))
    }

    async fn run_migration(&self) -> CoreResult<()> {
        if *self.broken_schema.lock().expect("schema") {
            return Err(CoreError::new("mismatched migration is found"));
        }
        *self.migrated.lock().expect("migrated") = true;
        Ok(())
    }

    async fn reset_database(&self) -> CoreResult<()> {
        *self.broken_schema.lock().expect("schema") = false;
        self.library.lock().expect("library").clear();
        Ok(())
    }
}

#[tokio::test]
async fn startup_library_chapters_and_reader_flow() {
    let core = ShelfCore::new(false);
    let client = MangaClient::new(core.clone(), ClientSettings::default());

    let migration = client.migration();
    let mut events = migration.subscribe_events();
    migration.migrate().await;
    assert_eq!(events.recv().await.expect("proceed"), MigrationEvent::Proceed);

    let library = client.library();
    library.load().await;
    assert_eq!(library.snapshot().items.len(), 2);

    library.delete(MangaId(2)).await;
    let state = library.snapshot();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].id, MangaId(1));
    assert!(!state.loading);
    assert_eq!(state.error, None);

    let chapters = client.chapters();
    chapters.load(MangaId(1)).await;
    let chapter_state = chapters.snapshot();
    assert_eq!(chapter_state.items.len(), 3);
    assert_eq!(
        chapters.manga().snapshot().map(|m| m.title),
        Some("Blame!".to_string())
    );

    let reader = client.reader();
    reader.load(chapter_state.items[1].id).await;
    let session = reader.snapshot();
    assert_eq!(session.spread_count(), 4);
    assert_eq!(session.current_images().len(), 1);

    reader.go_to(2);
    reader.toggle_first_page_mode();
    let paired = reader.snapshot();
    assert!(!paired.single_first_page_mode);
    assert_eq!(paired.current_spread_index, 1);
    assert_eq!(
        paired.current_images(),
        vec![
            "https://shelf.example/chapter/2/p2.webp",
            "https://shelf.example/chapter/2/p3.webp"
        ]
    );

    reader.toggle_first_page_mode();
    assert_eq!(reader.snapshot().current_spread_index, 2);
}

#[tokio::test]
async fn broken_schema_recovers_through_reset() {
    let core = ShelfCore::new(true);
    let client = MangaClient::new(core.clone(), ClientSettings::default());
    let migration = client.migration();

    migration.migrate().await;
    let failed = migration.snapshot();
    assert_eq!(
        failed.error().map(|e| e.message.as_str()),
        Some("mismatched migration is found")
    );

    migration.reset_and_migrate().await;
    assert!(migration.snapshot().is_finished());

    let library = client.library();
    library.load().await;
    assert!(library.snapshot().is_settled_empty());
}
