use std::sync::Arc;

use shared::{
    domain::{ChapterSnapshot, MangaId, MangaSnapshot},
    error::ErrorInfo,
};
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    list_sync::{ListState, ListSync},
    state::StateCell,
    MangaCore,
};

/// Chapter list of one manga. Shows the locally stored chapters first, then
/// the list refreshed from the site.
pub struct ChapterListController {
    core: Arc<dyn MangaCore>,
    manga: StateCell<Option<MangaSnapshot>>,
    list: ListSync<ChapterSnapshot>,
}

impl ChapterListController {
    pub fn new(core: Arc<dyn MangaCore>) -> Arc<Self> {
        Arc::new(Self {
            core,
            manga: StateCell::new(None),
            list: ListSync::new("chapters", ListState::pending()),
        })
    }

    pub fn state(&self) -> &StateCell<ListState<ChapterSnapshot>> {
        self.list.state()
    }

    pub fn snapshot(&self) -> ListState<ChapterSnapshot> {
        self.list.snapshot()
    }

    pub fn manga(&self) -> &StateCell<Option<MangaSnapshot>> {
        &self.manga
    }

    pub async fn load(&self, manga_id: MangaId) {
        self.list.begin();

        let manga = match self.core.get_manga(manga_id).await {
            Ok(Some(manga)) => manga,
            Ok(None) => {
                self.list
                    .fail(ErrorInfo::new(format!("manga {} not found", manga_id.0)));
                return;
            }
            Err(err) => {
                self.list.fail(err);
                return;
            }
        };
        self.manga.update(|m| *m = Some(manga.clone()));

        let url = manga.url.as_str();
        if self
            .list
            .sync(
                Some(self.core.get_chapters_cache(url)),
                self.core.get_chapters(url),
            )
            .await
        {
            info!(
                manga_id = manga_id.0,
                chapters = self.list.snapshot().items.len(),
                "chapters: refreshed"
            );
        }
    }

    pub fn spawn_load(self: &Arc<Self>, manga_id: MangaId) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.load(manga_id).await })
    }
}

#[cfg(test)]
#[path = "tests/chapters_tests.rs"]
mod tests;
