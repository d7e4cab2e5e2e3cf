use std::sync::Arc;

use shared::{
    domain::{MangaId, MangaSnapshot},
    error::ErrorInfo,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    list_sync::{ListState, ListSync},
    state::StateCell,
    MangaCore,
};

pub struct LibraryController {
    core: Arc<dyn MangaCore>,
    list: ListSync<MangaSnapshot>,
}

impl LibraryController {
    pub fn new(core: Arc<dyn MangaCore>) -> Arc<Self> {
        Arc::new(Self {
            core,
            list: ListSync::new("library", ListState::pending()),
        })
    }

    pub fn state(&self) -> &StateCell<ListState<MangaSnapshot>> {
        self.list.state()
    }

    pub fn snapshot(&self) -> ListState<MangaSnapshot> {
        self.list.snapshot()
    }

    pub async fn load(&self) {
        if self.list.sync(None, self.core.list_library()).await {
            info!(
                items = self.list.snapshot().items.len(),
                "library: loaded"
            );
        }
    }

    /// Deletes the entry and reloads the list. The reload always runs, so the
    /// list settles even when the delete fails; a failed delete is reported
    /// in the same snapshot that settles the reload.
    pub async fn delete(&self, id: MangaId) {
        self.list.begin();

        let delete_result = self.core.delete_from_library(id).await;
        if let Err(err) = &delete_result {
            error!(manga_id = id.0, error = %err, "library: delete failed");
        } else {
            info!(manga_id = id.0, "library: deleted");
        }

        let carried = delete_result.err().map(ErrorInfo::from);
        self.list
            .sync_reporting(None, self.core.list_library(), carried)
            .await;
    }

    pub async fn open(&self, id: MangaId) -> Option<MangaSnapshot> {
        match self.core.open_by_id(id).await {
            Ok(manga) => {
                info!(manga_id = id.0, "library: opened");
                Some(manga)
            }
            Err(err) => {
                error!(manga_id = id.0, error = %err, "library: open failed");
                let error = ErrorInfo::from(err);
                self.list.state().update(|s| s.error = Some(error));
                None
            }
        }
    }

    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.load().await })
    }

    pub fn spawn_delete(self: &Arc<Self>, id: MangaId) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.delete(id).await })
    }
}

#[cfg(test)]
#[path = "tests/library_tests.rs"]
mod tests;
