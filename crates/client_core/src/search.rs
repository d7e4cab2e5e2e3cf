use std::sync::Arc;

use shared::{
    domain::{Link, MangaSnapshot},
    error::ErrorInfo,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{
    list_sync::{ListState, ListSync},
    state::StateCell,
    MangaCore, MangaSite,
};

/// Input fields of the search screen. Editing them does no I/O.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub query: String,
    pub site_names: Vec<String>,
    pub selected_index: usize,
}

impl SearchForm {
    pub fn selected_site_name(&self) -> Option<&str> {
        self.site_names.get(self.selected_index).map(String::as_str)
    }
}

pub struct SearchController {
    core: Arc<dyn MangaCore>,
    sites: Vec<Arc<dyn MangaSite>>,
    form: StateCell<SearchForm>,
    list: ListSync<Link>,
}

impl SearchController {
    pub fn new(core: Arc<dyn MangaCore>) -> Arc<Self> {
        let sites = core.supported_sites();
        let form = SearchForm {
            site_names: sites.iter().map(|site| site.name()).collect(),
            ..SearchForm::default()
        };
        Arc::new(Self {
            core,
            sites,
            form: StateCell::new(form),
            list: ListSync::new("search", ListState::default()),
        })
    }

    pub fn form(&self) -> &StateCell<SearchForm> {
        &self.form
    }

    pub fn state(&self) -> &StateCell<ListState<Link>> {
        self.list.state()
    }

    pub fn snapshot(&self) -> ListState<Link> {
        self.list.snapshot()
    }

    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.form.update(|f| f.query = text);
    }

    pub fn select(&self, index: usize) {
        self.form.update(|f| f.selected_index = index);
    }

    pub fn can_search(&self) -> bool {
        !self.list.snapshot().loading && !self.form.snapshot().query.trim().is_empty()
    }

    /// Searches the selected site with the current query. Ignored while a
    /// search is running or when the query is blank.
    pub async fn search(&self) {
        let form = self.form.snapshot();
        if form.query.trim().is_empty() {
            debug!("search: blank query ignored");
            return;
        }

        let claimed = self.list.state().transition(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.error = None;
            true
        });
        if !claimed {
            debug!("search: already running");
            return;
        }

        let Some(site) = self.sites.get(form.selected_index) else {
            self.list.fail(ErrorInfo::new(format!(
                "no search site at index {}",
                form.selected_index
            )));
            return;
        };

        if self.list.sync(None, site.search(&form.query)).await {
            info!(
                site = %site.name(),
                results = self.list.snapshot().items.len(),
                "search: completed"
            );
        }
    }

    pub async fn open_link(&self, link: &Link) -> Option<MangaSnapshot> {
        match self.core.open_link(link).await {
            Ok(manga) => {
                info!(manga_id = manga.id.0, url = %link.url, "search: manga opened");
                Some(manga)
            }
            Err(err) => {
                error!(url = %link.url, error = %err, "search: open failed");
                let error = ErrorInfo::from(err);
                self.list.state().update(|s| s.error = Some(error));
                None
            }
        }
    }

    pub fn spawn_search(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.search().await })
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
