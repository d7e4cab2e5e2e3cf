use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{ChapterId, ChapterSnapshot},
    error::{CoreResult, ErrorInfo},
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::{
    spread::{self, Spread},
    state::StateCell,
    MangaCore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ToggleReturn {
    from: usize,
    to: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSession {
    pub chapter: Option<ChapterSnapshot>,
    pub images: Vec<String>,
    pub headers: HashMap<String, String>,
    pub single_first_page_mode: bool,
    pub current_spread_index: usize,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    // Set by a toggle, cleared by navigation.
    toggle_return: Option<ToggleReturn>,
}

impl ReaderSession {
    pub fn new(single_first_page_mode: bool) -> Self {
        Self {
            chapter: None,
            images: Vec::new(),
            headers: HashMap::new(),
            single_first_page_mode,
            current_spread_index: 0,
            loading: false,
            error: None,
            toggle_return: None,
        }
    }

    pub fn spread_count(&self) -> usize {
        spread::spread_count(self.images.len(), self.single_first_page_mode)
    }

    pub fn spread(&self, index: usize) -> Option<Spread> {
        spread::spread_at(self.images.len(), self.single_first_page_mode, index)
    }

    /// `None` only for an empty chapter in paired mode, which has no spreads.
    pub fn current_spread(&self) -> Option<Spread> {
        self.spread(self.current_spread_index)
    }

    pub fn spreads(&self) -> impl Iterator<Item = Spread> {
        spread::spreads(self.images.len(), self.single_first_page_mode)
    }

    pub fn current_images(&self) -> Vec<&str> {
        self.current_spread()
            .map(|spread| {
                spread
                    .pages()
                    .filter_map(|page| self.images.get(page).map(String::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn open(
        &mut self,
        chapter: ChapterSnapshot,
        images: Vec<String>,
        headers: HashMap<String, String>,
    ) {
        self.chapter = Some(chapter);
        self.images = images;
        self.headers = headers;
        self.current_spread_index = 0;
        self.toggle_return = None;
    }

    /// Flips single-first-page mode and moves to a spread that keeps one of
    /// the current images on screen. Flipping back before navigating
    /// returns to the exact spread the reader was on.
    pub fn toggle_first_page_mode(&mut self) {
        let last = self.current_spread_index;
        self.single_first_page_mode = !self.single_first_page_mode;

        let next = match self.toggle_return.take() {
            Some(previous) if previous.to == last => previous.from,
            _ => spread::index_after_toggle(last, self.single_first_page_mode),
        };
        self.current_spread_index = self.clamp(next);
        self.toggle_return = Some(ToggleReturn {
            from: last,
            to: self.current_spread_index,
        });
    }

    /// Moves to `index`, clamped to the last spread. Returns whether the
    /// position changed.
    pub fn go_to(&mut self, index: usize) -> bool {
        let index = self.clamp(index);
        if index == self.current_spread_index {
            return false;
        }
        self.current_spread_index = index;
        self.toggle_return = None;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_spread_index + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.current_spread_index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    fn clamp(&self, index: usize) -> usize {
        index.min(self.spread_count().saturating_sub(1))
    }
}

impl Default for ReaderSession {
    fn default() -> Self {
        Self::new(true)
    }
}

pub struct ReaderController {
    core: Arc<dyn MangaCore>,
    session: StateCell<ReaderSession>,
}

impl ReaderController {
    pub fn new(core: Arc<dyn MangaCore>, single_first_page_mode: bool) -> Arc<Self> {
        Arc::new(Self {
            core,
            session: StateCell::new(ReaderSession::new(single_first_page_mode)),
        })
    }

    pub fn session(&self) -> &StateCell<ReaderSession> {
        &self.session
    }

    pub fn snapshot(&self) -> ReaderSession {
        self.session.snapshot()
    }

    /// Opens the chapter: marks it read, then fetches its images and the
    /// headers its site needs. Keeps the mode chosen by the user.
    pub async fn load(&self, chapter_id: ChapterId) {
        self.session.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.fetch(chapter_id).await {
            Ok(Some((chapter, images, headers))) => {
                info!(
                    chapter_id = chapter_id.0,
                    images = images.len(),
                    "reader: chapter loaded"
                );
                self.session.update(|s| {
                    s.open(chapter, images, headers);
                    s.loading = false;
                });
            }
            Ok(None) => {
                error!(chapter_id = chapter_id.0, "reader: chapter not found");
                self.session.update(|s| {
                    s.loading = false;
                    s.error = Some(ErrorInfo::new(format!(
                        "chapter {} not found",
                        chapter_id.0
                    )));
                });
            }
            Err(err) => {
                error!(chapter_id = chapter_id.0, error = %err, "reader: load failed");
                let error = ErrorInfo::from(err);
                self.session.update(|s| {
                    s.loading = false;
                    s.error = Some(error);
                });
            }
        }
    }

    #[allow(clippy::type_complexity)]
    async fn fetch(
        &self,
        chapter_id: ChapterId,
    ) -> CoreResult<Option<(ChapterSnapshot, Vec<String>, HashMap<String, String>)>> {
        let Some(mut chapter) = self.core.get_chapter(chapter_id).await? else {
            return Ok(None);
        };
        self.core.mark_read(chapter.id, true).await?;
        chapter.is_read = true;

        let images = self.core.get_images(&chapter.url).await?;
        let headers = self.core.site_headers(&chapter.url).await?;
        Ok(Some((chapter, images, headers)))
    }

    pub fn toggle_first_page_mode(&self) {
        self.session.update(|s| {
            s.toggle_first_page_mode();
            debug!(
                single_first_page = s.single_first_page_mode,
                spread = s.current_spread_index,
                "reader: first page mode toggled"
            );
        });
    }

    pub fn go_to(&self, index: usize) -> bool {
        self.session.transition(|s| s.go_to(index))
    }

    pub fn next(&self) -> bool {
        self.session.transition(ReaderSession::next)
    }

    pub fn prev(&self) -> bool {
        self.session.transition(ReaderSession::prev)
    }

    pub fn spawn_load(self: &Arc<Self>, chapter_id: ChapterId) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.load(chapter_id).await })
    }
}

#[cfg(test)]
#[path = "tests/reader_tests.rs"]
mod tests;
