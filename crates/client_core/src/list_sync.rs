//! Cache-then-network synchronization shared by the library, chapter and
//! search lists.

use futures::future::BoxFuture;
use shared::error::{CoreResult, ErrorInfo};
use tracing::{debug, warn};

use crate::state::StateCell;

#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub loading: bool,
    pub items: Vec<T>,
    pub error: Option<ErrorInfo>,
}

impl<T> ListState<T> {
    pub fn pending() -> Self {
        Self {
            loading: true,
            items: Vec::new(),
            error: None,
        }
    }

    /// Settled with nothing to show; the "no entries yet" case.
    pub fn is_settled_empty(&self) -> bool {
        !self.loading && self.items.is_empty()
    }
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            items: Vec::new(),
            error: None,
        }
    }
}

/// Drives one [`ListState`] through a load. Items are only ever replaced
/// wholesale by a successful phase; failures keep the last good items.
pub struct ListSync<T> {
    area: &'static str,
    state: StateCell<ListState<T>>,
}

impl<T> ListSync<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(area: &'static str, initial: ListState<T>) -> Self {
        Self {
            area,
            state: StateCell::new(initial),
        }
    }

    pub fn state(&self) -> &StateCell<ListState<T>> {
        &self.state
    }

    pub fn snapshot(&self) -> ListState<T> {
        self.state.snapshot()
    }

    pub fn begin(&self) {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    pub fn fail(&self, error: impl Into<ErrorInfo>) {
        let error = error.into();
        warn!(area = self.area, error = %error, "list: load failed");
        self.state.update(|s| {
            s.loading = false;
            s.error = Some(error);
        });
    }

    pub fn settle(&self) {
        self.state.update(|s| s.loading = false);
    }

    /// Runs the optional cache phase and then the authoritative fetch, one
    /// after the other. The fetch future is not polled before the cache
    /// result is published, so a cache result can never land after the
    /// authoritative one. Returns whether both phases succeeded.
    pub async fn sync(
        &self,
        cache: Option<BoxFuture<'_, CoreResult<Vec<T>>>>,
        fetch: BoxFuture<'_, CoreResult<Vec<T>>>,
    ) -> bool {
        self.sync_reporting(cache, fetch, None).await
    }

    /// Like [`Self::sync`], but a successful fetch settles with `carried` as
    /// the error, in the same write that publishes the items.
    pub async fn sync_reporting(
        &self,
        cache: Option<BoxFuture<'_, CoreResult<Vec<T>>>>,
        fetch: BoxFuture<'_, CoreResult<Vec<T>>>,
        carried: Option<ErrorInfo>,
    ) -> bool {
        self.begin();

        if let Some(cache) = cache {
            match cache.await {
                Ok(items) => {
                    debug!(area = self.area, items = items.len(), "list: cached items published");
                    self.state.update(|s| s.items = items);
                }
                Err(err) => {
                    self.fail(err);
                    return false;
                }
            }
        }

        match fetch.await {
            Ok(items) => {
                debug!(area = self.area, items = items.len(), "list: fetched items published");
                self.state.update(|s| {
                    s.items = items;
                    s.loading = false;
                    s.error = carried;
                });
                true
            }
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/list_sync_tests.rs"]
mod tests;
