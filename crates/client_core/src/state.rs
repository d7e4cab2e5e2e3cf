use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Single-writer, multi-reader holder for a controller's state.
///
/// Writes go through the watch channel's lock, so a subscriber only ever
/// borrows a whole snapshot. Late writes into a cell nobody observes are
/// simply dropped.
pub struct StateCell<T> {
    tx: watch::Sender<T>,
}

impl<T> StateCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn stream(&self) -> WatchStream<T> {
        WatchStream::new(self.tx.subscribe())
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn transition(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Resolves with the first snapshot (current included) matching `pred`.
    pub async fn wait_for(&self, mut pred: impl FnMut(&T) -> bool) -> T {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let value = match rx.wait_for(|value| pred(value)).await {
            Ok(value) => value.clone(),
            Err(_) => self.snapshot(),
        };
        value
    }
}

impl<T> Default for StateCell<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
