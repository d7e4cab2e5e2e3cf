//! Startup schema migration. Nothing else in the app is reachable until this
//! reports [`MigrationEvent::Proceed`].

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::error::{CoreResult, ErrorInfo};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{state::StateCell, MangaCore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MigrationState {
    #[default]
    NotStarted,
    Running,
    Finished,
    Failed(ErrorInfo),
}

impl MigrationState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationEvent {
    /// Sent once per controller, when migration finished.
    Proceed,
}

pub struct MigrationController {
    core: Arc<dyn MangaCore>,
    state: StateCell<MigrationState>,
    events: broadcast::Sender<MigrationEvent>,
    in_flight: AtomicBool,
    proceeded: AtomicBool,
}

impl MigrationController {
    pub fn new(core: Arc<dyn MangaCore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(4);
        Arc::new(Self {
            core,
            state: StateCell::new(MigrationState::NotStarted),
            events,
            in_flight: AtomicBool::new(false),
            proceeded: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> &StateCell<MigrationState> {
        &self.state
    }

    pub fn snapshot(&self) -> MigrationState {
        self.state.snapshot()
    }

    /// Subscribe before calling [`Self::migrate`]; the event is not replayed.
    pub fn subscribe_events(&self) -> broadcast::Receiver<MigrationEvent> {
        self.events.subscribe()
    }

    pub async fn wait_finished(&self) {
        self.state.wait_for(MigrationState::is_finished).await;
    }

    /// Runs the migration if the core has one pending. Only acts from
    /// `NotStarted`; every other state is left alone.
    pub async fn migrate(&self) {
        if !self.claim() {
            warn!("migration: already in progress");
            return;
        }

        let state = self.state.snapshot();
        if state != MigrationState::NotStarted {
            warn!(?state, "migration: migrate ignored");
            self.release();
            return;
        }

        self.drive().await;
        self.release();
    }

    /// Recovery path after a failure: wipes the database and migrates again.
    /// Only acts from `Failed`.
    pub async fn reset_and_migrate(&self) {
        if !self.claim() {
            warn!("migration: already in progress");
            return;
        }

        let cleared = self.state.transition(|s| {
            if s.error().is_none() {
                return false;
            }
            *s = MigrationState::NotStarted;
            true
        });
        if !cleared {
            warn!(state = ?self.state.snapshot(), "migration: reset ignored");
            self.release();
            return;
        }

        match self.core.reset_database().await {
            Ok(()) => {
                info!("migration: database reset");
                self.drive().await;
            }
            Err(err) => {
                error!(error = %err, "migration: database reset failed");
                self.state.update(|s| *s = MigrationState::Failed(err.into()));
            }
        }
        self.release();
    }

    pub fn spawn_migrate(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.migrate().await })
    }

    pub fn spawn_reset_and_migrate(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.reset_and_migrate().await })
    }

    async fn drive(&self) {
        match self.run().await {
            Ok(()) => self.finish(),
            Err(err) => {
                error!(error = %err, "migration: failed");
                self.state.update(|s| *s = MigrationState::Failed(err.into()));
            }
        }
    }

    async fn run(&self) -> CoreResult<()> {
        if !self.core.migration_available().await? {
            info!("migration: schema up to date");
            return Ok(());
        }

        self.state.update(|s| *s = MigrationState::Running);
        info!("migration: running");
        self.core.run_migration().await
    }

    fn finish(&self) {
        self.state.update(|s| *s = MigrationState::Finished);
        if self.proceeded.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("migration: finished");
        // No receivers just means nobody is waiting on the event.
        let _ = self.events.send(MigrationEvent::Proceed);
    }

    fn claim(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "tests/migration_tests.rs"]
mod tests;
