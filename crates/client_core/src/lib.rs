use std::{
    convert::Infallible,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use shared::protocol::Configuration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

pub mod config;
pub mod editor;
pub mod import;
pub mod transport;

pub use transport::{ConfigTransport, HttpTransport};

const DEFAULT_SAVE_ERROR_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ConfigurationReplaced { transducers: usize },
    Saved,
    SaveFailed(String),
    ValidationFailed(String),
}

/// What happened to a local change after it was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The server update lock was engaged; nothing was sent.
    Locked,
    Saved,
    /// A later change was sent before this one got its turn; its packet
    /// already carried this change.
    Superseded,
    /// Not sent because the configuration does not validate.
    Invalid(String),
    Failed(String),
}

struct StoreState {
    configuration: Configuration,
    server_update_lock: bool,
    /// Bumped on every local change.
    revision: u64,
}

/// Holds the configuration being edited and keeps the backend in step with it.
///
/// The server update lock starts engaged and is released only once a fetched
/// configuration has been applied, so a value just received from the server
/// is never posted back. Local changes made while the lock is clear are
/// validated and posted one at a time; an older change is never posted after
/// a newer one.
pub struct SyncStore {
    transport: Arc<dyn ConfigTransport>,
    inner: Mutex<StoreState>,
    /// Held for the duration of a POST; holds the newest revision sent.
    save_gate: Mutex<u64>,
    save_error_cooldown: Duration,
    save_error_quiet_until: Mutex<Option<Instant>>,
    events: broadcast::Sender<StoreEvent>,
}

impl SyncStore {
    pub fn new(transport: Arc<dyn ConfigTransport>) -> Arc<Self> {
        Self::with_save_error_cooldown(transport, DEFAULT_SAVE_ERROR_COOLDOWN)
    }

    pub fn with_save_error_cooldown(
        transport: Arc<dyn ConfigTransport>,
        save_error_cooldown: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            transport,
            inner: Mutex::new(StoreState {
                configuration: Configuration::default(),
                server_update_lock: true,
                revision: 0,
            }),
            save_gate: Mutex::new(0),
            save_error_cooldown,
            save_error_quiet_until: Mutex::new(None),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Configuration {
        self.inner.lock().await.configuration.clone()
    }

    pub async fn is_locked(&self) -> bool {
        self.inner.lock().await.server_update_lock
    }

    /// Fetches the server configuration and makes it the local state. On
    /// failure the lock stays engaged and local state is untouched.
    pub async fn load(&self) -> Result<()> {
        self.inner.lock().await.server_update_lock = true;

        let fetched = self.transport.fetch().await.map_err(|err| {
            error!(error = %err, "config: fetch failed; server update lock kept");
            err
        })?;

        self.apply_remote(fetched).await;
        Ok(())
    }

    /// Applies a configuration received from elsewhere without posting it.
    pub async fn replace(&self, configuration: Configuration) {
        self.inner.lock().await.server_update_lock = true;
        self.apply_remote(configuration).await;
    }

    /// Makes `configuration` the local state, saving it if the lock is clear.
    pub async fn set(&self, configuration: Configuration) -> SaveOutcome {
        match self.modify(|_| Ok::<_, Infallible>(configuration)).await {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Applies an edit to the local state and saves the result if the lock is
    /// clear. A rejected edit leaves the state untouched. A failed save does
    /// not roll the edit back.
    pub async fn modify<E>(
        &self,
        edit: impl FnOnce(&Configuration) -> Result<Configuration, E>,
    ) -> Result<SaveOutcome, E> {
        let (packet, revision) = {
            let mut guard = self.inner.lock().await;
            let next = edit(&guard.configuration)?;
            guard.configuration = next;
            guard.revision += 1;

            if guard.server_update_lock {
                return Ok(SaveOutcome::Locked);
            }

            if let Err(err) = guard.configuration.validate() {
                let reason = err.to_string();
                warn!(%reason, "config: local change not saved");
                let _ = self.events.send(StoreEvent::ValidationFailed(reason.clone()));
                return Ok(SaveOutcome::Invalid(reason));
            }

            (guard.configuration.to_packet(), guard.revision)
        };

        let mut last_sent = self.save_gate.lock().await;
        if *last_sent >= revision {
            debug!(revision, last_sent = *last_sent, "config: newer change already sent");
            return Ok(SaveOutcome::Superseded);
        }
        *last_sent = revision;

        match self.transport.save(&packet).await {
            Ok(()) => {
                info!(transducers = packet.transducers.len(), "config: saved");
                let _ = self.events.send(StoreEvent::Saved);
                Ok(SaveOutcome::Saved)
            }
            Err(err) => {
                let detail = format!("{err:#}");
                error!(error = %detail, "config: save failed");
                let message = format!("Saving Configuration Failed. ({detail})");
                self.report_save_failure(&message).await;
                Ok(SaveOutcome::Failed(message))
            }
        }
    }

    async fn apply_remote(&self, configuration: Configuration) {
        let transducers = configuration.transducers.len();
        {
            let mut guard = self.inner.lock().await;
            guard.configuration = configuration;
            guard.server_update_lock = false;
        }
        info!(transducers, "config: loaded from server");
        let _ = self
            .events
            .send(StoreEvent::ConfigurationReplaced { transducers });
    }

    /// Emits at most one failure event per cooldown window.
    async fn report_save_failure(&self, message: &str) {
        let now = Instant::now();
        {
            let mut quiet_until = self.save_error_quiet_until.lock().await;
            if quiet_until.is_some_and(|until| now < until) {
                return;
            }
            *quiet_until = Some(now + self.save_error_cooldown);
        }
        let _ = self.events.send(StoreEvent::SaveFailed(message.to_string()));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
