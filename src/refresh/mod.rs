//! Background refresh of the source files.
//!
//! [`RefreshService`] polls the remote `Last-Modified` date, downloads and
//! extracts a new archive when it is newer than the local files, and
//! announces each outcome on a broadcast channel of [`RefreshEvent`]s.
//!
//! Only one update runs at a time per [`UpdateSlot`]. By default every
//! service shares one process-wide slot.

mod archive;
mod freshness;
mod schedule;
mod transport;
mod update;

use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{GeoIpOptions, ERROR_DELAY};
use crate::error_handling::{GeoIpError, InitializationError, UpdateError};
use crate::geoip::DatasetCounts;
use crate::initialization::init_client;

pub use archive::extract_matching;
pub use freshness::local_last_write;
pub use schedule::{decide, Decision};
pub use transport::HttpTransport;
pub use update::UpdateOutcome;

/// Capacity of the event channel; slow receivers skip the oldest events.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Mutual exclusion for updates.
pub type UpdateSlot = Arc<tokio::sync::Mutex<()>>;

static PROCESS_UPDATE_SLOT: LazyLock<UpdateSlot> =
    LazyLock::new(|| Arc::new(tokio::sync::Mutex::new(())));

/// The slot shared by every service that was not given its own.
pub fn process_update_slot() -> UpdateSlot {
    Arc::clone(&PROCESS_UPDATE_SLOT)
}

/// Notifications emitted by the refresh loop and the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// New source files were extracted.
    Updated,
    /// The store was reloaded after an update.
    Reloaded(DatasetCounts),
    /// A refresh cycle or a reload failed; the loop keeps running.
    Failed(String),
}

/// Lifecycle of the background loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Created,
    Running,
    Stopped,
}

struct LoopControl {
    state: RefreshState,
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

/// Polls, downloads and extracts source updates.
pub struct RefreshService {
    options: GeoIpOptions,
    transport: HttpTransport,
    slot: UpdateSlot,
    events: broadcast::Sender<RefreshEvent>,
    control: Mutex<LoopControl>,
}

impl RefreshService {
    /// Service using `client` for all requests and the process-wide update slot.
    pub fn new(options: GeoIpOptions, client: reqwest::Client) -> Self {
        let transport = HttpTransport::new(client, options.download_retries);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            options,
            transport,
            slot: process_update_slot(),
            events,
            control: Mutex::new(LoopControl {
                state: RefreshState::Created,
                cancel: None,
                handle: None,
            }),
        }
    }

    /// Service with its own HTTP client built from `options`.
    pub fn from_options(options: GeoIpOptions) -> Result<Self, InitializationError> {
        let client = init_client(&options)?;
        Ok(Self::new(options, client))
    }

    /// Uses `slot` instead of the process-wide one.
    pub fn with_update_slot(mut self, slot: UpdateSlot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_transport(mut self, transport: HttpTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn options(&self) -> &GeoIpOptions {
        &self.options
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: RefreshEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// `true` while an update holds the slot.
    pub fn is_updating(&self) -> bool {
        self.slot.try_lock().is_err()
    }

    pub fn state(&self) -> RefreshState {
        self.control
            .lock()
            .map(|c| c.state)
            .unwrap_or(RefreshState::Stopped)
    }

    /// Downloads, verifies and extracts the current source archive.
    ///
    /// Waits for the update slot if another update is running.
    pub async fn update_files(&self) -> Result<UpdateOutcome, UpdateError> {
        update::update_files(&self.options, &self.transport, &self.slot).await
    }

    /// Local last-write time of the first data file, if any.
    pub fn local_last_write(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>, UpdateError> {
        Ok(local_last_write(
            &self.options.data_directory,
            &self.options.effective_filters(),
        )?)
    }

    /// Runs one refresh cycle and returns the wait before the next one.
    ///
    /// Emits [`RefreshEvent::Updated`] when new files were extracted.
    pub async fn run_cycle(&self) -> Result<Duration, UpdateError> {
        let never = CancellationToken::new();
        Ok(self.cycle(&never).await?.unwrap_or(ERROR_DELAY))
    }

    /// `Ok(None)` when cancelled during the freshness check.
    async fn cycle(&self, cancel: &CancellationToken) -> Result<Option<Duration>, UpdateError> {
        self.options.validate_update()?;
        if self.is_updating() {
            info!("Another update is in progress, checking again later");
            return Ok(Some(ERROR_DELAY));
        }

        let url = self.options.resolved_download_url();
        let display_url = self.options.redacted_download_url();
        let remote = tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            remote = self.transport.last_modified(&url, &display_url) => remote?,
        };
        let local = self.local_last_write()?;

        let decision = decide(remote, local, chrono::Utc::now());
        info!(
            "Refresh check: remote {}, local {}, decision {:?}",
            remote.format("%Y-%m-%d"),
            local
                .map(|l| l.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "none".to_string()),
            decision
        );

        if decision == Decision::Update {
            // Not raced against cancellation: an extraction is never left half done.
            self.update_files().await?;
            self.emit(RefreshEvent::Updated);
        }
        Ok(Some(decision.delay()))
    }

    async fn run_loop(self: Arc<Self>, cancel: CancellationToken) {
        info!("GeoIP refresh loop started");
        while !cancel.is_cancelled() {
            let delay = match self.cycle(&cancel).await {
                Ok(Some(delay)) => delay,
                Ok(None) => break,
                Err(e) => {
                    error!("GeoIP refresh failed: {}", e);
                    self.emit(RefreshEvent::Failed(e.to_string()));
                    ERROR_DELAY
                }
            };

            debug!("Next refresh check in {}h", delay.as_secs() / 3600);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        info!("GeoIP refresh loop stopped");
    }

    /// Starts the background loop. Requires a Tokio runtime.
    ///
    /// Fails if the loop is already running or the update options are invalid.
    pub fn start(self: &Arc<Self>) -> Result<(), GeoIpError> {
        self.options.validate_update()?;

        let mut control = self
            .control
            .lock()
            .map_err(|_| GeoIpError::State("refresh control lock poisoned".to_string()))?;
        if control.state == RefreshState::Running {
            return Err(GeoIpError::State("refresh loop already running".to_string()));
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(self).run_loop(cancel.clone()));
        control.cancel = Some(cancel);
        control.handle = Some(handle);
        control.state = RefreshState::Running;
        Ok(())
    }

    /// Stops the loop and waits for it to finish.
    ///
    /// Waits are interrupted immediately; a download already in progress
    /// completes first.
    pub async fn stop(&self) {
        let (cancel, handle) = match self.control.lock() {
            Ok(mut control) => {
                if control.state == RefreshState::Running {
                    control.state = RefreshState::Stopped;
                }
                (control.cancel.take(), control.handle.take())
            }
            Err(_) => return,
        };

        if let Some(cancel) = cancel {
            cancel.cancel();
        }
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("GeoIP refresh loop ended abnormally: {}", e);
            }
        }
    }
}
