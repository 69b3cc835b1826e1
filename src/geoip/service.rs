//! Store plus refresh loop, wired together.

use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::{GeoDataStore, LoadSummary, LookupResult};
use crate::config::GeoIpOptions;
use crate::error_handling::{AddressError, GeoIpError, InitializationError};
use crate::models::{
    BlockRow, CityBlock, CityLocation, CountryBlock, CountryLocation, EnterpriseBlock, IspRecord,
    NoIsp, TableRow,
};
use crate::refresh::{RefreshEvent, RefreshService, UpdateOutcome};

/// GeoIP service for the country CSV edition.
pub type CountryGeoIp = GeoIpService<CountryBlock, CountryLocation, NoIsp>;
/// GeoIP service for the city CSV edition.
pub type CityGeoIp = GeoIpService<CityBlock, CityLocation, NoIsp>;
/// GeoIP service for the enterprise CSV edition.
pub type EnterpriseGeoIp = GeoIpService<EnterpriseBlock, CityLocation, IspRecord>;

struct ReloadTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns a [`GeoDataStore`] and the [`RefreshService`] that keeps it current.
///
/// With `auto_update`, every [`RefreshEvent::Updated`] triggers a reload on
/// a dedicated task, followed by [`RefreshEvent::Reloaded`] or
/// [`RefreshEvent::Failed`].
///
/// # Examples
///
/// ```no_run
/// use geoip_csv::{CityGeoIp, GeoIpOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = CityGeoIp::new(GeoIpOptions::default())?;
/// service.start().await?;
/// if let Some(result) = service.lookup("203.0.113.7")? {
///     println!("{:?}", result.location.and_then(|l| l.city_name));
/// }
/// service.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct GeoIpService<B, L, I> {
    options: GeoIpOptions,
    store: Arc<GeoDataStore<B, L, I>>,
    refresh: Arc<RefreshService>,
    reload: Mutex<Option<ReloadTask>>,
}

impl<B: BlockRow, L: TableRow, I: TableRow> GeoIpService<B, L, I> {
    /// Builds the store and a refresh service with its own HTTP client.
    pub fn new(options: GeoIpOptions) -> Result<Self, InitializationError> {
        let refresh = RefreshService::from_options(options.clone())?;
        Ok(Self::with_refresh(refresh))
    }

    /// Uses an existing refresh service and its options.
    pub fn with_refresh(refresh: RefreshService) -> Self {
        let options = refresh.options().clone();
        Self {
            store: Arc::new(GeoDataStore::from_options(&options)),
            options,
            refresh: Arc::new(refresh),
            reload: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &GeoIpOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<GeoDataStore<B, L, I>> {
        &self.store
    }

    pub fn refresh(&self) -> &Arc<RefreshService> {
        &self.refresh
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.refresh.subscribe()
    }

    pub fn has_data(&self) -> bool {
        self.store.has_data()
    }

    pub fn is_updating(&self) -> bool {
        self.refresh.is_updating()
    }

    pub fn lookup(&self, address: &str) -> Result<Option<LookupResult<B, L, I>>, AddressError> {
        self.store.lookup(address)
    }

    /// Applies `auto_update` and `auto_load`.
    ///
    /// With `auto_update` the refresh loop and the reload task are started
    /// first. With `auto_load` the dataset is then loaded unless it already
    /// has data, or auto-update is on and an update is running or no local
    /// file exists yet (that update's reload will load it).
    pub async fn start(&self) -> Result<(), GeoIpError> {
        if self.options.auto_update {
            let events = self.refresh.subscribe();
            self.refresh.start()?;
            self.spawn_reload_task(events)?;
        }

        if !self.options.auto_load || self.store.has_data() {
            return Ok(());
        }
        if self.options.auto_update
            && (self.refresh.is_updating() || self.refresh.local_last_write()?.is_none())
        {
            info!("Deferring GeoIP load until the pending update completes");
            return Ok(());
        }
        self.load().await?;
        Ok(())
    }

    fn spawn_reload_task(&self, events: broadcast::Receiver<RefreshEvent>) -> Result<(), GeoIpError> {
        let mut reload = self
            .reload
            .lock()
            .map_err(|_| GeoIpError::State("reload task lock poisoned".to_string()))?;
        if reload.is_some() {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(reload_on_update(
            Arc::clone(&self.store),
            self.options.clone(),
            Arc::clone(&self.refresh),
            events,
            cancel.clone(),
        ));
        *reload = Some(ReloadTask { cancel, handle });
        Ok(())
    }

    /// Loads the dataset on the blocking pool.
    pub async fn load(&self) -> Result<LoadSummary, GeoIpError> {
        load_blocking(Arc::clone(&self.store), &self.options).await
    }

    /// Runs one update now. Does not reload the store.
    pub async fn update_files(&self) -> Result<UpdateOutcome, GeoIpError> {
        self.options.validate_update()?;
        Ok(self.refresh.update_files().await?)
    }

    /// Stops the refresh loop and the reload task.
    pub async fn stop(&self) {
        self.refresh.stop().await;

        let task = match self.reload.lock() {
            Ok(mut reload) => reload.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(e) = task.handle.await {
                error!("GeoIP reload task ended abnormally: {}", e);
            }
        }
    }
}

async fn load_blocking<B: BlockRow, L: TableRow, I: TableRow>(
    store: Arc<GeoDataStore<B, L, I>>,
    options: &GeoIpOptions,
) -> Result<LoadSummary, GeoIpError> {
    let data_dir = options.data_directory.clone();
    let filters = options.effective_filters();
    let summary = tokio::task::spawn_blocking(move || store.load(&data_dir, &filters))
        .await
        .map_err(|e| GeoIpError::Task(e.to_string()))??;
    Ok(summary)
}

async fn reload_on_update<B: BlockRow, L: TableRow, I: TableRow>(
    store: Arc<GeoDataStore<B, L, I>>,
    options: GeoIpOptions,
    refresh: Arc<RefreshService>,
    mut events: broadcast::Receiver<RefreshEvent>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(RefreshEvent::Updated) => match load_blocking(Arc::clone(&store), &options).await {
                Ok(summary) => refresh.emit(RefreshEvent::Reloaded(summary.counts)),
                Err(e) => {
                    error!("GeoIP reload after update failed: {}", e);
                    refresh.emit(RefreshEvent::Failed(e.to_string()));
                }
            },
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("GeoIP reload task missed {} refresh events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}
