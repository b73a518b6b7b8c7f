// ── Gateway ──
//
// Full lifecycle management for a printer fleet: registry, route table,
// status channel, pollers and the status consumer. Add, update and delete
// are serialized so route publication always follows registry order.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use printfleet_api::{CameraProber, MoonrakerClient, TransportConfig};

use crate::config::GatewaySettings;
use crate::consumer::status_consumer_task;
use crate::discovery::CameraDiscovery;
use crate::error::CoreError;
use crate::model::{CameraConfig, DeviceConfig, DeviceId, DeviceRecord};
use crate::persistence::ConfigPersistence;
use crate::poller::{StatusUpdate, poll_task};
use crate::routing::{DeviceRoutes, RouteTable, merge_cameras};
use crate::store::{PollHandle, Registry};

/// The main entry point for the HTTP surface.
///
/// Cheaply cloneable via `Arc<GatewayInner>`.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    settings: GatewaySettings,
    transport: TransportConfig,
    registry: Arc<Registry>,
    routes: RouteTable,
    discovery: CameraDiscovery,
    persistence: Arc<dyn ConfigPersistence>,
    status_tx: mpsc::UnboundedSender<StatusUpdate>,
    /// Taken exactly once by `start`, so there is only ever one consumer.
    status_rx: Mutex<Option<mpsc::UnboundedReceiver<StatusUpdate>>>,
    cancel: CancellationToken,
    mutations: Mutex<()>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Gateway {
    pub fn new(
        settings: GatewaySettings,
        persistence: Arc<dyn ConfigPersistence>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(settings.request_timeout);
        let discovery = CameraDiscovery::new(
            CameraProber::new(&transport)?,
            settings.discovery.clone(),
        );
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(GatewayInner {
                settings,
                transport,
                registry: Arc::new(Registry::new()),
                routes: RouteTable::new(),
                discovery,
                persistence,
                status_tx,
                status_rx: Mutex::new(Some(status_rx)),
                cancel: CancellationToken::new(),
                mutations: Mutex::new(()),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.inner.settings
    }

    /// Version counter bumped on every registry change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.registry.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the status consumer and register the initial printers.
    ///
    /// Invalid or duplicate entries are logged and skipped; nothing is
    /// persisted.
    pub async fn start(&self, devices: Vec<DeviceConfig>) -> Result<(), CoreError> {
        let Some(rx) = self.inner.status_rx.lock().await.take() else {
            return Err(CoreError::Internal("gateway already started".into()));
        };
        let consumer = tokio::spawn(status_consumer_task(
            Arc::clone(&self.inner.registry),
            rx,
            self.inner.cancel.child_token(),
        ));
        self.track(consumer).await;

        let _guard = self.inner.mutations.lock().await;
        let results = join_all(devices.into_iter().map(|config| async move {
            let endpoint = format!("{}:{}", config.host, config.port);
            (endpoint, self.register(config).await)
        }))
        .await;
        for (endpoint, result) in results {
            if let Err(e) = result {
                warn!(printer = %endpoint, error = %e, "skipping configured printer");
            }
        }

        info!(printers = self.inner.registry.len().await, "gateway started");
        Ok(())
    }

    /// Cancel every poller and the consumer, then wait for them.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<JoinHandle<()>> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }
        info!("gateway stopped");
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn add_device(&self, config: DeviceConfig) -> Result<DeviceRecord, CoreError> {
        let _guard = self.inner.mutations.lock().await;
        let record = self.register(config).await?;
        self.persist().await;
        Ok(record)
    }

    /// Replace a printer's name, preferred UI and cameras, then rebuild its routes.
    pub async fn update_device(&self, config: DeviceConfig) -> Result<DeviceRecord, CoreError> {
        config.validate()?;
        let config = config.normalized();
        let id = config.id();

        let _guard = self.inner.mutations.lock().await;
        if !self.inner.registry.contains(&id).await {
            return Err(CoreError::DeviceNotFound { id: id.to_string() });
        }
        if !self.inner.routes.contains(&id) {
            return Err(CoreError::RoutesNotFound { id: id.to_string() });
        }

        let client = MoonrakerClient::new(&config.host, config.port, &self.inner.transport)?;
        let routes = self.build_routes(&config, &client).await?;
        let record = self.inner.registry.update(config).await?;
        self.inner.routes.publish(routes);
        info!(device_id = %id, "printer updated");

        self.persist().await;
        Ok(record)
    }

    /// Delete a printer. Its poller stops on its next tick; its routes go now.
    pub async fn remove_device(&self, id: &DeviceId) -> Result<DeviceRecord, CoreError> {
        let _guard = self.inner.mutations.lock().await;
        let record = self.inner.registry.remove(id).await?;
        self.inner.routes.remove(id);
        info!(device_id = %id, "printer removed");

        self.persist().await;
        Ok(record)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All printers, sorted by id descending.
    pub async fn list_devices(&self) -> Vec<DeviceRecord> {
        self.inner.registry.list().await
    }

    pub async fn get_device(&self, id: &DeviceId) -> Option<DeviceRecord> {
        self.inner.registry.get(id).await
    }

    pub async fn poll_handle(&self, id: &DeviceId) -> PollHandle {
        self.inner.registry.poll_handle(id).await
    }

    /// Published routes for a printer. Cheap: clones an `Arc`.
    pub fn routes(&self, id: &DeviceId) -> Option<Arc<DeviceRoutes>> {
        self.inner.routes.get(id)
    }

    /// Cameras currently routed for a printer.
    pub fn device_cameras(&self, id: &DeviceId) -> Option<Vec<CameraConfig>> {
        self.inner.routes.get(id).map(|routes| routes.cameras())
    }

    /// Probe `host` for cameras without registering anything.
    pub async fn discover_cameras(
        &self,
        host: &str,
        port: u16,
    ) -> Result<Vec<CameraConfig>, CoreError> {
        DeviceConfig::new("", host, port).validate()?;
        debug!(host, port, "running camera discovery");
        Ok(self.inner.discovery.discover(host).await)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Validate, build routes, register, publish and start polling.
    /// Callers hold the mutation lock.
    async fn register(&self, config: DeviceConfig) -> Result<DeviceRecord, CoreError> {
        config.validate()?;
        let config = config.normalized();
        let id = config.id();
        if self.inner.registry.contains(&id).await {
            return Err(CoreError::AlreadyExists { id: id.to_string() });
        }

        let client = MoonrakerClient::new(&config.host, config.port, &self.inner.transport)?;
        let routes = self.build_routes(&config, &client).await?;

        let token = self.inner.cancel.child_token();
        let record = self.inner.registry.add(config, token.clone()).await?;
        self.inner.routes.publish(routes);

        let poller = tokio::spawn(poll_task(
            record.id.clone(),
            client,
            self.inner.settings.poll_interval,
            self.inner.settings.failure_threshold,
            self.inner.status_tx.clone(),
            token,
        ));
        self.track(poller).await;

        info!(
            device_id = %record.id,
            name = %record.config.name,
            cameras = self.inner.routes.get(&record.id).map_or(0, |r| r.cameras().len()),
            "printer registered"
        );
        Ok(record)
    }

    async fn build_routes(
        &self,
        config: &DeviceConfig,
        client: &MoonrakerClient,
    ) -> Result<DeviceRoutes, CoreError> {
        let (reported, discovered) = tokio::join!(
            client.list_webcams(),
            self.inner.discovery.discover(&config.host),
        );
        let reported = reported.unwrap_or_else(|e| {
            debug!(host = %config.host, error = %e, "webcam list unavailable");
            Vec::new()
        });

        let cameras = merge_cameras(&config.cameras, discovered, &reported);
        DeviceRoutes::build(config, cameras, &self.inner.settings.ui_backends)
    }

    async fn persist(&self) {
        let devices = self.inner.registry.configs().await;
        let persistence = Arc::clone(&self.inner.persistence);
        match tokio::task::spawn_blocking(move || persistence.save_devices(&devices)).await {
            Ok(Ok(())) => debug!("printer list persisted"),
            Ok(Err(e)) => warn!(error = %e, "failed to persist printer list"),
            Err(e) => warn!(error = %e, "persistence task failed"),
        }
    }

    async fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}
