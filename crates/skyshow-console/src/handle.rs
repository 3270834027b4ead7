//! Console startup and the handle used to drive it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use skyshow_core::{EngineError, GeofenceSettings, MappingManager};

use crate::config::Config;
use crate::loops::{
    geofence_loop, mapping_loop, sampler_loop, sim_feed_loop, GeofenceTrigger, MappingRequest,
};
use crate::state::ConsoleState;

const REQUEST_QUEUE: usize = 32;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("{0} worker is not running")]
    WorkerStopped(&'static str),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Running console: shared state plus the request channels of its workers.
pub struct ConsoleHandle {
    state: Arc<ConsoleState>,
    mapping_tx: mpsc::Sender<MappingRequest>,
    geofence_tx: mpsc::Sender<GeofenceTrigger>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

/// Spawn every background loop.
pub fn start(state: Arc<ConsoleState>, config: &Config) -> ConsoleHandle {
    let (shutdown_tx, _) = broadcast::channel(1);
    let (mapping_tx, mapping_rx) = mpsc::channel(REQUEST_QUEUE);
    let (geofence_tx, geofence_rx) = mpsc::channel(REQUEST_QUEUE);

    let mut tasks = vec![
        tokio::spawn(sampler_loop::run_sampler_loop(
            state.clone(),
            config.sample_interval,
            geofence_tx.clone(),
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(mapping_loop::run_mapping_loop(
            state.clone(),
            MappingManager::new(config.mapping.clone()),
            mapping_rx,
            shutdown_tx.subscribe(),
        )),
        tokio::spawn(geofence_loop::run_geofence_loop(
            state.clone(),
            geofence_rx,
            config.geofence_debounce,
            shutdown_tx.subscribe(),
        )),
    ];

    if config.simulate {
        tasks.push(tokio::spawn(sim_feed_loop::run_sim_feed_loop(
            state.clone(),
            sim_feed_loop::SimFleet {
                vehicle_count: config.sim_vehicle_count,
                spacing_m: config.sim_spacing_m,
            },
            shutdown_tx.subscribe(),
        )));
    }

    ConsoleHandle {
        state,
        mapping_tx,
        geofence_tx,
        shutdown_tx,
        tasks,
    }
}

impl ConsoleHandle {
    pub fn state(&self) -> &Arc<ConsoleState> {
        &self.state
    }

    pub async fn request_recalculate(&self) -> Result<(), ConsoleError> {
        self.send_mapping(MappingRequest::Recalculate).await
    }

    pub async fn request_augment(&self) -> Result<(), ConsoleError> {
        self.send_mapping(MappingRequest::Augment).await
    }

    pub async fn request_geofence(&self) -> Result<(), ConsoleError> {
        self.geofence_tx
            .send(GeofenceTrigger::Manual)
            .await
            .map_err(|_| ConsoleError::WorkerStopped("geofence"))
    }

    /// Validate and store new geofence settings. The sampler notices the
    /// change and schedules a recompute.
    pub fn set_geofence_settings(&self, settings: GeofenceSettings) -> Result<(), ConsoleError> {
        self.state.set_geofence_settings(settings)?;
        Ok(())
    }

    /// Signal every loop to stop and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            if let Err(err) = task.await {
                tracing::warn!("Console task ended abnormally: {}", err);
            }
        }
    }

    async fn send_mapping(&self, request: MappingRequest) -> Result<(), ConsoleError> {
        self.mapping_tx
            .send(request)
            .await
            .map_err(|_| ConsoleError::WorkerStopped("mapping"))
    }
}
