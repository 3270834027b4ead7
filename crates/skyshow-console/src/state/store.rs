//! In-memory console state using DashMap.
//!
//! Telemetry lands in a concurrent registry keyed by vehicle id. Everything
//! the workers consume (vehicle snapshot, slots, settings) is handed out as an
//! immutable copy, and everything they produce is written back wholesale
//! through the request sequence guard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use skyshow_core::{
    grid_positions, slots_from_targets, EngineError, GeofencePolygon, GeofenceSettings,
    LocalFrame, Mapping, MappingOutcome, MissionSlot, OrderedCollection, Position, Vehicle,
    VehicleStatus,
};

use crate::config::Config;
use crate::sequence::{CommitOutcome, RequestSequence, Ticket};

/// Telemetry report from a vehicle, in geodetic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    #[serde(default)]
    pub status: VehicleStatus,
}

/// Latest known state of a vehicle.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleRecord {
    pub vehicle_id: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub status: VehicleStatus,
    /// Arrival rank, used as display order
    pub first_seen: u64,
    pub last_seen: DateTime<Utc>,
}

impl VehicleRecord {
    fn apply(&mut self, update: &TelemetryUpdate, now: DateTime<Utc>) {
        self.lat = update.lat;
        self.lon = update.lon;
        self.altitude_m = update.altitude_m;
        self.status = update.status;
        self.last_seen = now;
    }
}

/// Takeoff and landing positions of a show, in the local frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowPlan {
    pub takeoff: Vec<Position>,
    #[serde(default)]
    pub landing: Vec<Position>,
}

impl ShowPlan {
    /// Square-ish takeoff grid centered on the origin; vehicles land where they
    /// took off.
    pub fn grid(count: usize, spacing_m: f64) -> Self {
        let takeoff = grid_positions(count, spacing_m);
        Self {
            landing: takeoff.clone(),
            takeoff,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMapping {
    pub mapping: Mapping,
    /// Ticket of the request that produced this mapping
    pub ticket: Option<Ticket>,
    pub total_cost: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum GeofenceStatus {
    Idle,
    Computing,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredGeofence {
    pub polygon: GeofencePolygon,
    /// Closed `[lat, lon]` ring
    pub geodetic: Vec<[f64; 2]>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeofenceView {
    pub status: GeofenceStatus,
    /// Last successfully computed polygon; survives later failures
    pub current: Option<StoredGeofence>,
}

/// Console state shared by every loop.
pub struct ConsoleState {
    vehicles: DashMap<String, VehicleRecord>,
    arrivals: AtomicU64,
    frame: LocalFrame,
    telemetry_timeout: Duration,
    snapshot: RwLock<Arc<OrderedCollection<Vehicle>>>,
    slots: RwLock<Arc<OrderedCollection<MissionSlot>>>,
    landing: RwLock<Arc<Vec<Position>>>,
    geofence_settings: RwLock<GeofenceSettings>,
    mapping: Mutex<StoredMapping>,
    mapping_sequence: RequestSequence,
    geofence: Mutex<GeofenceView>,
    geofence_sequence: RequestSequence,
}

impl ConsoleState {
    pub fn new(config: &Config) -> Self {
        Self {
            vehicles: DashMap::new(),
            arrivals: AtomicU64::new(0),
            frame: config.frame,
            telemetry_timeout: config.telemetry_timeout,
            snapshot: RwLock::new(Arc::new(OrderedCollection::new())),
            slots: RwLock::new(Arc::new(OrderedCollection::new())),
            landing: RwLock::new(Arc::new(Vec::new())),
            geofence_settings: RwLock::new(config.geofence.clone()),
            mapping: Mutex::new(StoredMapping {
                mapping: Mapping::empty(0),
                ticket: None,
                total_cost: None,
                updated_at: Utc::now(),
            }),
            mapping_sequence: RequestSequence::new(),
            geofence: Mutex::new(GeofenceView {
                status: GeofenceStatus::Idle,
                current: None,
            }),
            geofence_sequence: RequestSequence::new(),
        }
    }

    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    // === Live registry ===

    /// Record a telemetry report. Reports with non-finite coordinates are
    /// rejected before they reach the registry.
    pub fn update_telemetry(&self, update: TelemetryUpdate) -> Result<(), EngineError> {
        self.update_telemetry_at(update, Utc::now())
    }

    pub fn update_telemetry_at(
        &self,
        update: TelemetryUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if !(update.lat.is_finite() && update.lon.is_finite() && update.altitude_m.is_finite()) {
            return Err(EngineError::InvalidSnapshot(format!(
                "telemetry from {} has a non-finite coordinate",
                update.vehicle_id
            )));
        }

        self.vehicles
            .entry(update.vehicle_id.clone())
            .and_modify(|record| record.apply(&update, now))
            .or_insert_with(|| VehicleRecord {
                vehicle_id: update.vehicle_id.clone(),
                lat: update.lat,
                lon: update.lon,
                altitude_m: update.altitude_m,
                status: update.status,
                first_seen: self.arrivals.fetch_add(1, Ordering::SeqCst),
                last_seen: now,
            });
        Ok(())
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// All records in arrival order.
    pub fn vehicle_records(&self) -> Vec<VehicleRecord> {
        let mut records: Vec<VehicleRecord> =
            self.vehicles.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|record| record.first_seen);
        records
    }

    /// Copy the registry into a vehicle snapshot in the local frame.
    ///
    /// Vehicles silent for longer than the telemetry timeout are reported as
    /// lost regardless of their last status.
    pub fn build_snapshot(&self, now: DateTime<Utc>) -> OrderedCollection<Vehicle> {
        let mut snapshot = OrderedCollection::new();
        for record in self.vehicle_records() {
            let silent = now
                .signed_duration_since(record.last_seen)
                .to_std()
                .map(|age| age > self.telemetry_timeout)
                .unwrap_or(false);
            let status = if silent {
                VehicleStatus::Lost
            } else {
                record.status
            };
            let position = self.frame.to_local(record.lat, record.lon, record.altitude_m);
            snapshot.insert_at_end(Vehicle::new(record.vehicle_id, position).with_status(status));
        }
        snapshot
    }

    pub fn publish_snapshot(&self, snapshot: Arc<OrderedCollection<Vehicle>>) {
        *write(&self.snapshot) = snapshot;
    }

    /// Latest published vehicle snapshot.
    pub fn snapshot(&self) -> Arc<OrderedCollection<Vehicle>> {
        read(&self.snapshot).clone()
    }

    // === Show plan ===

    /// Replace the show. The stored mapping is reset to the new slot count and
    /// any computation still running against the old show is invalidated.
    pub fn set_show(&self, plan: ShowPlan) -> Result<(), EngineError> {
        if let Some(bad) = plan.takeoff.iter().chain(&plan.landing).find(|p| !p.is_finite()) {
            return Err(EngineError::InvalidSnapshot(format!(
                "show position {:?} has a non-finite coordinate",
                bad
            )));
        }
        let slots = OrderedCollection::from_items(slots_from_targets(&plan.takeoff))?;
        let slot_count = slots.len();

        // Held across the swap so no commit can pair old slots with the new mapping.
        let mut stored = lock(&self.mapping);
        *write(&self.slots) = Arc::new(slots);
        *write(&self.landing) = Arc::new(plan.landing);
        let ticket = self.mapping_sequence.next();
        *stored = StoredMapping {
            mapping: Mapping::empty(slot_count),
            ticket: Some(ticket),
            total_cost: None,
            updated_at: Utc::now(),
        };
        tracing::info!("Show loaded with {} slots", slot_count);
        Ok(())
    }

    pub fn slots(&self) -> Arc<OrderedCollection<MissionSlot>> {
        read(&self.slots).clone()
    }

    /// Pin a vehicle to a slot, or unpin the slot with `None`.
    pub fn pin_slot(&self, index: usize, vehicle_id: Option<String>) -> Result<(), EngineError> {
        let mut guard = write(&self.slots);
        let mut slots = OrderedCollection::clone(&guard);
        let len = slots.len();

        if let Some(id) = vehicle_id.as_deref() {
            if let Some(other) = slots
                .iter()
                .find(|slot| slot.index != index && slot.pinned.as_deref() == Some(id))
            {
                return Err(EngineError::InvalidSnapshot(format!(
                    "vehicle {} is already pinned to slot {}",
                    id, other.index
                )));
            }
        }
        let slot = slots
            .get_mut(&index)
            .ok_or(EngineError::SlotOutOfRange { index, len })?;
        slot.pinned = vehicle_id;
        *guard = Arc::new(slots);
        Ok(())
    }

    /// Points the geofence has to enclose.
    pub fn boundary_points(&self) -> Vec<Position> {
        let slots = self.slots();
        let landing = read(&self.landing).clone();
        slots
            .iter()
            .filter_map(|slot| slot.target)
            .chain(landing.iter().copied())
            .collect()
    }

    // === Mapping ===

    pub fn mapping(&self) -> StoredMapping {
        lock(&self.mapping).clone()
    }

    pub fn begin_mapping_request(&self) -> Ticket {
        self.mapping_sequence.next()
    }

    /// Store a computed mapping if no newer request was issued meanwhile.
    pub fn commit_mapping(&self, ticket: Ticket, outcome: MappingOutcome) -> CommitOutcome {
        let mut stored = lock(&self.mapping);
        let newer_stored = stored.ticket.map(|t| t >= ticket).unwrap_or(false);
        if !self.mapping_sequence.is_current(ticket)
            || newer_stored
            || outcome.mapping.len() != stored.mapping.len()
        {
            return CommitOutcome::Stale;
        }
        *stored = StoredMapping {
            mapping: outcome.mapping,
            ticket: Some(ticket),
            total_cost: Some(outcome.total_cost),
            updated_at: Utc::now(),
        };
        CommitOutcome::Committed
    }

    /// Apply an operator edit to the stored mapping.
    ///
    /// The edit runs on a copy and is stored only if it succeeds. It counts
    /// as the newest request, so computations still in flight are dropped.
    pub fn edit_mapping<R, F>(&self, edit: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut Mapping) -> Result<R, EngineError>,
    {
        let mut stored = lock(&self.mapping);
        let mut mapping = stored.mapping.clone();
        let result = edit(&mut mapping)?;
        if mapping.len() != stored.mapping.len() {
            return Err(EngineError::InvalidMappingLength {
                expected: stored.mapping.len(),
                actual: mapping.len(),
            });
        }
        *stored = StoredMapping {
            mapping,
            ticket: Some(self.mapping_sequence.next()),
            total_cost: None,
            updated_at: Utc::now(),
        };
        Ok(result)
    }

    // === Geofence ===

    pub fn geofence(&self) -> GeofenceView {
        lock(&self.geofence).clone()
    }

    pub fn geofence_settings(&self) -> GeofenceSettings {
        read(&self.geofence_settings).clone()
    }

    /// Replace the geofence settings. Invalid settings are rejected and the
    /// previous ones stay in effect.
    pub fn set_geofence_settings(&self, settings: GeofenceSettings) -> Result<(), EngineError> {
        settings.validate()?;
        *write(&self.geofence_settings) = settings;
        Ok(())
    }

    pub fn begin_geofence_request(&self) -> Ticket {
        let ticket = self.geofence_sequence.next();
        lock(&self.geofence).status = GeofenceStatus::Computing;
        ticket
    }

    /// Store the outcome of a geofence computation if no newer request was
    /// issued meanwhile. A failure keeps the previous polygon.
    pub fn commit_geofence(
        &self,
        ticket: Ticket,
        result: Result<GeofencePolygon, String>,
    ) -> CommitOutcome {
        let mut view = lock(&self.geofence);
        if !self.geofence_sequence.is_current(ticket) {
            return CommitOutcome::Stale;
        }
        match result {
            Ok(polygon) => {
                let geodetic = polygon.to_geodetic(&self.frame);
                view.current = Some(StoredGeofence {
                    polygon,
                    geodetic,
                    computed_at: Utc::now(),
                });
                view.status = GeofenceStatus::Ready;
            }
            Err(message) => view.status = GeofenceStatus::Error(message),
        }
        CommitOutcome::Committed
    }

    /// Drop the geofence when there is nothing to enclose.
    pub fn clear_geofence(&self) {
        let _ = self.geofence_sequence.next();
        let mut view = lock(&self.geofence);
        view.status = GeofenceStatus::Idle;
        view.current = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
