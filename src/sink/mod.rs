//! Violation sinks: where detected events leave the simulation.
//!
//! The engine hands every [`ViolationEvent`] to a [`ViolationSink`] together
//! with the frame it was detected in. Sinks resolve the owner and fine through
//! a [`Ledger`] and persist whatever artifacts they are responsible for.

mod files;
mod payment;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{ViolationEvent, ViolationKind};
use crate::world::FrameSnapshot;

pub use files::{ArtifactPaths, FileSink};
pub use payment::{payment_code_image, write_payment_code, PaymentCodeError};

pub const DEFAULT_PAYMENT_PORTAL: &str = "http://traffic-pay-portal.com/pay";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const LOG_SEPARATOR_WIDTH: usize = 50;

pub trait ViolationSink: Send {
    fn name(&self) -> &str;
    fn record(&mut self, event: &ViolationEvent, frame: &FrameSnapshot) -> Result<(), SinkError>;
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to prepare artifact directory {path}: {source}")]
    Setup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} artifact(s) failed: {}", .0.len(), join_failures(.0))]
    Artifacts(Vec<ArtifactError>),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("violation log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("frame image {path}: {source}")]
    Frame {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("payment code {path}: {source}")]
    PaymentCode {
        path: PathBuf,
        #[source]
        source: PaymentCodeError,
    },
}

fn join_failures(failures: &[ArtifactError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub owner_name: String,
    pub vehicle_number: String,
}

impl Owner {
    pub fn unknown() -> Self {
        Self {
            owner_name: "Unknown".to_string(),
            vehicle_number: "NA".to_string(),
        }
    }
}

pub type VehicleRegistry = BTreeMap<String, Owner>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FineTable(BTreeMap<ViolationKind, u64>);

impl FineTable {
    pub fn new(fines: BTreeMap<ViolationKind, u64>) -> Self {
        Self(fines)
    }

    /// Kinds without an entry carry no fine.
    pub fn fine(&self, kind: ViolationKind) -> u64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }
}

impl Default for FineTable {
    fn default() -> Self {
        Self(BTreeMap::from([
            (ViolationKind::Speeding, 350),
            (ViolationKind::RedLight, 450),
            (ViolationKind::HitAndRun, 1000),
            (ViolationKind::Accident, 1000),
            (ViolationKind::AnimalCollision, 700),
        ]))
    }
}

/// One fully resolved violation, as written to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub timestamp: String,
    pub vehicle_id: String,
    pub owner_name: String,
    pub vehicle_number: String,
    pub violation_type: ViolationKind,
    pub tick_id: u64,
    pub fine_amount: u64,
}

impl ViolationRecord {
    pub fn log_entry(&self) -> String {
        format!(
            "Timestamp: {}\n\
             Vehicle ID: {}\n\
             Owner: {}\n\
             Vehicle Number: {}\n\
             Violation: {}\n\
             Tick: {}\n\
             Fine: {}\n\
             \n\
             {}\n",
            self.timestamp,
            self.vehicle_id,
            self.owner_name,
            self.vehicle_number,
            self.violation_type,
            self.tick_id,
            self.fine_amount,
            "-".repeat(LOG_SEPARATOR_WIDTH),
        )
    }

    /// `{vehicle_id}_{violation_type}_{timestamp}`, shared by the frame and
    /// payment artifacts.
    pub fn artifact_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.vehicle_id, self.violation_type, self.timestamp
        )
    }

    pub fn payment_url(&self, base: &str) -> String {
        format!(
            "{base}?veh={}&fine={}&type={}&time={}",
            self.vehicle_number, self.fine_amount, self.violation_type, self.timestamp
        )
    }
}

/// Static lookups a sink needs to turn an event into a record.
#[derive(Debug, Clone)]
pub struct Ledger {
    registry: VehicleRegistry,
    fines: FineTable,
    payment_portal: String,
}

impl Ledger {
    pub fn new(registry: VehicleRegistry, fines: FineTable) -> Self {
        Self {
            registry,
            fines,
            payment_portal: DEFAULT_PAYMENT_PORTAL.to_string(),
        }
    }

    pub fn with_payment_portal(mut self, base: impl Into<String>) -> Self {
        self.payment_portal = base.into();
        self
    }

    pub fn payment_portal(&self) -> &str {
        &self.payment_portal
    }

    pub fn owner(&self, vehicle_id: &str) -> Owner {
        self.registry
            .get(vehicle_id)
            .cloned()
            .unwrap_or_else(Owner::unknown)
    }

    pub fn fine(&self, kind: ViolationKind) -> u64 {
        self.fines.fine(kind)
    }

    pub fn record(&self, event: &ViolationEvent) -> ViolationRecord {
        self.record_at(event, Local::now())
    }

    pub fn record_at(&self, event: &ViolationEvent, at: DateTime<Local>) -> ViolationRecord {
        let owner = self.owner(&event.vehicle_id);
        ViolationRecord {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            vehicle_id: event.vehicle_id.clone(),
            owner_name: owner.owner_name,
            vehicle_number: owner.vehicle_number,
            violation_type: event.kind,
            tick_id: event.tick,
            fine_amount: self.fine(event.kind),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(VehicleRegistry::new(), FineTable::default())
    }
}

/// Keeps resolved records in memory. Clones share the same buffer, so a
/// caller can keep one handle while the engine owns another.
#[derive(Clone)]
pub struct MemorySink {
    ledger: Ledger,
    records: Arc<Mutex<Vec<ViolationRecord>>>,
}

impl MemorySink {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<ViolationRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn total_fines(&self) -> u64 {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|record| record.fine_amount)
            .sum()
    }
}

impl ViolationSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn record(&mut self, event: &ViolationEvent, _frame: &FrameSnapshot) -> Result<(), SinkError> {
        let record = self.ledger.record(event);
        tracing::info!(
            vehicle = %record.vehicle_id,
            violation = %record.violation_type,
            tick = record.tick_id,
            fine = record.fine_amount,
            "violation recorded"
        );
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl ViolationSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn record(&mut self, _event: &ViolationEvent, _frame: &FrameSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ledger() -> Ledger {
        let registry = VehicleRegistry::from([(
            "car_1".to_string(),
            Owner {
                owner_name: "John Doe".to_string(),
                vehicle_number: "ABC123".to_string(),
            },
        )]);
        Ledger::new(registry, FineTable::default())
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn record_resolves_owner_and_fine() {
        let event = ViolationEvent::new("car_1", ViolationKind::RedLight, 150);
        let record = ledger().record_at(&event, fixed_time());
        assert_eq!(record.timestamp, "2024-03-09_14-05-07");
        assert_eq!(record.owner_name, "John Doe");
        assert_eq!(record.vehicle_number, "ABC123");
        assert_eq!(record.fine_amount, 450);
        assert_eq!(record.tick_id, 150);
    }

    #[test]
    fn unknown_vehicle_falls_back_to_sentinel_owner() {
        let event = ViolationEvent::new("car_99", ViolationKind::Speeding, 1);
        let record = ledger().record_at(&event, fixed_time());
        assert_eq!(record.owner_name, "Unknown");
        assert_eq!(record.vehicle_number, "NA");
        assert_eq!(record.fine_amount, 350);
    }

    #[test]
    fn missing_fine_is_zero() {
        let fines = FineTable::new(BTreeMap::from([(ViolationKind::Speeding, 350)]));
        let ledger = Ledger::new(VehicleRegistry::new(), fines);
        assert_eq!(ledger.fine(ViolationKind::Accident), 0);
        assert_eq!(ledger.fine(ViolationKind::Speeding), 350);
    }

    #[test]
    fn log_entry_layout() {
        let event = ViolationEvent::new("car_1", ViolationKind::Accident, 12);
        let entry = ledger().record_at(&event, fixed_time()).log_entry();
        let lines: Vec<&str> = entry.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Timestamp: 2024-03-09_14-05-07",
                "Vehicle ID: car_1",
                "Owner: John Doe",
                "Vehicle Number: ABC123",
                "Violation: accident",
                "Tick: 12",
                "Fine: 1000",
                "",
                "--------------------------------------------------",
            ]
        );
        assert!(entry.ends_with("Fine: 1000\n\n--------------------------------------------------\n"));
    }

    #[test]
    fn artifact_names_and_payment_url() {
        let event = ViolationEvent::new("car_1", ViolationKind::Speeding, 3);
        let record = ledger().record_at(&event, fixed_time());
        assert_eq!(record.artifact_stem(), "car_1_speeding_2024-03-09_14-05-07");
        assert_eq!(
            record.payment_url(DEFAULT_PAYMENT_PORTAL),
            "http://traffic-pay-portal.com/pay?veh=ABC123&fine=350&type=speeding&time=2024-03-09_14-05-07"
        );
    }

    #[test]
    fn memory_sink_clones_share_records() {
        let sink = MemorySink::new(ledger());
        let mut engine_side = sink.clone();
        let frame = crate::world::World::new(
            crate::world::Scene::default(),
            crate::components::TrafficLight::new(900, 220, 150).unwrap(),
        )
        .snapshot(1);
        engine_side
            .record(&ViolationEvent::new("car_1", ViolationKind::Speeding, 1), &frame)
            .unwrap();
        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.total_fines(), 350);
    }
}
