//! Violation rules evaluated against ground-truth entity state.
//!
//! Every evaluator is a pure function of the roster; none of them mutate an
//! entity or fail.

mod collision;
mod motion;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use collision::{detect_accidents, detect_animal_collisions, detect_hit_and_runs};
pub use motion::{detect_red_light, detect_speeding};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Speeding,
    RedLight,
    HitAndRun,
    Accident,
    AnimalCollision,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 5] = [
        ViolationKind::Speeding,
        ViolationKind::RedLight,
        ViolationKind::HitAndRun,
        ViolationKind::Accident,
        ViolationKind::AnimalCollision,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Speeding => "speeding",
            ViolationKind::RedLight => "red_light",
            ViolationKind::HitAndRun => "hit_and_run",
            ViolationKind::Accident => "accident",
            ViolationKind::AnimalCollision => "animal_collision",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub vehicle_id: String,
    pub kind: ViolationKind,
    pub tick: u64,
}

impl ViolationEvent {
    pub fn new(vehicle_id: impl Into<String>, kind: ViolationKind, tick: u64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            kind,
            tick,
        }
    }
}

fn default_speed_limit() -> i32 {
    10
}

fn default_stop_line_offset() -> i32 {
    30
}

/// Thresholds for the motion rules, in pixels per tick and pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_speed_limit")]
    pub speed_limit: i32,
    #[serde(default = "default_stop_line_offset")]
    pub stop_line_offset: i32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            speed_limit: default_speed_limit(),
            stop_line_offset: default_stop_line_offset(),
        }
    }
}

/// Running tally per violation kind. Every kind is present from the start and
/// counts only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts(BTreeMap<ViolationKind, u64>);

impl ViolationCounts {
    pub fn new() -> Self {
        Self(ViolationKind::ALL.iter().map(|kind| (*kind, 0)).collect())
    }

    pub(crate) fn increment(&mut self, kind: ViolationKind) {
        *self.0.entry(kind).or_insert(0) += 1;
    }

    pub fn get(&self, kind: ViolationKind) -> u64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViolationKind, u64)> + '_ {
        self.0.iter().map(|(kind, count)| (*kind, *count))
    }
}

impl Default for ViolationCounts {
    fn default() -> Self {
        Self::new()
    }
}
