use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    engine::RunSummary,
    rules::{ViolationCounts, ViolationKind},
    sink::Ledger,
};

#[derive(Debug, Clone, Serialize)]
pub struct KindTotal {
    pub violation_type: ViolationKind,
    pub count: u64,
    pub fines: u64,
}

/// End-of-run digest: counts per kind and the fines they add up to.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub ticks: u64,
    pub total_violations: u64,
    pub total_fines: u64,
    pub sink_failures: u64,
    pub by_kind: Vec<KindTotal>,
}

impl RunReport {
    pub fn new(summary: &RunSummary, ledger: &Ledger) -> Self {
        let by_kind = tally(&summary.counts, ledger);
        Self {
            scenario: summary.scenario.clone(),
            ticks: summary.ticks,
            total_violations: summary.counts.total(),
            total_fines: by_kind.iter().map(|kind| kind.fines).sum(),
            sink_failures: summary.sink_failures,
            by_kind,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create summary directory {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write run summary {}", path.display()))?;
        Ok(())
    }
}

fn tally(counts: &ViolationCounts, ledger: &Ledger) -> Vec<KindTotal> {
    counts
        .iter()
        .map(|(kind, count)| KindTotal {
            violation_type: kind,
            count,
            fines: count * ledger.fine(kind),
        })
        .collect()
}
