use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{write_payment_code, ArtifactError, Ledger, SinkError, ViolationRecord, ViolationSink};
use crate::render::rasterize;
use crate::rules::ViolationEvent;
use crate::world::FrameSnapshot;

/// Where the log, frame images and payment codes are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub log_file: PathBuf,
    pub frame_dir: PathBuf,
    pub qr_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            log_file: root.join("violations.log"),
            frame_dir: root.join("frames"),
            qr_dir: root.join("payment_codes"),
        }
    }
}

/// Writes a log entry, a frame image and a payment QR code per violation.
pub struct FileSink {
    ledger: Ledger,
    paths: ArtifactPaths,
}

impl FileSink {
    pub fn new(ledger: Ledger, paths: ArtifactPaths) -> Result<Self, SinkError> {
        let mut dirs = vec![paths.frame_dir.clone(), paths.qr_dir.clone()];
        if let Some(parent) = paths.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.push(parent.to_path_buf());
            }
        }
        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|source| SinkError::Setup { path: dir, source })?;
        }
        Ok(Self { ledger, paths })
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    fn append_log(&self, record: &ViolationRecord) -> Result<(), ArtifactError> {
        let path = &self.paths.log_file;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(record.log_entry().as_bytes()))
            .map_err(|source| ArtifactError::Log {
                path: path.clone(),
                source,
            })
    }

    fn save_frame(&self, stem: &str, frame: &FrameSnapshot) -> Result<PathBuf, ArtifactError> {
        let path = self.paths.frame_dir.join(format!("{stem}.jpg"));
        rasterize(frame)
            .save(&path)
            .map_err(|source| ArtifactError::Frame {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn save_payment_code(&self, stem: &str, record: &ViolationRecord) -> Result<PathBuf, ArtifactError> {
        let path = self.paths.qr_dir.join(format!("{stem}.png"));
        let payload = record.payment_url(self.ledger.payment_portal());
        write_payment_code(&payload, &path).map_err(|source| ArtifactError::PaymentCode {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl ViolationSink for FileSink {
    fn name(&self) -> &str {
        "files"
    }

    fn record(&mut self, event: &ViolationEvent, frame: &FrameSnapshot) -> Result<(), SinkError> {
        let record = self.ledger.record(event);
        let stem = record.artifact_stem();
        let mut failures = Vec::new();

        match self.append_log(&record) {
            Ok(()) => tracing::info!(
                vehicle = %record.vehicle_id,
                owner = %record.owner_name,
                violation = %record.violation_type,
                tick = record.tick_id,
                fine = record.fine_amount,
                "violation logged"
            ),
            Err(err) => failures.push(err),
        }
        match self.save_frame(&stem, frame) {
            Ok(path) => tracing::debug!(path = %path.display(), "frame saved"),
            Err(err) => failures.push(err),
        }
        match self.save_payment_code(&stem, &record) {
            Ok(path) => tracing::debug!(path = %path.display(), "payment code saved"),
            Err(err) => failures.push(err),
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::Artifacts(failures))
        }
    }
}
