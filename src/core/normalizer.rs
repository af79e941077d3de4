// Keypoint normalization - wrist-centering and wrist-to-middle-MCP scaling

use crate::core::config::{LedgerPolicy, PipelineConfig};
use crate::core::ledger::MetadataLedger;
use crate::core::sample_storage::SampleStorage;
use crate::models::dataset::{
    ClassArray, ClassName, DatasetError, DatasetResult, LedgerRow, SampleArray, HAND_DIMS,
};
use crate::models::hand::HandLandmark;
use ndarray::{Array1, ArrayViewMut2, Axis};
use ndarray_npy::{write_npy, WriteNpyExt};
use std::io::{BufWriter, ErrorKind};
use std::path::PathBuf;

/// Lower bound on the wrist-to-middle-MCP distance
pub const MIN_HAND_SCALE: f32 = 1e-6;

/// Center one (21, 3) hand on its wrist and scale it to unit wrist-to-middle-MCP length
fn normalize_hand(mut hand: ArrayViewMut2<f32>) {
    let wrist: Array1<f32> = hand.row(HandLandmark::Wrist.index()).to_owned();
    for mut keypoint in hand.rows_mut() {
        keypoint -= &wrist;
    }

    let middle_mcp = hand.row(HandLandmark::MiddleFingerMcp.index());
    let scale = middle_mcp.dot(&middle_mcp).sqrt().max(MIN_HAND_SCALE);
    hand /= scale;
}

/// Normalize a batch of samples shaped (recordings, frames, 2, 21, 3).
///
/// Every hand in every frame ends up with its wrist at the origin and its
/// middle-finger MCP at distance 1. Placeholder hands stay all-zero.
pub fn center_and_scale(raw: &ClassArray) -> ClassArray {
    let mut normalized = raw.to_owned();
    for mut recording in normalized.axis_iter_mut(Axis(0)) {
        for mut frame in recording.axis_iter_mut(Axis(0)) {
            for hand in frame.axis_iter_mut(Axis(0)) {
                normalize_hand(hand);
            }
        }
    }
    normalized
}

/// Normalize a single (frames, 2, 21, 3) sample
pub fn normalize_sample(sample: &SampleArray) -> SampleArray {
    let mut normalized = sample.to_owned();
    for mut frame in normalized.axis_iter_mut(Axis(0)) {
        for hand in frame.axis_iter_mut(Axis(0)) {
            normalize_hand(hand);
        }
    }
    normalized
}

/// Outcome of one class normalization run
#[derive(Debug, Clone)]
pub struct NormalizationReport {
    pub class_name: ClassName,
    pub recordings: usize,
    pub latest_path: PathBuf,
    pub archive_path: PathBuf,
}

/// Loads raw class samples, normalizes them and writes the normalized archives
pub struct KeypointNormalizer {
    raw: SampleStorage,
    normalized_dir: PathBuf,
    num_frames: usize,
    ledger: MetadataLedger,
    ledger_policy: LedgerPolicy,
}

impl KeypointNormalizer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            raw: SampleStorage::from_config(config),
            normalized_dir: config.normalized_dir.clone(),
            num_frames: config.num_frames,
            ledger: MetadataLedger::new(config.metadata_path()),
            ledger_policy: config.ledger_policy,
        }
    }

    pub fn latest_path(&self, class_name: &ClassName) -> PathBuf {
        self.normalized_dir
            .join(format!("{}_latest.npy", class_name))
    }

    /// Normalize every raw sample of `class_name` and archive the result
    pub fn normalize_class(&self, class_name: &ClassName) -> DatasetResult<NormalizationReport> {
        let raw = self.raw.load_class(class_name)?;

        let expected = [self.num_frames, HAND_DIMS[0], HAND_DIMS[1], HAND_DIMS[2]];
        if raw.shape()[1..] != expected {
            return Err(DatasetError::InvalidShape {
                class_name: class_name.to_string(),
                expected: format!("(recordings, {:?})", expected),
                actual: raw.shape().to_vec(),
            });
        }

        let normalized = center_and_scale(&raw);
        log::info!(
            "Normalized '{}' keypoints on wrist and wrist-to-middle-MCP length: {:?}",
            class_name,
            normalized.shape()
        );

        // Create normalized directory if it doesn't exist
        std::fs::create_dir_all(&self.normalized_dir)?;

        // History archive first, then overwrite latest
        let archive_path = self.write_archive(class_name, &normalized)?;
        let latest_path = self.latest_path(class_name);
        write_npy(&latest_path, &normalized)?;

        // Record the run in the ledger
        let recordings = normalized.len_of(Axis(0));
        self.ledger.record(
            &LedgerRow::new(class_name.clone(), recordings),
            self.ledger_policy,
        )?;

        log::info!(
            "Saved normalized keypoints in {} and {}",
            latest_path.display(),
            archive_path.display()
        );

        Ok(NormalizationReport {
            class_name: class_name.clone(),
            recordings,
            latest_path,
            archive_path,
        })
    }

    /// Write `{class}_{YYYYmmdd_HHMMSS}.npy` without ever replacing an
    /// existing archive. A second run within the same second gets `_1`, `_2`...
    fn write_archive(&self, class_name: &ClassName, normalized: &ClassArray) -> DatasetResult<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

        let mut attempt = 0usize;
        loop {
            let file_name = match attempt {
                0 => format!("{}_{}.npy", class_name, timestamp),
                n => format!("{}_{}_{}.npy", class_name, timestamp, n),
            };
            let path = self.normalized_dir.join(file_name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    normalized.write_npy(BufWriter::new(file))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("Archive {} exists, trying next suffix", path.display());
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Normalize every raw class directory, stopping at the first failure
    pub fn normalize_all(&self) -> DatasetResult<Vec<NormalizationReport>> {
        let classes = self.raw.classes()?;
        log::info!("Normalizing {} classes", classes.len());

        classes
            .iter()
            .map(|class_name| self.normalize_class(class_name))
            .collect()
    }
}
