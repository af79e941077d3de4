// Data models for gesture classes, stored samples and the assembled training set

use crate::models::hand::{NUM_COORDS, NUM_HANDS, NUM_KEYPOINTS};
use ndarray::{s, Array1, Array4, Array5, ArrayView4};
use ndarray_npy::write_npy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One recorded sample: (frames, hands, keypoints, coords)
pub type SampleArray = Array4<f32>;

/// A stack of samples for one class: (recordings, frames, hands, keypoints, coords)
pub type ClassArray = Array5<f32>;

/// Trailing (hands, keypoints, coords) dimensions every stored array ends with
pub const HAND_DIMS: [usize; 3] = [NUM_HANDS, NUM_KEYPOINTS, NUM_COORDS];

// ==============================================================================
// Class Names
// ==============================================================================

/// Gesture class name: lowercase tokens joined by single underscores (`thumbs_up`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName(String);

impl ClassName {
    pub fn parse(name: &str) -> DatasetResult<Self> {
        let valid = !name.is_empty()
            && name.split('_').all(|token| {
                !token.is_empty()
                    && token
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            });

        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(DatasetError::InvalidClassName(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ClassName {
    type Error = DatasetError;

    fn try_from(value: String) -> DatasetResult<Self> {
        Self::parse(&value)
    }
}

impl From<ClassName> for String {
    fn from(name: ClassName) -> Self {
        name.0
    }
}

// ==============================================================================
// Ledger Rows
// ==============================================================================

/// One `class_name,count` row of the metadata ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub class_name: ClassName,
    pub sample_count: usize,
}

impl LedgerRow {
    pub fn new(class_name: ClassName, sample_count: usize) -> Self {
        Self {
            class_name,
            sample_count,
        }
    }
}

// ==============================================================================
// Assembled Dataset
// ==============================================================================

/// Labeled training tensor built from every class's latest normalized archive
#[derive(Debug, Clone)]
pub struct Dataset {
    /// (total_samples, frames, hands, keypoints, coords)
    pub data: ClassArray,
    /// (total_samples,)
    pub labels: Array1<i64>,
    pub id_to_class: BTreeMap<i64, ClassName>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sample `index` and its label
    pub fn get(&self, index: usize) -> Option<(ArrayView4<'_, f32>, i64)> {
        if index >= self.len() {
            return None;
        }
        Some((self.data.slice(s![index, .., .., .., ..]), self.labels[index]))
    }

    pub fn class_name(&self, id: i64) -> Option<&ClassName> {
        self.id_to_class.get(&id)
    }

    /// Number of samples per class id
    pub fn class_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts: BTreeMap<i64, usize> =
            self.id_to_class.keys().map(|id| (*id, 0)).collect();
        for label in self.labels.iter() {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }

    /// Write `data.npy`, `labels.npy` and `classes.json` into `dir`
    pub fn export(&self, dir: &Path) -> DatasetResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let data_path = dir.join("data.npy");
        let labels_path = dir.join("labels.npy");
        let classes_path = dir.join("classes.json");

        write_npy(&data_path, &self.data)?;
        write_npy(&labels_path, &self.labels)?;

        let classes: BTreeMap<String, &str> = self
            .id_to_class
            .iter()
            .map(|(id, name)| (id.to_string(), name.as_str()))
            .collect();
        std::fs::write(&classes_path, serde_json::to_string_pretty(&classes)?)?;

        Ok(vec![data_path, labels_path, classes_path])
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read .npy archive: {0}")]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error("Failed to write .npy archive: {0}")]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid class name '{0}': expected lowercase tokens joined by single underscores")]
    InvalidClassName(String),

    #[error("Invalid shape for class '{class_name}': expected {expected}, got {actual:?}")]
    InvalidShape {
        class_name: String,
        expected: String,
        actual: Vec<usize>,
    },

    #[error("No raw samples found for class '{0}'")]
    EmptyClass(String),

    #[error("Missing latest normalized archive for class '{0}'")]
    MissingLatest(String),

    #[error("Normalized classes {normalized:?} have no raw directory (raw classes: {raw:?}); investigate deleted raw data before assembling")]
    ClassSetDivergence {
        normalized: Vec<String>,
        raw: Vec<String>,
    },

    #[error("Ledger classes {ledger:?} do not match latest archives {archives:?}")]
    LedgerClassMismatch {
        ledger: Vec<String>,
        archives: Vec<String>,
    },

    #[error("Ledger total of {ledger_total} samples does not match {loaded_total} samples loaded from latest archives")]
    LedgerTotalMismatch {
        ledger_total: usize,
        loaded_total: usize,
    },

    #[error("Malformed ledger row {line} in {}: '{content}'", path.display())]
    InvalidLedgerRow {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("No latest normalized archives found in {}", .0.display())]
    NoClasses(PathBuf),
}

pub type DatasetResult<T> = Result<T, DatasetError>;
