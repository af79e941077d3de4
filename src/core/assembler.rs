// Dataset assembly - merges every class's latest normalized archive into one labeled tensor

use crate::core::config::PipelineConfig;
use crate::core::ledger::MetadataLedger;
use crate::core::sample_storage::SampleStorage;
use crate::models::dataset::{
    ClassArray, ClassName, Dataset, DatasetError, DatasetResult, HAND_DIMS,
};
use ndarray::{s, Array1, Array5, ArrayD, Axis, Ix5};
use ndarray_npy::read_npy;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const LATEST_SUFFIX: &str = "_latest.npy";

/// Builds the training tensor from normalized storage
pub struct DatasetAssembler {
    normalized_dir: PathBuf,
    num_frames: usize,
    ledger: MetadataLedger,
    raw: Option<SampleStorage>,
}

impl DatasetAssembler {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            normalized_dir: config.normalized_dir.clone(),
            num_frames: config.num_frames,
            ledger: MetadataLedger::new(config.metadata_path()),
            raw: config
                .check_raw_classes
                .then(|| SampleStorage::from_config(config)),
        }
    }

    /// Classes with a `{class}_latest.npy` archive, sorted by name
    pub fn latest_classes(&self) -> DatasetResult<Vec<(ClassName, PathBuf)>> {
        if !self.normalized_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut classes = Vec::new();
        for entry in std::fs::read_dir(&self.normalized_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            // Timestamped history archives don't end in _latest.npy
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if let Some(name) = file_name.strip_suffix(LATEST_SUFFIX) {
                classes.push((ClassName::parse(name)?, path.clone()));
            }
        }

        classes.sort();
        Ok(classes)
    }

    /// Assemble every class into one `Dataset`. Nothing is returned unless
    /// all consistency checks pass.
    pub fn assemble(&self) -> DatasetResult<Dataset> {
        let classes = self.latest_classes()?;
        if classes.is_empty() {
            return Err(DatasetError::NoClasses(self.normalized_dir.clone()));
        }

        self.check_raw_classes(&classes)?;

        // Ledger and latest archives must name the same classes
        let ledger_totals = self.ledger.totals()?;
        let archived: BTreeSet<&ClassName> = classes.iter().map(|(name, _)| name).collect();
        let ledgered: BTreeSet<&ClassName> = ledger_totals.keys().collect();
        if let Some(missing) = ledgered.difference(&archived).next() {
            return Err(DatasetError::MissingLatest(missing.to_string()));
        }
        if archived != ledgered {
            return Err(DatasetError::LedgerClassMismatch {
                ledger: ledgered.iter().map(|c| c.to_string()).collect(),
                archives: archived.iter().map(|c| c.to_string()).collect(),
            });
        }
        let ledger_total: usize = ledger_totals.values().sum();

        // Load and shape-check every class before allocating
        let mut loaded = Vec::with_capacity(classes.len());
        for (class_name, path) in &classes {
            let samples = self.load_latest(class_name, path)?;
            log::info!(
                "Loading class {} ({}/{}): {} samples",
                class_name,
                loaded.len() + 1,
                classes.len(),
                samples.len_of(Axis(0))
            );
            loaded.push(samples);
        }

        let loaded_total: usize = loaded.iter().map(|a| a.len_of(Axis(0))).sum();
        if loaded_total != ledger_total {
            return Err(DatasetError::LedgerTotalMismatch {
                ledger_total,
                loaded_total,
            });
        }

        // Sorted class order gives ids 0..n and contiguous label runs
        let mut data = Array5::<f32>::zeros((
            ledger_total,
            self.num_frames,
            HAND_DIMS[0],
            HAND_DIMS[1],
            HAND_DIMS[2],
        ));
        let mut labels = Array1::<i64>::zeros(ledger_total);
        let mut id_to_class = BTreeMap::new();

        let mut start = 0;
        for (class_id, ((class_name, _), samples)) in classes.iter().zip(&loaded).enumerate() {
            let class_id = class_id as i64;
            let end = start + samples.len_of(Axis(0));

            data.slice_mut(s![start..end, .., .., .., ..]).assign(samples);
            labels.slice_mut(s![start..end]).fill(class_id);
            id_to_class.insert(class_id, class_name.clone());

            start = end;
        }

        let dataset = Dataset {
            data,
            labels,
            id_to_class,
        };
        log::info!(
            "Assembled dataset: data {:?}, labels {:?}",
            dataset.data.shape(),
            dataset.labels.shape()
        );
        log::info!("id_to_class: {:?}", dataset.id_to_class);
        Ok(dataset)
    }

    fn load_latest(&self, class_name: &ClassName, path: &Path) -> DatasetResult<ClassArray> {
        let samples: ArrayD<f32> = read_npy(path)?;

        let expected = [self.num_frames, HAND_DIMS[0], HAND_DIMS[1], HAND_DIMS[2]];
        if samples.ndim() != 5 || samples.shape()[1..] != expected {
            return Err(DatasetError::InvalidShape {
                class_name: class_name.to_string(),
                expected: format!("(recordings, {:?}) in {}", expected, path.display()),
                actual: samples.shape().to_vec(),
            });
        }

        Ok(samples.into_dimensionality::<Ix5>()?)
    }

    /// Normalized classes must still have a raw directory
    fn check_raw_classes(&self, classes: &[(ClassName, PathBuf)]) -> DatasetResult<()> {
        let raw = match &self.raw {
            Some(raw) => raw,
            None => return Ok(()),
        };

        let raw_classes: BTreeSet<ClassName> = raw.classes()?.into_iter().collect();
        let orphaned: Vec<String> = classes
            .iter()
            .filter(|(name, _)| !raw_classes.contains(name))
            .map(|(name, _)| name.to_string())
            .collect();

        if orphaned.is_empty() {
            Ok(())
        } else {
            Err(DatasetError::ClassSetDivergence {
                normalized: orphaned,
                raw: raw_classes.iter().map(|c| c.to_string()).collect(),
            })
        }
    }
}
