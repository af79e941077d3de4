// Raw sample storage - one directory of .npy samples per gesture class

use crate::core::config::{PipelineConfig, SampleIdStrategy};
use crate::models::dataset::{
    ClassArray, ClassName, DatasetError, DatasetResult, SampleArray, HAND_DIMS,
};
use ndarray::{stack, ArrayD, Axis, Ix4};
use ndarray_npy::{read_npy, write_npy};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Picks the file stem for the next sample written into a class directory
pub trait SampleIdAllocator: Send + Sync {
    fn next_id(&self, class_dir: &Path) -> DatasetResult<String>;
}

/// Random UUID v4 stems; concurrent recorders cannot collide
pub struct UuidIds;

impl SampleIdAllocator for UuidIds {
    fn next_id(&self, _class_dir: &Path) -> DatasetResult<String> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// `existing .npy count + 1`, skipping forward past stems already taken.
///
/// Assumes a single writer per class: two recorders can still compute the
/// same id between the directory scan and the write.
pub struct SequentialIds;

impl SampleIdAllocator for SequentialIds {
    fn next_id(&self, class_dir: &Path) -> DatasetResult<String> {
        let mut id = npy_files(class_dir)?.len() + 1;
        while class_dir.join(format!("{}.npy", id)).exists() {
            id += 1;
        }
        Ok(id.to_string())
    }
}

pub fn allocator_for(strategy: SampleIdStrategy) -> Box<dyn SampleIdAllocator> {
    match strategy {
        SampleIdStrategy::Uuid => Box::new(UuidIds),
        SampleIdStrategy::Sequential => Box::new(SequentialIds),
    }
}

/// Raw per-class sample archive
pub struct SampleStorage {
    base_path: PathBuf,
    num_frames: usize,
    ids: Box<dyn SampleIdAllocator>,
}

impl SampleStorage {
    pub fn new(base_path: PathBuf, num_frames: usize, ids: Box<dyn SampleIdAllocator>) -> Self {
        Self {
            base_path,
            num_frames,
            ids,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.raw_dir.clone(),
            config.num_frames,
            allocator_for(config.sample_ids),
        )
    }

    pub fn class_dir(&self, class_name: &ClassName) -> PathBuf {
        self.base_path.join(class_name.as_str())
    }

    /// Persist one finished sample and return its path
    pub fn save(&self, class_name: &ClassName, sample: &SampleArray) -> DatasetResult<PathBuf> {
        let expected = self.sample_shape();
        if sample.shape() != expected.as_slice() {
            return Err(DatasetError::InvalidShape {
                class_name: class_name.to_string(),
                expected: format!("{:?}", expected),
                actual: sample.shape().to_vec(),
            });
        }

        // Create class directory if it doesn't exist
        let class_dir = self.class_dir(class_name);
        std::fs::create_dir_all(&class_dir)?;

        let sample_id = self.ids.next_id(&class_dir)?;
        let path = class_dir.join(format!("{}.npy", sample_id));
        write_npy(&path, sample)?;

        log::info!("'{}' sample saved as {}", class_name, path.display());
        Ok(path)
    }

    /// Sample files of a class, numeric stems first in numeric order
    pub fn sample_paths(&self, class_name: &ClassName) -> DatasetResult<Vec<PathBuf>> {
        let class_dir = self.class_dir(class_name);
        if !class_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = npy_files(&class_dir)?;
        paths.sort_by_key(|path| {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            (stem.parse::<u64>().unwrap_or(u64::MAX), stem)
        });
        Ok(paths)
    }

    pub fn count(&self, class_name: &ClassName) -> DatasetResult<usize> {
        Ok(self.sample_paths(class_name)?.len())
    }

    /// Stack every sample of a class into (recordings, frames, 2, 21, 3)
    pub fn load_class(&self, class_name: &ClassName) -> DatasetResult<ClassArray> {
        let paths = self.sample_paths(class_name)?;
        if paths.is_empty() {
            return Err(DatasetError::EmptyClass(class_name.to_string()));
        }

        let mut samples = Vec::with_capacity(paths.len());
        for path in &paths {
            let raw: ArrayD<f32> = read_npy(path)?;
            if raw.ndim() != 4 || raw.shape()[1..] != HAND_DIMS {
                return Err(DatasetError::InvalidShape {
                    class_name: class_name.to_string(),
                    expected: format!("(frames, {}, {}, {}) in {}", HAND_DIMS[0], HAND_DIMS[1], HAND_DIMS[2], path.display()),
                    actual: raw.shape().to_vec(),
                });
            }
            log::debug!("Loaded {} {:?}", path.display(), raw.shape());
            samples.push(raw.into_dimensionality::<Ix4>()?);
        }

        let views: Vec<_> = samples.iter().map(|s| s.view()).collect();
        let stacked = stack(Axis(0), &views).map_err(|_| DatasetError::InvalidShape {
            class_name: class_name.to_string(),
            expected: "samples with equal frame counts".to_string(),
            actual: samples.iter().map(|s| s.shape()[0]).collect(),
        })?;

        log::info!(
            "Loaded '{}' raw keypoints from {}: {:?} (recordings, frames, hands, keypoints, coordinates)",
            class_name,
            self.class_dir(class_name).display(),
            stacked.shape()
        );
        Ok(stacked)
    }

    /// Class directories present under the raw root, sorted
    pub fn classes(&self) -> DatasetResult<Vec<ClassName>> {
        if !self.base_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut classes = Vec::new();
        for entry in std::fs::read_dir(&self.base_path)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            match ClassName::parse(&name) {
                Ok(class_name) => classes.push(class_name),
                Err(_) => log::warn!("Skipping raw directory '{}': not a valid class name", name),
            }
        }
        classes.sort();
        Ok(classes)
    }

    fn sample_shape(&self) -> [usize; 4] {
        [self.num_frames, HAND_DIMS[0], HAND_DIMS[1], HAND_DIMS[2]]
    }
}

fn npy_files(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("npy") {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hand::NUM_FRAMES;
    use ndarray::Array4;
    use tempfile::TempDir;

    fn sample(value: f32) -> SampleArray {
        Array4::from_elem((NUM_FRAMES, 2, 21, 3), value)
    }

    fn storage(dir: &TempDir, ids: Box<dyn SampleIdAllocator>) -> SampleStorage {
        SampleStorage::new(dir.path().join("raw"), NUM_FRAMES, ids)
    }

    #[test]
    fn test_sequential_ids_count_up() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(SequentialIds));
        let wave = ClassName::parse("wave").unwrap();

        let first = storage.save(&wave, &sample(1.0)).unwrap();
        let second = storage.save(&wave, &sample(2.0)).unwrap();

        assert_eq!(first.file_name().unwrap(), "1.npy");
        assert_eq!(second.file_name().unwrap(), "2.npy");
        assert_eq!(storage.count(&wave).unwrap(), 2);
    }

    #[test]
    fn test_sequential_ids_never_overwrite() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(SequentialIds));
        let wave = ClassName::parse("wave").unwrap();

        storage.save(&wave, &sample(1.0)).unwrap();
        storage.save(&wave, &sample(2.0)).unwrap();
        std::fs::remove_file(storage.class_dir(&wave).join("1.npy")).unwrap();

        // one file left, so count + 1 = 2 is taken already
        let third = storage.save(&wave, &sample(3.0)).unwrap();
        assert_eq!(third.file_name().unwrap(), "3.npy");
        assert_eq!(storage.count(&wave).unwrap(), 2);
    }

    #[test]
    fn test_save_result_depends_only_on_the_write() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(UuidIds));
        let wave = ClassName::parse("wave").unwrap();

        // a directory named like a sample is neither a sample nor an error
        std::fs::create_dir_all(storage.class_dir(&wave).join("nested.npy")).unwrap();

        let path = storage.save(&wave, &sample(7.0)).unwrap();
        let written: SampleArray = read_npy(&path).unwrap();
        assert_eq!(written, sample(7.0));
        assert_eq!(storage.count(&wave).unwrap(), 1);
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(UuidIds));
        let wave = ClassName::parse("wave").unwrap();

        let a = storage.save(&wave, &sample(1.0)).unwrap();
        let b = storage.save(&wave, &sample(1.0)).unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.file_stem().unwrap().to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_save_rejects_wrong_shape() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(UuidIds));
        let wave = ClassName::parse("wave").unwrap();

        let short = Array4::<f32>::zeros((NUM_FRAMES - 1, 2, 21, 3));
        assert!(matches!(
            storage.save(&wave, &short),
            Err(DatasetError::InvalidShape { .. })
        ));
        assert!(!storage.class_dir(&wave).exists());
    }

    #[test]
    fn test_load_class_stacks_in_id_order() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(SequentialIds));
        let wave = ClassName::parse("wave").unwrap();

        for i in 1..=11 {
            storage.save(&wave, &sample(i as f32)).unwrap();
        }

        let stacked = storage.load_class(&wave).unwrap();
        assert_eq!(stacked.shape(), &[11, NUM_FRAMES, 2, 21, 3]);
        assert_eq!(stacked[[1, 0, 0, 0, 0]], 2.0);
        assert_eq!(stacked[[10, 0, 0, 0, 0]], 11.0);
    }

    #[test]
    fn test_load_class_errors() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(SequentialIds));
        let wave = ClassName::parse("wave").unwrap();

        assert!(matches!(
            storage.load_class(&wave),
            Err(DatasetError::EmptyClass(_))
        ));

        std::fs::create_dir_all(storage.class_dir(&wave)).unwrap();
        let flat = ndarray::Array3::<f32>::zeros((NUM_FRAMES, 42, 3));
        write_npy(storage.class_dir(&wave).join("1.npy"), &flat).unwrap();

        assert!(matches!(
            storage.load_class(&wave),
            Err(DatasetError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_load_class_rejects_mixed_frame_counts() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(SequentialIds));
        let wave = ClassName::parse("wave").unwrap();

        storage.save(&wave, &sample(1.0)).unwrap();
        let longer = Array4::<f32>::zeros((NUM_FRAMES + 1, 2, 21, 3));
        write_npy(storage.class_dir(&wave).join("2.npy"), &longer).unwrap();

        assert!(matches!(
            storage.load_class(&wave),
            Err(DatasetError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_classes_lists_valid_directories() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir, Box::new(UuidIds));

        for name in ["wave", "thumbs_up", "Not A Class"] {
            std::fs::create_dir_all(dir.path().join("raw").join(name)).unwrap();
        }
        std::fs::write(dir.path().join("raw").join("notes.txt"), "x").unwrap();

        let classes: Vec<String> = storage
            .classes()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(classes, vec!["thumbs_up", "wave"]);
    }
}
