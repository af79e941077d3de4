// Hand landmark detector seam
// Backends turn a camera frame into zero or more labeled 21-point hands

use crate::models::capture::{CameraFrame, PoseError, PoseResult};
use crate::models::hand::HandPose;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Hand landmark detector trait.
/// Exclusively owned by one recording session; inference is synchronous.
pub trait HandDetector: Send {
    /// Run inference on a frame
    fn detect(&mut self, frame: &CameraFrame) -> PoseResult<Vec<HandPose>>;

    /// Get model info
    fn get_model_info(&self) -> String;
}

// ==============================================================================
// No-op Detector
// ==============================================================================

/// Never sees a hand; every frame records as a placeholder
pub struct NoHandsDetector;

impl HandDetector for NoHandsDetector {
    fn detect(&mut self, _frame: &CameraFrame) -> PoseResult<Vec<HandPose>> {
        Ok(Vec::new())
    }

    fn get_model_info(&self) -> String {
        "No-op detector (no hands)".to_string()
    }
}

// ==============================================================================
// Replay Detector
// ==============================================================================

/// Replays a recorded detector stream from a JSON-lines file.
///
/// Each line holds the JSON array of `HandPose` values reported for one
/// frame; a blank line is a frame without hands. Once the stream is
/// exhausted every further frame reports no hands.
pub struct ReplayDetector {
    path: PathBuf,
    frames: VecDeque<Vec<HandPose>>,
    total: usize,
}

impl ReplayDetector {
    /// Load and validate every line up front
    pub fn open(path: &Path) -> PoseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PoseError::ModelLoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> PoseResult<Self> {
        let mut frames = VecDeque::new();

        for (index, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                frames.push_back(Vec::new());
                continue;
            }

            let hands: Vec<HandPose> =
                serde_json::from_str(line).map_err(|e| PoseError::MalformedOutput {
                    path: path.to_path_buf(),
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            frames.push_back(hands);
        }

        let total = frames.len();
        log::info!("Loaded {} replay frames from {}", total, path.display());

        Ok(Self {
            path: path.to_path_buf(),
            frames,
            total,
        })
    }

    /// Number of frames in the replay file
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl HandDetector for ReplayDetector {
    fn detect(&mut self, _frame: &CameraFrame) -> PoseResult<Vec<HandPose>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }

    fn get_model_info(&self) -> String {
        format!("Replay of {} ({} frames)", self.path.display(), self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hand::{Handedness, Keypoint3D, NUM_KEYPOINTS};

    fn frame(index: u64) -> CameraFrame {
        CameraFrame {
            index,
            timestamp: 0,
            width: 4,
            height: 4,
            data: Vec::new(),
        }
    }

    fn hands_line(sides: &[Handedness]) -> String {
        let hands: Vec<HandPose> = sides
            .iter()
            .map(|side| HandPose::new(*side, [Keypoint3D::new(0.5, 0.5, 0.0); NUM_KEYPOINTS]))
            .collect();
        serde_json::to_string(&hands).unwrap()
    }

    #[test]
    fn test_replay_in_order_then_empty() {
        let contents = format!(
            "{}\n\n{}\n",
            hands_line(&[Handedness::Left]),
            hands_line(&[Handedness::Left, Handedness::Right])
        );
        let mut detector = ReplayDetector::parse(Path::new("replay.jsonl"), &contents).unwrap();
        assert_eq!(detector.len(), 3);

        assert_eq!(detector.detect(&frame(0)).unwrap().len(), 1);
        assert!(detector.detect(&frame(1)).unwrap().is_empty());
        assert_eq!(detector.detect(&frame(2)).unwrap().len(), 2);
        assert!(detector.detect(&frame(3)).unwrap().is_empty());
    }

    #[test]
    fn test_short_landmark_list_is_rejected() {
        let short = r#"[{"handedness":"Left","landmarks":[{"x":0.0,"y":0.0,"z":0.0}]}]"#;
        let contents = format!("{}\n{}\n", hands_line(&[Handedness::Right]), short);

        match ReplayDetector::parse(Path::new("replay.jsonl"), &contents) {
            Err(PoseError::MalformedOutput { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed output, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        assert!(matches!(
            ReplayDetector::open(Path::new("/nonexistent/replay.jsonl")),
            Err(PoseError::ModelLoadFailed(_))
        ));
    }

    #[test]
    fn test_no_hands_detector() {
        let mut detector = NoHandsDetector;
        assert!(detector.detect(&frame(0)).unwrap().is_empty());
    }
}
