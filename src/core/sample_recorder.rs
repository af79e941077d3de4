// Sample recorder - accumulates a fixed number of frames into one sample array

use crate::models::dataset::SampleArray;
use crate::models::hand::{FrameKeypoints, Handedness, NUM_COORDS, NUM_HANDS, NUM_KEYPOINTS};
use ndarray::{s, Array4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Result of pushing one frame
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Not recording; the frame was ignored
    Idle,
    /// Frame buffered, `frames_remaining` more needed
    Recording { frames_remaining: usize },
    /// Buffer full; recorder is idle again
    SampleReady(SampleArray),
}

/// Stateful accumulator turning a frame stream into `(frames, 2, 21, 3)` samples.
///
/// `Idle --start()--> Recording --(last push)--> Idle`; `cancel()` returns
/// to `Idle` from any frame count. Persisting a finished sample is up to the
/// caller.
pub struct SampleRecorder {
    num_frames: usize,
    state: RecorderState,
    buffer: Vec<FrameKeypoints>,
}

impl SampleRecorder {
    /// `num_frames` below 1 is raised to 1
    pub fn new(num_frames: usize) -> Self {
        let num_frames = num_frames.max(1);
        Self {
            num_frames,
            state: RecorderState::Idle,
            buffer: Vec::with_capacity(num_frames),
        }
    }

    /// Begin a new sample, discarding anything buffered
    pub fn start(&mut self) {
        self.buffer.clear();
        self.state = RecorderState::Recording;
    }

    pub fn push(&mut self, frame: FrameKeypoints) -> PushOutcome {
        if self.state != RecorderState::Recording {
            return PushOutcome::Idle;
        }

        self.buffer.push(frame);
        if self.buffer.len() < self.num_frames {
            return PushOutcome::Recording {
                frames_remaining: self.num_frames - self.buffer.len(),
            };
        }

        let sample = Self::stack_frames(&self.buffer);
        self.buffer.clear();
        self.state = RecorderState::Idle;
        PushOutcome::SampleReady(sample)
    }

    /// Abort the current sample. Safe to call in any state.
    pub fn cancel(&mut self) {
        if self.state == RecorderState::Recording {
            log::debug!("Recording cancelled after {} frames", self.buffer.len());
        }
        self.buffer.clear();
        self.state = RecorderState::Idle;
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn frames_recorded(&self) -> usize {
        self.buffer.len()
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Stack frames into (frames, hands, keypoints, coords), left hand first
    fn stack_frames(frames: &[FrameKeypoints]) -> SampleArray {
        let mut sample = Array4::<f32>::zeros((frames.len(), NUM_HANDS, NUM_KEYPOINTS, NUM_COORDS));

        for (f, frame) in frames.iter().enumerate() {
            for side in [Handedness::Left, Handedness::Right] {
                sample
                    .slice_mut(s![f, side.slot(), .., ..])
                    .assign(&frame.hand(side).to_array());
            }
        }

        sample
    }
}

impl Default for SampleRecorder {
    fn default() -> Self {
        Self::new(crate::models::hand::NUM_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::hand::{HandKeypoints, NUM_FRAMES};
    use ndarray::Array2;

    /// Frame whose left hand is filled with `value` and right hand with `-value`
    fn frame(value: f32) -> FrameKeypoints {
        let left = Array2::from_elem((NUM_KEYPOINTS, NUM_COORDS), value);
        let right = Array2::from_elem((NUM_KEYPOINTS, NUM_COORDS), -value);
        FrameKeypoints::new(
            HandKeypoints::from_array(left.view()),
            HandKeypoints::from_array(right.view()),
        )
    }

    #[test]
    fn test_push_while_idle_is_ignored() {
        let mut recorder = SampleRecorder::default();
        assert_eq!(recorder.push(frame(1.0)), PushOutcome::Idle);
        assert_eq!(recorder.frames_recorded(), 0);
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[test]
    fn test_full_sample_after_num_frames_pushes() {
        let mut recorder = SampleRecorder::default();
        recorder.start();

        for i in 0..NUM_FRAMES - 1 {
            match recorder.push(frame(i as f32)) {
                PushOutcome::Recording { frames_remaining } => {
                    assert_eq!(frames_remaining, NUM_FRAMES - i - 1)
                }
                other => panic!("unexpected outcome at frame {}: {:?}", i, other),
            }
        }

        let sample = match recorder.push(frame(19.0)) {
            PushOutcome::SampleReady(sample) => sample,
            other => panic!("expected a sample, got {:?}", other),
        };

        assert_eq!(sample.shape(), &[NUM_FRAMES, NUM_HANDS, NUM_KEYPOINTS, NUM_COORDS]);
        assert_eq!(sample[[3, 0, 5, 1]], 3.0);
        assert_eq!(sample[[3, 1, 5, 1]], -3.0);
        assert!(!recorder.is_recording());
        assert_eq!(recorder.frames_recorded(), 0);

        // recorder goes idle after emitting
        assert_eq!(recorder.push(frame(0.0)), PushOutcome::Idle);
    }

    #[test]
    fn test_fewer_frames_never_emit() {
        let mut recorder = SampleRecorder::new(5);
        recorder.start();
        for _ in 0..4 {
            assert!(!matches!(recorder.push(frame(1.0)), PushOutcome::SampleReady(_)));
        }
        assert_eq!(recorder.frames_recorded(), 4);
    }

    #[test]
    fn test_cancel_discards_buffered_frames() {
        let mut recorder = SampleRecorder::default();
        recorder.start();
        for _ in 0..7 {
            recorder.push(frame(100.0));
        }

        recorder.cancel();
        recorder.cancel();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(recorder.push(frame(100.0)), PushOutcome::Idle);

        recorder.start();
        let mut ready = None;
        for i in 0..NUM_FRAMES {
            if let PushOutcome::SampleReady(sample) = recorder.push(frame(i as f32)) {
                ready = Some(sample);
            }
        }

        let sample = ready.expect("sample after restart");
        assert_eq!(sample[[0, 0, 0, 0]], 0.0);
        assert_eq!(sample[[NUM_FRAMES - 1, 0, 0, 0]], (NUM_FRAMES - 1) as f32);
        assert!(sample.iter().all(|v| v.abs() < 100.0));
    }

    #[test]
    fn test_zero_frame_recorder_is_clamped() {
        let mut recorder = SampleRecorder::new(0);
        assert_eq!(recorder.num_frames(), 1);

        recorder.start();
        match recorder.push(frame(4.0)) {
            PushOutcome::SampleReady(sample) => {
                assert_eq!(sample.shape(), &[1, NUM_HANDS, NUM_KEYPOINTS, NUM_COORDS]);
                assert_eq!(sample.shape()[0], recorder.num_frames());
            }
            other => panic!("expected a one-frame sample, got {:?}", other),
        }
    }

    #[test]
    fn test_start_mid_recording_restarts() {
        let mut recorder = SampleRecorder::new(3);
        recorder.start();
        recorder.push(frame(1.0));
        recorder.push(frame(1.0));
        recorder.start();
        assert_eq!(recorder.frames_recorded(), 0);
        assert_eq!(
            recorder.push(frame(2.0)),
            PushOutcome::Recording { frames_remaining: 2 }
        );
    }
}
