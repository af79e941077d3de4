// Recording session - drives capture, detection, selection and sample persistence

use crate::core::config::PipelineConfig;
use crate::core::sample_recorder::{PushOutcome, SampleRecorder};
use crate::core::sample_storage::SampleStorage;
use crate::core::selector::select;
use crate::models::capture::CaptureResult;
use crate::models::dataset::ClassName;
use crate::platform::{CaptureSource, HandDetector, UiSink};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// One frame in flight at a time: capture, detect, select, push, persist
pub struct RecordingSession {
    source: Box<dyn CaptureSource>,
    detector: Box<dyn HandDetector>,
    ui: Box<dyn UiSink>,
    recorder: SampleRecorder,
    storage: SampleStorage,
    frame_interval: Duration,
}

impl RecordingSession {
    pub fn new(
        config: &PipelineConfig,
        source: Box<dyn CaptureSource>,
        detector: Box<dyn HandDetector>,
        ui: Box<dyn UiSink>,
    ) -> Self {
        Self {
            source,
            detector,
            ui,
            recorder: SampleRecorder::new(config.num_frames),
            storage: SampleStorage::from_config(config),
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Record `recordings` samples of `class_name`, back to back.
    ///
    /// Returns the saved sample paths. If the source runs dry first, the
    /// sample in progress is dropped and only completed samples are returned.
    pub async fn run(
        &mut self,
        class_name: &ClassName,
        recordings: usize,
    ) -> CaptureResult<Vec<PathBuf>> {
        log::info!(
            "Recording {} '{}' samples from {} with {}",
            recordings,
            class_name,
            self.source.name(),
            self.detector.get_model_info()
        );

        let mut saved = Vec::with_capacity(recordings);
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while saved.len() < recordings {
            ticker.tick().await;

            // Source exhausted: drop any partial sample
            let frame = match self.source.next_frame().await? {
                Some(frame) => frame,
                None => {
                    if self.recorder.is_recording() {
                        log::warn!(
                            "Capture ended after {} of {} frames; discarding partial sample",
                            self.recorder.frames_recorded(),
                            self.recorder.num_frames()
                        );
                    }
                    self.recorder.cancel();
                    self.ui.show_message("Capture stream ended");
                    break;
                }
            };

            // Detector errors abort the session
            let detections = match self.detector.detect(&frame) {
                Ok(detections) => detections,
                Err(e) => {
                    self.recorder.cancel();
                    return Err(e.into());
                }
            };
            self.ui.show_detected_hands(&frame, &detections);

            // Start the next sample on the first frame after the last one finished
            if !self.recorder.is_recording() {
                self.recorder.start();
                self.ui.show_message(&format!(
                    "Recording '{}' sample {}/{}",
                    class_name,
                    saved.len() + 1,
                    recordings
                ));
            }

            match self.recorder.push(select(&detections)) {
                PushOutcome::Idle => {}
                PushOutcome::Recording { frames_remaining } => {
                    self.ui
                        .show_message(&format!("Recording... {} frames left", frames_remaining));
                }
                PushOutcome::SampleReady(sample) => {
                    let path = self.storage.save(class_name, &sample)?;
                    self.ui.show_message("Recording saved");
                    saved.push(path);
                }
            }
        }

        log::info!(
            "Session finished: {}/{} '{}' samples saved",
            saved.len(),
            recordings,
            class_name
        );
        Ok(saved)
    }
}
