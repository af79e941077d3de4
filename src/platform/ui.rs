// UI sink - where a recording session reports progress and detections

use crate::core::selector::describe_detections;
use crate::models::capture::CameraFrame;
use crate::models::hand::HandPose;

pub trait UiSink: Send {
    fn show_message(&mut self, message: &str);

    fn show_detected_hands(&mut self, frame: &CameraFrame, detections: &[HandPose]);
}

/// Routes UI output to the log
#[derive(Default)]
pub struct LogSink;

impl UiSink for LogSink {
    fn show_message(&mut self, message: &str) {
        log::info!("{}", message);
    }

    fn show_detected_hands(&mut self, frame: &CameraFrame, detections: &[HandPose]) {
        if detections.is_empty() {
            log::trace!("Frame {}: no hands", frame.index);
        } else {
            log::debug!("Frame {}: {}", frame.index, describe_detections(detections));
        }
    }
}
