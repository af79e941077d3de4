// Capture source abstraction - where camera frames come from

use crate::models::capture::{CameraFrame, CaptureError, CaptureResult};
use async_trait::async_trait;

/// Frame source driving a recording session
#[async_trait]
pub trait CaptureSource: Send {
    /// Next frame, or `None` once the stream has ended
    async fn next_frame(&mut self) -> CaptureResult<Option<CameraFrame>>;

    fn name(&self) -> String;
}

/// Synthetic black RGB frames, optionally bounded
pub struct BlankCapture {
    width: u32,
    height: u32,
    max_frames: Option<u64>,
    next_index: u64,
}

impl BlankCapture {
    pub fn new(width: u32, height: u32, max_frames: Option<u64>) -> Self {
        Self {
            width,
            height,
            max_frames,
            next_index: 0,
        }
    }

    pub fn frames_emitted(&self) -> u64 {
        self.next_index
    }
}

impl Default for BlankCapture {
    fn default() -> Self {
        Self::new(640, 480, None)
    }
}

#[async_trait]
impl CaptureSource for BlankCapture {
    async fn next_frame(&mut self) -> CaptureResult<Option<CameraFrame>> {
        if self.max_frames.is_some_and(|max| self.next_index >= max) {
            return Ok(None);
        }

        // RGB, 3 bytes per pixel
        let len = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .filter(|len| *len > 0)
            .ok_or_else(|| {
                CaptureError::CaptureFailed(format!(
                    "Invalid frame size {}x{}",
                    self.width, self.height
                ))
            })?;

        let frame = CameraFrame {
            index: self.next_index,
            timestamp: chrono::Utc::now().timestamp_millis(),
            width: self.width,
            height: self.height,
            data: vec![0; len],
        };
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> String {
        format!("Blank capture {}x{}", self.width, self.height)
    }
}
