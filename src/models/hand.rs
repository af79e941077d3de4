// Data models for per-frame hand tracking results

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Number of landmarks per detected hand
pub const NUM_KEYPOINTS: usize = 21;

/// Hands per frame slot (left, right)
pub const NUM_HANDS: usize = 2;

/// Coordinates per landmark (x, y, z)
pub const NUM_COORDS: usize = 3;

/// Frames per recorded sample
pub const NUM_FRAMES: usize = 20;

// ==============================================================================
// Hand Tracking (21 keypoints per hand)
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn to_string(&self) -> &'static str {
        match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        }
    }

    /// Slot index inside a frame array (left first)
    pub fn slot(&self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

/// MediaPipe Hand Landmark indices (21 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single hand landmark in camera-normalized coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    pub z: f32, // Depth relative to the wrist, unbounded
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn as_array(&self) -> [f32; NUM_COORDS] {
        [self.x, self.y, self.z]
    }
}

/// One detected hand as reported by the landmark detector.
///
/// The landmark count is fixed by the type, so a detector backend that
/// produces anything other than 21 points has to fail while parsing its
/// own output rather than hand a short list to the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    pub handedness: Handedness,
    pub landmarks: [Keypoint3D; NUM_KEYPOINTS],
    /// Handedness classification score reported by the detector
    #[serde(default)]
    pub confidence: f32,
}

impl HandPose {
    pub fn new(handedness: Handedness, landmarks: [Keypoint3D; NUM_KEYPOINTS]) -> Self {
        Self {
            handedness,
            landmarks,
            confidence: 1.0,
        }
    }
}

// ==============================================================================
// Per-frame keypoints (always one left and one right slot)
// ==============================================================================

/// Landmarks of one hand slot; all zeros when the side was not detected
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandKeypoints {
    points: [Keypoint3D; NUM_KEYPOINTS],
}

impl HandKeypoints {
    pub fn placeholder() -> Self {
        Self {
            points: [Keypoint3D::default(); NUM_KEYPOINTS],
        }
    }

    pub fn points(&self) -> &[Keypoint3D; NUM_KEYPOINTS] {
        &self.points
    }

    pub fn is_placeholder(&self) -> bool {
        self.points.iter().all(|p| *p == Keypoint3D::default())
    }

    /// (21, 3) array view of the landmarks
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((NUM_KEYPOINTS, NUM_COORDS), |(k, c)| {
            self.points[k].as_array()[c]
        })
    }

    pub fn from_array(view: ArrayView2<f32>) -> Self {
        let mut points = [Keypoint3D::default(); NUM_KEYPOINTS];
        for (point, row) in points.iter_mut().zip(view.rows()) {
            *point = Keypoint3D::new(row[0], row[1], row[2]);
        }
        Self { points }
    }
}

impl From<&HandPose> for HandKeypoints {
    fn from(hand: &HandPose) -> Self {
        Self {
            points: hand.landmarks,
        }
    }
}

/// Resolved keypoints for one frame. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameKeypoints {
    left_hand: HandKeypoints,
    right_hand: HandKeypoints,
}

impl FrameKeypoints {
    pub fn new(left_hand: HandKeypoints, right_hand: HandKeypoints) -> Self {
        Self {
            left_hand,
            right_hand,
        }
    }

    /// Both slots zero-filled
    pub fn placeholder() -> Self {
        Self::new(HandKeypoints::placeholder(), HandKeypoints::placeholder())
    }

    pub fn left_hand(&self) -> &HandKeypoints {
        &self.left_hand
    }

    pub fn right_hand(&self) -> &HandKeypoints {
        &self.right_hand
    }

    pub fn hand(&self, side: Handedness) -> &HandKeypoints {
        match side {
            Handedness::Left => &self.left_hand,
            Handedness::Right => &self.right_hand,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.left_hand.is_placeholder() && self.right_hand.is_placeholder()
    }
}
