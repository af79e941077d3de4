// Landmark selection - resolves raw detections into one left and one right hand slot

use crate::models::hand::{FrameKeypoints, HandKeypoints, HandPose, Handedness};

/// Resolve one frame of detections into exactly one left and one right slot.
///
/// A side that was not detected gets a zero-filled placeholder. If any side
/// was reported more than once the whole frame is replaced by placeholders,
/// whatever order the detector listed the hands in.
pub fn select(detections: &[HandPose]) -> FrameKeypoints {
    let mut left: Option<&HandPose> = None;
    let mut right: Option<&HandPose> = None;

    for hand in detections {
        let slot = match hand.handedness {
            Handedness::Left => &mut left,
            Handedness::Right => &mut right,
        };

        if slot.is_some() {
            log::debug!(
                "Invalidating frame: {} hands detected with a repeated {} label",
                detections.len(),
                hand.handedness.to_string()
            );
            return FrameKeypoints::placeholder();
        }
        *slot = Some(hand);
    }

    FrameKeypoints::new(
        left.map(HandKeypoints::from)
            .unwrap_or_else(HandKeypoints::placeholder),
        right
            .map(HandKeypoints::from)
            .unwrap_or_else(HandKeypoints::placeholder),
    )
}

/// Space-separated handedness labels for UI feedback, e.g. `"Left Right"`
pub fn describe_detections(detections: &[HandPose]) -> String {
    detections
        .iter()
        .map(|hand| hand.handedness.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
