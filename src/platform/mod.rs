// External collaborator seams: frame sources, hand detectors and UI sinks

pub mod detector;
pub mod source;
pub mod ui;

pub use detector::{HandDetector, NoHandsDetector, ReplayDetector};
pub use source::{BlankCapture, CaptureSource};
pub use ui::{LogSink, UiSink};
