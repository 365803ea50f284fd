pub mod calibration;
pub mod detector;
pub mod motion;
pub mod peak;
pub mod stability;
pub mod visibility;
pub mod window;

pub use calibration::{AnthropometricProfile, BaselineCalibrator, ScaleSource};
pub use detector::{DebugInfo, DetectorHandle, JumpHeightDetector, MeasurementSnapshot};
pub use motion::{MotionValidityFilter, MotionVerdict};
pub use peak::PeakHeightTracker;
pub use stability::{StabilityMonitor, StabilityReport};
pub use visibility::VisibilityGate;
pub use window::SampleWindow;
