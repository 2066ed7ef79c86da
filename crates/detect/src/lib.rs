//! Vigil Detection Core
//!
//! Camera-free logic of the motion alarm:
//!
//! - [`frame::Frame`]: 8-bit OpenCV matrices with the differencing operations
//! - [`detector::MotionDetector`]: frame differencing against a rolling baseline
//! - [`alarm`]: the edge and counter alarm policies

pub mod alarm;
pub mod detector;
pub mod frame;

pub use alarm::{policy_from_config, AlarmPolicy, Alert, MotionEvent};
pub use detector::{Detection, MotionDetector};
pub use frame::Frame;
