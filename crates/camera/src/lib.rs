//! Vigil Camera
//!
//! OpenCV-backed implementations of the monitor's hardware traits:
//!
//! - [`OpenCvCamera`]: `FrameSource` over `VideoCapture`, with resize,
//!   grayscale and Gaussian blur preprocessing
//! - [`HighGuiDisplay`]: `Display` over a HighGUI window and `wait_key`
//!
//! Both release their OpenCV resources on drop, so every exit path of the
//! monitoring loop cleans up.

pub mod camera;
pub mod display;

pub use camera::OpenCvCamera;
pub use display::HighGuiDisplay;
