//! Vigil Monitor
//!
//! Runs the capture → detect → alarm → notify loop on the calling thread.
//!
//! ```text
//! ┌──────────────────────────── Monitor ────────────────────────────┐
//! │  FrameSource ──► MotionDetector ──► AlarmPolicy ──► AlertSink   │
//! │       │                │                                        │
//! │       └── preview ─────┴── mask ──► Display ◄── keys (t / q)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hardware lives behind the traits in [`source`]; everything else is
//! deterministic given the frames and timestamps fed in.

pub mod monitor;
pub mod source;
pub mod startup;

pub use monitor::*;
pub use source::*;
pub use startup::{prepare, Prepared};
