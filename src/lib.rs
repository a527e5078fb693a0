//! Freehand drawing on top of a pan/zoom image view.
//!
//! Strokes are captured from pointer events in view-space, stored in source-space, and rendered
//! back into the current view-space as smoothed quadratic curves.

pub mod capture;
pub mod config;
pub mod math;
pub mod path;
pub mod render;
pub mod viewport;
