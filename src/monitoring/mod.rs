//! Run Reporting Module
//!
//! Utilities for presenting finished runs.
//!
//! # Components
//!
//! - [`RunTimeline`]: Step timings of a run rendered as a Gantt chart

pub mod timeline;

pub use timeline::{render_timeline, RunTimeline, TimelineEntry};
