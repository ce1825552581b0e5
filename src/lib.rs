//! Turns a scripted two-party text conversation into a frame-accurate render
//! plan: when each message appears, how the thread is split into screens, and
//! where an optional sponsor segment lands.

pub mod cache;
pub mod config;
pub mod directives;
pub mod error;
pub mod formats;
pub mod model;
pub mod timeline;

pub use timeline::{ScheduleDiagnostic, ScheduleOutcome, build_schedule};
