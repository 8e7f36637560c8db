#![forbid(unsafe_code)]

pub mod catalog;
pub mod gating;
pub mod model;
pub mod progression;
pub mod time;

pub use catalog::{CatalogError, ContentGraph};
pub use gating::{Completion, GateStatus, GatingResolver};
pub use progression::ProgressionEngine;
pub use time::Clock;
