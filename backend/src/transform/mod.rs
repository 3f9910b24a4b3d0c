//! Transformation module.
//!
//! - Reference: in-process `v * v + 0.5`
//! - Engine: native executable adapter with timeout
//! - Pipeline: staging, engine attempt and fallback

pub mod engine;
pub mod pipeline;
pub mod reference;

pub use engine::{EngineOutcome, EngineRun, ExternalEngine};
pub use pipeline::*;
pub use reference::{transform, transform_series};
