//! Core domain models
//!
//! This module contains the fundamental types used throughout the crate:
//! - Target definitions loaded from declarative descriptors
//! - Decision results produced by the update engine
//! - Run report structures consumed by the output layer

mod decision;
mod report;
mod target;

pub use decision::{Decision, DecisionStatus, ProbeFailure};
pub use report::{ActionDisposition, ActionOutcome, RunReport, TargetReport};
pub use target::{ActionSpec, SourceDescriptor, Target};
