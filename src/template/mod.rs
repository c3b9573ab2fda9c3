//! Needle preparation for template matching.

mod plan;

pub use plan::TemplatePlan;
