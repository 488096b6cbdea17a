//! Concrete per-trait pipeline steps.

mod estimate;
mod fetch;
mod merge;

pub use estimate::EstimateStep;
pub use fetch::FetchStep;
pub use merge::MergeStep;
