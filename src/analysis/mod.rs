/// Analysis layer: per-variable statistics and pairwise correlation over a
/// filtered [`Dataset`](crate::data::model::Dataset), plus display helpers.
pub mod correlation;
pub mod report;
pub mod stats;
