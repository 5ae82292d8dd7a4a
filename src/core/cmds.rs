pub mod coverage;
pub mod targets;

pub use coverage::execute_coverage;
pub use targets::execute_targets;
