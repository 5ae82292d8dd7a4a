pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod traits;
