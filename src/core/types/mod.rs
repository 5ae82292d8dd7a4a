pub mod config;
mod artifacts;
mod error;
mod report;
mod target;

pub use artifacts::*;
pub use error::*;
pub use report::*;
pub use target::*;
