pub mod backends;
pub mod core;

// Re-export key items for easy importing in this crate
pub use crate::core::types;

// Re-export key items for easy importing in tests and other crates
pub use crate::core::cmds::{execute_coverage, execute_targets};
pub use crate::core::dispatch::{BackendRequest, select_strategy};
pub use crate::core::engine::pipeline::report_targets;
pub use crate::core::engine::runner::{Capture, Invocation, SystemRunner, ToolOutput, ToolRunner};
pub use crate::core::engine::traits::{CoverageStrategy, RunContext};
pub use crate::core::main_shared::{exit_code, run_main};
pub use crate::core::preconditions::{BUILD_MANIFEST, RunPaths};
