pub mod cli;
pub mod cmds;
pub mod dispatch;
pub mod engine;
pub mod logging;
pub mod main_shared;
pub mod preconditions;
pub mod types;
