pub mod strategy;
pub mod summary;

pub use strategy::ClangStrategy;
