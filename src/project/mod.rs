//! Project configuration, model graph and run orchestration

pub mod config;
pub mod graph;
pub mod runner;

pub use config::{ConfigError, ModelOverride, ProjectConfig, sample_config};
pub use graph::{ModelGraph, ModelRef};
pub use runner::{ModelResult, ModelStatus, RunError, RunOptions, RunResult, Runner};
