//! CLI layer: argument parsing, scene loading and command dispatch

pub mod args;
pub mod commands;
pub mod output;
pub mod scene;

pub use args::{Cli, Commands};
