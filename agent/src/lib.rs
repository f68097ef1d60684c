//! Pagesmith library
//!
//! Generates static sites with a coding agent and publishes them to GitHub
//! Pages, creating the repository on round 1 and updating it afterwards.

pub mod app;
pub mod codegen;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod utils;
