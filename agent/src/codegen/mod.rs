//! Code-generation agent collaborator

pub mod parser;
pub mod prompt;
pub mod runner;
