//! Application wiring

pub mod options;
pub mod pipeline;
pub mod run;
pub mod settings;
