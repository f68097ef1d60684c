//! Publish lifecycle

pub mod artifacts;
pub mod attachments;
pub mod command;
pub mod fsm;
pub mod git;
pub mod hosting;
pub mod lease;
pub mod publisher;
pub mod round;
pub mod steps;
pub mod target;
