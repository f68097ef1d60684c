//! Server state

use std::sync::Arc;

use crate::app::pipeline::Deployer;

/// Server state shared across handlers
pub struct ServerState {
    pub deployer: Arc<dyn Deployer>,
}

impl ServerState {
    pub fn new(deployer: Arc<dyn Deployer>) -> Self {
        Self { deployer }
    }
}
