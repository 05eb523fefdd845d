use std::sync::Arc;

use tracing::info;

use crate::error::StartError;
use crate::runner::ContinuousRunner;

/// External control surface: lifecycle and the enable gate, nothing else.
/// Holds the runner by handle and never reaches into its internals.
pub struct Controller {
    runner: Arc<ContinuousRunner>,
}

impl Controller {
    pub fn new(runner: Arc<ContinuousRunner>) -> Self {
        Self { runner }
    }

    pub fn start(&self) -> Result<(), StartError> {
        self.runner.start()
    }

    pub fn stop(&self) {
        self.runner.stop();
    }

    pub fn set_enabled(&self, enabled: bool) {
        info!(enabled, "request sending toggled");
        self.runner.set_enabled(enabled);
    }

    pub fn enabled(&self) -> bool {
        self.runner.enabled()
    }
}
