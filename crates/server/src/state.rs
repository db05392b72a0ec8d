use std::sync::Arc;
use std::time::Duration;

use agora_core::Config;
use agora_llm::{ChatStreamProvider, OpenAiProvider};

/// Immutable per-process state shared by every request.
pub struct AppState {
    pub provider: Arc<dyn ChatStreamProvider>,
    /// Delay after each relayed fragment.
    pub pacing: Duration,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatStreamProvider>, pacing: Duration) -> Self {
        Self { provider, pacing }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(OpenAiProvider::from_config(&config.llm)),
            config.relay.pacing(),
        )
    }
}
