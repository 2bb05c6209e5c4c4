//! WebSocket configuration

use serde::Deserialize;

use super::error::ValidationError;

/// WebSocket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    /// Outbound queue depth per connection.
    ///
    /// A connection that falls this many messages behind starts losing
    /// events (it reconciles on reconnect).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl WebSocketConfig {
    /// Validate websocket configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        Ok(())
    }
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}
