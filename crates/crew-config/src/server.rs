//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Per-connection notification buffer. A client that falls this far behind is
/// treated as a failed write and dropped from the registry.
const fn default_connection_buffer() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Capacity of each live connection's outgoing message queue.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            connection_buffer: default_connection_buffer(),
        }
    }
}
