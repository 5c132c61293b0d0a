//! Socket transport layer
//!
//! Framing and connection setup shared by the request/reply and
//! publish/subscribe adapters.

use std::time::Duration;

pub mod tcp;

pub use tcp::{encode_frame, FrameReader, FrameWriter};

/// TCP transport configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Maximum frame size, headers included
    pub max_message_size: usize,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024, // 16MB
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl TcpConfig {
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}
