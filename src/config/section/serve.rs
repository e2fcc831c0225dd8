//! `[serve]` section: the live preview server.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # "0.0.0.0" to reach the page from other machines
//! port = 8080               # next free port is tried when taken
//! poll_timeout = 60         # seconds a reload poll stays open
//! debounce_ms = 100         # quiet time before a saved file is re-read
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::Deserialize;

use crate::live::DEFAULT_POLL_TIMEOUT;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Address to listen on; loopback by default.
    pub interface: IpAddr,
    pub port: u16,
    /// Seconds a `HEAD /` poll waits for a change before answering 304.
    pub poll_timeout: u64,
    /// Milliseconds of quiet after a file event before it is processed.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            poll_timeout: DEFAULT_POLL_TIMEOUT.as_secs(),
            debounce_ms: 100,
        }
    }
}

impl ServeConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
