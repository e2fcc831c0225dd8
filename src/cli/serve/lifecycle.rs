//! Server lifecycle management.

use crate::log;
use anyhow::{Result, anyhow};
use crossbeam::channel::Sender;
use std::{net::SocketAddr, sync::Arc};
use tiny_http::Server;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(
    interface: std::net::IpAddr,
    base_port: u16,
) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts starting at port {}: {}",
        MAX_PORT_RETRIES,
        base_port,
        last_error.map_or_else(|| "port range exhausted".to_string(), |e| e.to_string())
    ))
}

/// Install the Ctrl+C handler for a running server.
///
/// On signal: drop `cancel` (every parked poll resolves as cancelled) and
/// unblock the request loop.
pub fn register_shutdown(server: Arc<Server>, cancel: Sender<()>) -> Result<()> {
    let mut cancel = Some(cancel);
    ctrlc::set_handler(move || {
        if cancel.take().is_some() {
            log!("serve"; "shutting down...");
        }
        server.unblock();
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))
}
