//! Local stand-in for a render service.
//!
//! `/ok/...` answers 200 with `rendered:<request path>`; every other path
//! answers 500.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use tiny_http::{Response, Server, StatusCode};

pub struct StubRenderServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl StubRenderServer {
    pub fn start() -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();

        let worker = Arc::clone(&server);
        thread::spawn(move || {
            for request in worker.incoming_requests() {
                let path = request.url().to_string();
                let response = if path.starts_with("/ok/") {
                    Response::from_string(format!("rendered:{path}"))
                } else {
                    Response::from_string("render failed").with_status_code(StatusCode(500))
                };
                let _ = request.respond(response);
            }
        });

        Self { server, addr }
    }

    /// Server URL that renders successfully.
    pub fn ok_url(&self) -> String {
        format!("http://{}/ok", self.addr)
    }

    /// Server URL whose every render fails with 500.
    pub fn failing_url(&self) -> String {
        format!("http://{}/fail", self.addr)
    }
}

impl Drop for StubRenderServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}
