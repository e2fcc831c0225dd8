//! Development server with live reload support.
//!
//! ```text
//! GET  /  → page built from the registry snapshot
//! HEAD /  → long-poll on If-Modified-Since (200 / 304 / 503)
//! ```
//!
//! Every request gets its own thread: parked polls must not starve page
//! loads.

mod lifecycle;
mod page;
mod response;


use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossbeam::channel::{self, Receiver};
use tiny_http::{Method, Request, Server};

use crate::cli::ServeArgs;
use crate::config::Config;
use crate::live::{FileRegistry, new_registry};
use crate::utils::path::unique_absolute_paths;
use crate::watch::spawn_watcher;
use crate::{debug, log};

/// Everything a request handler needs.
#[derive(Clone)]
pub struct ServeContext {
    pub registry: Arc<FileRegistry>,
    /// Render service base URL.
    pub server: String,
    pub poll_timeout: Duration,
    /// Disconnects on shutdown.
    pub cancel: Receiver<()>,
}

/// `plantlink serve`: register every file, then serve until Ctrl+C.
pub fn serve(config: &Config, args: &ServeArgs) -> Result<()> {
    let files = unique_absolute_paths(&args.files);
    if files.is_empty() {
        bail!("serve needs at least one file");
    }

    let registry = new_registry();
    register_files(&registry, &files)?;

    // Watch before serving so no save between startup and the first poll
    // is lost.
    let _watcher = spawn_watcher(&files, Arc::clone(&registry), config.serve.debounce())?;

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (cancel_tx, cancel_rx) = channel::bounded::<()>(0);
    lifecycle::register_shutdown(Arc::clone(&server), cancel_tx)?;

    log!("serve"; "http://{}", addr);
    log!("serve"; "watching {} file(s), Ctrl+C to stop", registry.len());

    let ctx = ServeContext {
        registry,
        server: config.render.server.clone(),
        poll_timeout: config.serve.poll_timeout(),
        cancel: cancel_rx,
    };
    run_request_loop(&server, &ctx);

    let broker = ctx.registry.broker();
    if !broker.is_empty() {
        debug!("serve"; "{} poll(s) released on shutdown", broker.len());
    }
    Ok(())
}

/// Read and register every file; the first failure aborts.
fn register_files(registry: &FileRegistry, files: &[PathBuf]) -> Result<()> {
    for path in files {
        let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        registry
            .put_file(path, raw)
            .with_context(|| format!("Failed to encode {}", path.display()))?;
        debug!("serve"; "registered {}", path.display());
    }
    Ok(())
}

/// Accept requests until the server is unblocked.
fn run_request_loop(server: &Server, ctx: &ServeContext) {
    for request in server.incoming_requests() {
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name("plantlink-http".into())
            .spawn(move || {
                if let Err(e) = handle_request(request, &ctx) {
                    log!("serve"; "request error: {e}");
                }
            });
        if let Err(e) = spawned {
            log!("serve"; "failed to spawn request thread: {e}");
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    let path = request.url().split('?').next().unwrap_or_default();
    debug!("serve"; "{} {}", request.method(), request.url());

    if path != "/" {
        return response::respond_not_found(request);
    }

    match request.method() {
        Method::Get => response::respond_page(request, ctx),
        Method::Head => response::respond_poll(request, ctx),
        _ => response::respond_method_not_allowed(request),
    }
}
