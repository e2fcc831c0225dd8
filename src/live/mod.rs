//! Live content shared between the watcher and the HTTP server.
//!
//! # Architecture
//!
//! ```text
//! watcher ──put_file──► FileRegistry ──notify_all──► SubscriptionBroker
//!                            ▲                              │
//!                            │ get_files                    │ wake-up
//!                        GET /  handler          HEAD / handler (LongPoll)
//! ```
//!
//! Nothing here is global: `serve` builds one registry and hands an `Arc`
//! to every collaborator.

mod broker;
mod poll;
mod registry;


pub use broker::SubscriptionBroker;
pub use poll::{DEFAULT_POLL_TIMEOUT, LongPoll, PollOutcome};
pub use registry::{FileEntry, FileRegistry, PutOutcome};

use std::sync::Arc;

/// Build an empty registry with its own broker.
pub fn new_registry() -> Arc<FileRegistry> {
    Arc::new(FileRegistry::new(Arc::new(SubscriptionBroker::new())))
}
