//! Storage provider server library
//!
//! The daemon in `main.rs` wires these modules together; integration tests
//! drive them directly.

pub mod activity;
pub mod args;
pub mod connection;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod provider;
pub mod server;
pub mod sessions;
pub mod store;
pub mod transfers;

use std::sync::Arc;

use activity::ActivityTracker;
use provider::Provider;
use sessions::SessionManager;
use store::{EntityStore, StoreOptions};

/// Build a provider over a fresh store holding `roots`
pub fn build_provider(
    roots: &[String],
    options: StoreOptions,
    max_upload_size: u64,
    activity: Arc<ActivityTracker>,
) -> Provider {
    let store = Arc::new(EntityStore::new(options));
    for name in roots {
        store.add_root(name);
    }
    let sessions = Arc::new(SessionManager::new(store, max_upload_size, activity));
    Provider::new(sessions)
}
