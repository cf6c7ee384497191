//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services like the realtime
//! datastore and the push-notification relay.

pub mod notify;
pub mod store;
