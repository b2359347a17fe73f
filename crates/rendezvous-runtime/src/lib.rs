//! # rendezvous-runtime
//!
//! The thread registry an isolate uses to bring its resident threads to a
//! safepoint.
//!
//! This crate provides:
//! - The registry lock (`Monitor`, a mutex plus condition variable)
//! - The grow-only entry table, one entry per thread ever seen
//! - Enter/exit bookkeeping for threads crossing into and out of an isolate
//! - The stop/check/resume rendezvous protocol and its RAII scope
//! - Root visitation over live and saved zones
//! - Isolates that own a registry and check it at teardown
//!
//! # Protocol
//!
//! ```text
//!   worker                 registry                 coordinator
//!     │ enter ────────────► scheduled
//!     │                        │ ◄──────────── safepoint_threads
//!     │ check_safepoint ─────► remaining -= 1
//!     │    (blocks)            │ remaining == 0 ─► returns
//!     │                        │ ◄──────────── visit_zones
//!     │                        │ ◄──────────── resume_all_threads
//!     │ ◄── unblocked          │
//!     │ exit ──────────────► parked(saved state)
//! ```

pub mod config;
pub mod tls;
pub mod monitor;
mod entry;
pub mod registry;
pub mod scope;
pub mod isolate;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use config::RegistryConfig;
pub use monitor::{Monitor, MonitorLocker};
pub use registry::{RegistryStats, ThreadRegistry};
pub use scope::SafepointScope;
pub use isolate::Isolate;
pub use tls::{current_thread_id, os_thread_id};
