//! # rendezvous-core
//!
//! Core types and traits for the per-isolate thread registry.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The registry itself, its lock and the thread-local identity live in
//! `rendezvous-runtime`.
//!
//! ## Modules
//!
//! - `id` - Thread and isolate identifier types
//! - `state` - Entry residency, saved thread state and rendezvous phase
//! - `traits` - Collaborator seams (mutator threads, zones, root visitors)
//! - `error` - Recoverable errors and invariant violations
//! - `fatal` - Non-recoverable abort path for invariant violations
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod state;
pub mod traits;
pub mod error;
pub mod fatal;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::{IsolateId, ThreadId};
pub use state::{RendezvousPhase, Residency, SavedState};
pub use traits::{Mutator, ObjectPointerVisitor, Zone};
pub use error::{InvariantViolation, RegResult, RegistryError};
pub use fatal::{fatal, FatalMode};
pub use env::{env_get, env_get_bool, env_get_opt};
