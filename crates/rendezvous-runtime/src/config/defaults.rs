//! Library defaults for `RegistryConfig`

use rendezvous_core::FatalMode;

/// Terminate the process on invariant violations
pub const FATAL_MODE: FatalMode = FatalMode::Abort;

/// Entry table capacity reserved up front
pub const INITIAL_ENTRIES: usize = 8;

/// Upper bound accepted for `initial_entries`
pub const MAX_INITIAL_ENTRIES: usize = 1 << 16;

/// Per-round debug logging
pub const DEBUG_LOGGING: bool = false;
