//! Registry configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use rendezvous_runtime::config::RegistryConfig;
//! use rendezvous_core::FatalMode;
//!
//! let config = RegistryConfig::from_env()
//!     .fatal_mode(FatalMode::Panic)
//!     .initial_entries(64);
//! config.validate()?;
//! ```

pub mod defaults;

use rendezvous_core::env::{env_get, env_get_bool};
use rendezvous_core::{FatalMode, RegResult, RegistryError};

/// Registry configuration with builder pattern.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// What an invariant violation does to the process
    pub fatal_mode: FatalMode,
    /// Entry table capacity reserved at creation
    pub initial_entries: usize,
    /// Log every rendezvous round at debug level
    pub debug_logging: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RegistryConfig {
    /// Library defaults, ignoring the environment
    pub fn builtin() -> Self {
        Self {
            fatal_mode: defaults::FATAL_MODE,
            initial_entries: defaults::INITIAL_ENTRIES,
            debug_logging: defaults::DEBUG_LOGGING,
        }
    }

    /// Create config from defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `RDV_FATAL_MODE` - `abort` or `panic`
    /// - `RDV_INITIAL_ENTRIES` - Entry table capacity reserved up front
    /// - `RDV_DEBUG` - Per-round debug logging (0/1)
    pub fn from_env() -> Self {
        Self {
            fatal_mode: env_get("RDV_FATAL_MODE", defaults::FATAL_MODE),
            initial_entries: env_get("RDV_INITIAL_ENTRIES", defaults::INITIAL_ENTRIES),
            debug_logging: env_get_bool("RDV_DEBUG", defaults::DEBUG_LOGGING),
        }
    }

    pub fn fatal_mode(mut self, mode: FatalMode) -> Self {
        self.fatal_mode = mode;
        self
    }

    pub fn initial_entries(mut self, n: usize) -> Self {
        self.initial_entries = n;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> RegResult<()> {
        if self.initial_entries > defaults::MAX_INITIAL_ENTRIES {
            return Err(RegistryError::InvalidConfig("initial_entries exceeds maximum"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults() {
        let config = RegistryConfig::builtin();
        assert_eq!(config.fatal_mode, FatalMode::Abort);
        assert_eq!(config.initial_entries, defaults::INITIAL_ENTRIES);
        assert!(!config.debug_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::builtin()
            .fatal_mode(FatalMode::Panic)
            .initial_entries(32)
            .debug_logging(true);
        assert_eq!(config.fatal_mode, FatalMode::Panic);
        assert_eq!(config.initial_entries, 32);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_validate_rejects_huge_table() {
        let config = RegistryConfig::builtin().initial_entries(defaults::MAX_INITIAL_ENTRIES + 1);
        assert_eq!(
            config.validate(),
            Err(RegistryError::InvalidConfig("initial_entries exceeds maximum"))
        );
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("RDV_FATAL_MODE", "panic");
        std::env::set_var("RDV_INITIAL_ENTRIES", "128");
        let config = RegistryConfig::from_env();
        assert_eq!(config.fatal_mode, FatalMode::Panic);
        assert_eq!(config.initial_entries, 128);

        // Garbage falls back to the default
        std::env::set_var("RDV_FATAL_MODE", "explode");
        assert_eq!(RegistryConfig::from_env().fatal_mode, defaults::FATAL_MODE);

        std::env::remove_var("RDV_FATAL_MODE");
        std::env::remove_var("RDV_INITIAL_ENTRIES");
    }
}
