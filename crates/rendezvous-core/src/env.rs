//! Environment variable utilities
//!
//! Typed lookups used by the configuration layer. A variable that is unset
//! or fails to parse yields the caller's default, never an error.
//!
//! ```ignore
//! use rendezvous_core::env::{env_get, env_get_bool};
//!
//! let entries: usize = env_get("RDV_INITIAL_ENTRIES", 8);
//! let debug = env_get_bool("RDV_DEBUG", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as `T`, `None` if unset or unparsable
#[inline]
pub fn env_get_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable parsed as `T`, or return default
#[inline]
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// "1", "true", "yes", "on" are true; "0", "false", "no", "off" are false
/// (case-insensitive). Anything else, including unset, is the default.
pub fn env_get_bool(key: &str, default: bool) -> bool {
    let Ok(val) = std::env::var(key) else {
        return default;
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        let val: usize = env_get("__RDV_TEST_UNSET__", 42);
        assert_eq!(val, 42);
        assert!(env_get_opt::<usize>("__RDV_TEST_UNSET__").is_none());
        assert!(env_get_bool("__RDV_TEST_UNSET__", true));
    }

    #[test]
    fn test_env_get_parsed() {
        std::env::set_var("__RDV_TEST_NUM__", " 123 ");
        assert_eq!(env_get::<usize>("__RDV_TEST_NUM__", 0), 123);
        std::env::set_var("__RDV_TEST_NUM__", "lots");
        assert_eq!(env_get::<usize>("__RDV_TEST_NUM__", 9), 9);
        std::env::remove_var("__RDV_TEST_NUM__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        for (raw, expected) in [("1", true), ("Yes", true), ("off", false), ("FALSE", false)] {
            std::env::set_var("__RDV_TEST_BOOL__", raw);
            assert_eq!(env_get_bool("__RDV_TEST_BOOL__", !expected), expected, "{}", raw);
        }
        // Unknown values keep the default either way
        std::env::set_var("__RDV_TEST_BOOL__", "maybe");
        assert!(env_get_bool("__RDV_TEST_BOOL__", true));
        assert!(!env_get_bool("__RDV_TEST_BOOL__", false));
        std::env::remove_var("__RDV_TEST_BOOL__");
    }
}
