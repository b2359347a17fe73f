//! Non-recoverable abort path
//!
//! A broken registry invariant means GC roots can no longer be trusted,
//! so there is nothing to return to. `fatal` logs the diagnostic and ends
//! the process (`Abort`) or unwinds the calling thread (`Panic`, used by
//! tests and by embedders that install their own panic hook).

use core::fmt;
use core::str::FromStr;
use std::io::Write;

use crate::error::{InvariantViolation, RegistryError};

/// How `fatal` terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalMode {
    /// Print the diagnostic and `abort()` the process
    Abort,

    /// Panic with the diagnostic as the payload
    Panic,
}

impl Default for FatalMode {
    fn default() -> Self {
        FatalMode::Abort
    }
}

impl FromStr for FatalMode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(FatalMode::Abort),
            "panic" => Ok(FatalMode::Panic),
            _ => Err(RegistryError::UnknownFatalMode(s.to_string())),
        }
    }
}

impl fmt::Display for FatalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalMode::Abort => write!(f, "abort"),
            FatalMode::Panic => write!(f, "panic"),
        }
    }
}

/// Report an invariant violation and never return
#[cold]
#[inline(never)]
pub fn fatal(mode: FatalMode, violation: InvariantViolation) -> ! {
    match mode {
        FatalMode::Abort => {
            // Unconditional: the log level must not hide the reason we died
            crate::kprintln!("[FATAL] {}", violation);
            let _ = std::io::stderr().flush();
            std::process::abort()
        }
        FatalMode::Panic => {
            crate::kerror!("{}", violation);
            panic!("fatal: {}", violation)
        }
    }
}
