//! Error types for the thread registry
//!
//! Two classes live here. `RegistryError` covers the few recoverable
//! failures (bad configuration). `InvariantViolation` describes a broken
//! caller contract; it is never returned, only handed to
//! [`fatal`](crate::fatal::fatal).

use core::fmt;

use crate::id::{IsolateId, ThreadId};

/// Result type for registry operations
pub type RegResult<T> = Result<T, RegistryError>;

/// Recoverable registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Configuration rejected by `validate()`
    InvalidConfig(&'static str),

    /// Unknown value for `RDV_FATAL_MODE`
    UnknownFatalMode(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidConfig(why) => write!(f, "invalid registry configuration: {}", why),
            RegistryError::UnknownFatalMode(s) => write!(f, "unknown fatal mode: {:?}", s),
        }
    }
}

impl std::error::Error for RegistryError {}

/// A contract violation that leaves the safepoint invariant unusable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Thread entered while its entry was already scheduled
    EnterWhileScheduled {
        isolate: IsolateId,
        thread: ThreadId,
    },

    /// Re-entry with an exit-frame marker not above the saved one
    ExitFrameNotMonotonic {
        isolate: IsolateId,
        thread: ThreadId,
        saved: usize,
        current: usize,
    },

    /// Exit from a thread that never entered
    ExitWithoutEntry {
        isolate: IsolateId,
        thread: ThreadId,
    },

    /// Exit from a thread that is already parked
    ExitWhileParked {
        isolate: IsolateId,
        thread: ThreadId,
    },

    /// Isolate torn down while a thread is still scheduled on it
    StillScheduled {
        isolate: IsolateId,
        thread: ThreadId,
        os_tid: u64,
    },

    /// The coordinator of the active round called back into the registry
    /// in a way that would wait for its own round to end
    CoordinatorReentry {
        isolate: IsolateId,
        thread: ThreadId,
        operation: &'static str,
    },

    /// Resume with no rendezvous in progress
    ResumeWithoutRendezvous {
        isolate: IsolateId,
        thread: ThreadId,
    },

    /// Resume from a thread other than the one that started the round
    ResumeByNonCoordinator {
        isolate: IsolateId,
        thread: ThreadId,
        coordinator: ThreadId,
    },
}

impl InvariantViolation {
    /// Isolate the violation was detected on
    pub fn isolate(&self) -> IsolateId {
        match self {
            InvariantViolation::EnterWhileScheduled { isolate, .. }
            | InvariantViolation::ExitFrameNotMonotonic { isolate, .. }
            | InvariantViolation::ExitWithoutEntry { isolate, .. }
            | InvariantViolation::ExitWhileParked { isolate, .. }
            | InvariantViolation::StillScheduled { isolate, .. }
            | InvariantViolation::CoordinatorReentry { isolate, .. }
            | InvariantViolation::ResumeWithoutRendezvous { isolate, .. }
            | InvariantViolation::ResumeByNonCoordinator { isolate, .. } => *isolate,
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::EnterWhileScheduled { isolate, thread } => {
                write!(f, "{} entered {} while already scheduled", thread, isolate)
            }
            InvariantViolation::ExitFrameNotMonotonic { isolate, thread, saved, current } => write!(
                f,
                "{} re-entered {} with exit frame {:#x} not above saved exit frame {:#x}",
                thread, isolate, current, saved
            ),
            InvariantViolation::ExitWithoutEntry { isolate, thread } => {
                write!(f, "{} exited {} without an entry", thread, isolate)
            }
            InvariantViolation::ExitWhileParked { isolate, thread } => {
                write!(f, "{} exited {} while not scheduled", thread, isolate)
            }
            InvariantViolation::StillScheduled { isolate, thread, os_tid } => write!(
                f,
                "{} still scheduled on {} (os tid {})",
                isolate, thread, os_tid
            ),
            InvariantViolation::CoordinatorReentry { isolate, thread, operation } => write!(
                f,
                "{} called {} on {} during its own rendezvous",
                thread, operation, isolate
            ),
            InvariantViolation::ResumeWithoutRendezvous { isolate, thread } => write!(
                f,
                "{} resumed {} with no rendezvous in progress",
                thread, isolate
            ),
            InvariantViolation::ResumeByNonCoordinator { isolate, thread, coordinator } => write!(
                f,
                "{} resumed {} but the rendezvous belongs to {}",
                thread, isolate, coordinator
            ),
        }
    }
}
