//! Entry residency, saved thread state and rendezvous phase

use core::fmt;
use std::sync::Arc;

/// Execution state a thread leaves behind when it exits an isolate
///
/// Captured on exit and handed back on the next enter of the same thread.
/// A first enter receives `SavedState::default()`.
pub struct SavedState<Z: ?Sized> {
    /// Exit-frame marker; 0 means no native frame is on the stack
    pub top_exit_frame_info: usize,

    /// The thread's private zone, if it owns one
    pub zone: Option<Arc<Z>>,
}

impl<Z: ?Sized> SavedState<Z> {
    pub fn new(top_exit_frame_info: usize, zone: Option<Arc<Z>>) -> Self {
        Self { top_exit_frame_info, zone }
    }

    /// True if this is the empty snapshot handed out on first entry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top_exit_frame_info == 0 && self.zone.is_none()
    }
}

impl<Z: ?Sized> Default for SavedState<Z> {
    fn default() -> Self {
        Self { top_exit_frame_info: 0, zone: None }
    }
}

impl<Z: ?Sized> Clone for SavedState<Z> {
    fn clone(&self) -> Self {
        Self {
            top_exit_frame_info: self.top_exit_frame_info,
            zone: self.zone.clone(),
        }
    }
}

impl<Z: ?Sized> fmt::Debug for SavedState<Z> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedState")
            .field("top_exit_frame_info", &format_args!("{:#x}", self.top_exit_frame_info))
            .field("zone", &self.zone.as_ref().map(|z| Arc::as_ptr(z) as *const ()))
            .finish()
    }
}

/// Whether a thread is running isolate code or parked outside it
///
/// Saved state exists exactly while parked, so a scheduled entry can never
/// carry a stale or half-written snapshot.
#[derive(Debug, Clone)]
pub enum Residency<S> {
    /// Actively running isolate code
    Scheduled,

    /// Exited, holding the state to restore on re-entry
    Parked(S),
}

impl<S> Residency<S> {
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Residency::Scheduled)
    }

    #[inline]
    pub fn is_parked(&self) -> bool {
        matches!(self, Residency::Parked(_))
    }

    /// Saved state, if parked
    #[inline]
    pub fn saved(&self) -> Option<&S> {
        match self {
            Residency::Parked(state) => Some(state),
            Residency::Scheduled => None,
        }
    }

    /// Switch to `Scheduled`, returning the saved state if there was one
    #[inline]
    pub fn schedule(&mut self) -> Option<S> {
        match core::mem::replace(self, Residency::Scheduled) {
            Residency::Parked(state) => Some(state),
            Residency::Scheduled => None,
        }
    }
}

/// Phase of the rendezvous state machine
///
/// `Idle -> Requested -> Stopped -> Idle`. A round is `Requested` while
/// some scheduled thread has yet to reach its checkpoint, and `Stopped`
/// once all of them have, until the coordinator resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RendezvousPhase {
    Idle = 0,
    Requested = 1,
    Stopped = 2,
}

impl RendezvousPhase {
    /// Derive the phase from the controller's raw fields
    #[inline]
    pub const fn from_counters(in_rendezvous: bool, remaining: usize) -> Self {
        if !in_rendezvous {
            RendezvousPhase::Idle
        } else if remaining > 0 {
            RendezvousPhase::Requested
        } else {
            RendezvousPhase::Stopped
        }
    }
}

impl fmt::Display for RendezvousPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendezvousPhase::Idle => write!(f, "IDLE"),
            RendezvousPhase::Requested => write!(f, "REQUESTED"),
            RendezvousPhase::Stopped => write!(f, "STOPPED"),
        }
    }
}
