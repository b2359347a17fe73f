//! Collaborator traits
//!
//! These traits define the interface between the registry and the
//! runtime that owns threads and zones. The registry never allocates,
//! scans or mutates a zone itself; it only decides which zone belongs to
//! which thread at the moment of a visit.

use std::sync::Arc;

use crate::id::ThreadId;

/// Receives every object pointer found in a zone
pub trait ObjectPointerVisitor {
    /// Visit one root slot
    fn visit_pointer(&mut self, addr: usize);
}

impl<F: FnMut(usize)> ObjectPointerVisitor for F {
    #[inline]
    fn visit_pointer(&mut self, addr: usize) {
        self(addr)
    }
}

/// A thread-private memory region holding GC roots
pub trait Zone: Send + Sync {
    /// Report every object pointer held in this zone
    fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor);
}

/// A worker thread as seen by the registry
///
/// An implementation represents exactly one OS thread: `thread_id()` must
/// return the identity the runtime's thread-local assigned to the thread
/// that calls `enter`/`exit` with it (`rendezvous_runtime::current_thread_id`).
pub trait Mutator: Send + Sync {
    /// Zone type owned by this thread
    type Zone: Zone + ?Sized;

    /// Stable identity of the owning thread
    fn thread_id(&self) -> ThreadId;

    /// Current exit-frame marker (0 when no native frame is active)
    fn top_exit_frame_info(&self) -> usize;

    /// Live zone, consulted only while the thread is scheduled
    fn zone(&self) -> Option<Arc<Self::Zone>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Roots(Vec<usize>);

    impl Zone for Roots {
        fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) {
            for &addr in &self.0 {
                visitor.visit_pointer(addr);
            }
        }
    }

    #[test]
    fn test_closure_visitor() {
        let zone = Roots(vec![0x10, 0x20, 0x30]);
        let mut seen = Vec::new();
        zone.visit_object_pointers(&mut |addr: usize| seen.push(addr));
        assert_eq!(seen, vec![0x10, 0x20, 0x30]);
    }
}
