//! RAII rendezvous scope
//!
//! `SafepointScope::new` stops every other resident thread; dropping the
//! scope resumes them. A coordinator cannot forget the resume, even when it
//! unwinds out of the stopped region.

use rendezvous_core::{Mutator, ObjectPointerVisitor};

use crate::registry::{RegistryStats, ThreadRegistry};

/// All other resident threads are parked while this is alive
pub struct SafepointScope<'a, M: Mutator> {
    registry: &'a ThreadRegistry<M>,
    round: u64,
}

impl<'a, M: Mutator> SafepointScope<'a, M> {
    /// Blocks until the rendezvous completes
    pub fn new(registry: &'a ThreadRegistry<M>) -> Self {
        registry.safepoint_threads();
        let round = registry.stats().round;
        Self { registry, round }
    }

    /// Round number of this rendezvous
    #[inline]
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn registry(&self) -> &'a ThreadRegistry<M> {
        self.registry
    }

    pub fn visit_zones<F>(&self, visitor: F) -> usize
    where
        F: FnMut(&M::Zone),
    {
        self.registry.visit_zones(visitor)
    }

    pub fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) -> usize {
        self.registry.visit_object_pointers(visitor)
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }
}

impl<M: Mutator> Drop for SafepointScope<'_, M> {
    fn drop(&mut self) {
        self.registry.resume_all_threads();
    }
}
