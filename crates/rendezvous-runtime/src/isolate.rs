//! Isolates
//!
//! An `Isolate` owns the registry of threads that run its code. Threads
//! enter and exit through the isolate; a collector stops them through
//! [`Isolate::safepoint`]. Dropping an isolate while any thread is still
//! scheduled in it is an invariant violation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rendezvous_core::{kdebug, IsolateId, Mutator, RegResult};

use crate::config::RegistryConfig;
use crate::entry::StateOf;
use crate::registry::ThreadRegistry;
use crate::scope::SafepointScope;

static NEXT_ISOLATE_ID: AtomicU64 = AtomicU64::new(1);

/// Execution context shared by a set of threads
pub struct Isolate<M: Mutator> {
    id: IsolateId,
    name: String,
    registry: ThreadRegistry<M>,
}

impl<M: Mutator> Isolate<M> {
    pub fn new(name: impl Into<String>, config: RegistryConfig) -> RegResult<Self> {
        let id = IsolateId::new(NEXT_ISOLATE_ID.fetch_add(1, Ordering::Relaxed));
        let name = name.into();
        let registry = ThreadRegistry::new(id, config)?;
        kdebug!("created {} ({})", id, name);
        Ok(Self { id, name, registry })
    }

    #[inline]
    pub fn id(&self) -> IsolateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn registry(&self) -> &ThreadRegistry<M> {
        &self.registry
    }

    /// See [`ThreadRegistry::enter`]
    pub fn enter(&self, thread: &Arc<M>) -> (bool, StateOf<M>) {
        self.registry.enter(thread)
    }

    /// See [`ThreadRegistry::exit`]
    pub fn exit(&self, thread: &M, state: StateOf<M>) {
        self.registry.exit(thread, state)
    }

    #[inline]
    pub fn check_safepoint(&self) {
        self.registry.check_safepoint()
    }

    /// Stop every other resident thread until the scope drops
    pub fn safepoint(&self) -> SafepointScope<'_, M> {
        self.registry.safepoint()
    }
}

impl<M: Mutator> Drop for Isolate<M> {
    fn drop(&mut self) {
        // Don't turn an unwind into an abort
        if std::thread::panicking() {
            return;
        }
        self.registry.assert_none_scheduled();
        kdebug!("shut down {} ({})", self.id, self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{panic_config, TestThread, TestZone};
    use rendezvous_core::SavedState;
    use std::thread;

    fn new_isolate(name: &str) -> Arc<Isolate<TestThread>> {
        Arc::new(Isolate::new(name, panic_config()).unwrap())
    }

    #[test]
    fn test_ids_unique() {
        let a = new_isolate("a");
        let b = new_isolate("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.registry().isolate(), a.id());
        assert_eq!(b.name(), "b");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = panic_config().initial_entries(usize::MAX);
        assert!(Isolate::<TestThread>::new("big", config).is_err());
    }

    #[test]
    fn test_enter_exit_then_drop() {
        let iso = new_isolate("main");
        let me = TestThread::current();
        me.set_zone(Some(TestZone::new(&[1])));

        let (existed, _) = iso.enter(&me);
        assert!(!existed);
        iso.check_safepoint();
        iso.exit(&me, SavedState::new(0x40, me.zone()));

        let (existed, state) = iso.enter(&me);
        assert!(existed);
        assert_eq!(state.top_exit_frame_info, 0x40);
        iso.exit(&me, state);
    }

    #[test]
    fn test_safepoint_through_isolate() {
        let iso = new_isolate("gc");
        let iso2 = Arc::clone(&iso);
        thread::spawn(move || {
            let me = TestThread::current();
            iso2.enter(&me);
            iso2.exit(&me, SavedState::new(0, Some(TestZone::new(&[5, 6]))));
        })
        .join()
        .unwrap();

        let scope = iso.safepoint();
        let mut roots = Vec::new();
        scope.visit_object_pointers(&mut |addr: usize| roots.push(addr));
        assert_eq!(roots, vec![5, 6]);
    }

    #[test]
    #[should_panic(expected = "still scheduled on")]
    fn test_drop_with_scheduled_thread_is_fatal() {
        let iso = Isolate::<TestThread>::new("leaky", panic_config()).unwrap();
        let me = TestThread::current();
        iso.enter(&me);
        drop(iso);
    }
}
