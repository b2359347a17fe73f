//! # rendezvous - Isolate Thread Registry
//!
//! Keeps track of the OS threads running inside an isolate and lets one of
//! them stop all the others at a safepoint, so a collector can walk every
//! thread's roots while nothing mutates them.
//!
//! ## Features
//!
//! - **Enter/Exit**: threads attach to an isolate and detach with a saved
//!   state that is handed back when they re-enter
//! - **Rendezvous**: `safepoint_threads` / `check_safepoint` /
//!   `resume_all_threads`, with an RAII `SafepointScope`
//! - **Root visiting**: every live or saved zone, each visited once
//! - **Teardown check**: an isolate refuses to die with resident threads
//!
//! ## Quick Start
//!
//! ```ignore
//! use rendezvous::prelude::*;
//!
//! let isolate = Arc::new(Isolate::<MyThread>::new("main", RegistryConfig::default())?);
//!
//! // On each mutator thread
//! let me = MyThread::current();
//! let (_, state) = isolate.enter(&me);
//! loop {
//!     do_work();
//!     isolate.check_safepoint();
//! }
//! isolate.exit(&me, SavedState::new(me.top_exit_frame_info(), me.zone()));
//!
//! // On the collector thread
//! let scope = isolate.safepoint();
//! scope.visit_object_pointers(&mut |addr: usize| mark(addr));
//! drop(scope); // resumes everyone
//! ```
//!
//! ## Environment
//!
//! - `RDV_LOG_LEVEL` - off/error/warn/info/debug/trace (or 0-5)
//! - `RDV_FLUSH_EPRINT` - flush stderr after every log line
//! - `RDV_FATAL_MODE` - `abort` (default) or `panic`
//! - `RDV_INITIAL_ENTRIES` - entry table capacity
//! - `RDV_DEBUG` - log each rendezvous round

// Re-export core types
pub use rendezvous_core::{
    IsolateId,
    ThreadId,
    RendezvousPhase,
    SavedState,
    Mutator,
    Zone,
    ObjectPointerVisitor,
    InvariantViolation,
    RegistryError,
    RegResult,
    FatalMode,
};

// Re-export kprint macros for debug logging
pub use rendezvous_core::{kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use rendezvous_core::kprint::{LogLevel, set_log_level, set_flush_enabled};

// Re-export env utilities
pub use rendezvous_core::{env_get, env_get_bool, env_get_opt};

// Re-export runtime types
pub use rendezvous_runtime::{
    RegistryConfig,
    RegistryStats,
    ThreadRegistry,
    SafepointScope,
    Isolate,
    current_thread_id,
    os_thread_id,
};

/// Everything needed to host mutator threads in an isolate
pub mod prelude {
    pub use super::{
        Isolate, Mutator, ObjectPointerVisitor, RegistryConfig, SafepointScope, SavedState,
        ThreadId, Zone,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    struct Heap {
        roots: Mutex<Vec<usize>>,
    }

    impl Zone for Heap {
        fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) {
            for &addr in self.roots.lock().iter() {
                visitor.visit_pointer(addr);
            }
        }
    }

    struct Worker {
        id: ThreadId,
        heap: Arc<Heap>,
    }

    impl Worker {
        fn current(roots: &[usize]) -> Arc<Self> {
            Arc::new(Self {
                id: current_thread_id(),
                heap: Arc::new(Heap { roots: Mutex::new(roots.to_vec()) }),
            })
        }
    }

    impl Mutator for Worker {
        type Zone = Heap;

        fn thread_id(&self) -> ThreadId {
            self.id
        }

        fn top_exit_frame_info(&self) -> usize {
            0
        }

        fn zone(&self) -> Option<Arc<Heap>> {
            Some(Arc::clone(&self.heap))
        }
    }

    #[test]
    fn test_collect_while_workers_mutate() {
        let config = RegistryConfig::builtin().fatal_mode(FatalMode::Panic);
        let isolate = Arc::new(Isolate::<Worker>::new("facade", config).unwrap());
        let stop = Arc::new(AtomicBool::new(false));

        let workers: Vec<_> = (0..3)
            .map(|i| {
                let (isolate, stop) = (Arc::clone(&isolate), Arc::clone(&stop));
                thread::spawn(move || {
                    let me = Worker::current(&[i]);
                    isolate.enter(&me);
                    while !stop.load(Ordering::Acquire) {
                        // Mutate, then offer a safepoint
                        let mut roots = me.heap.roots.lock();
                        if roots.len() < 1024 {
                            roots.push(i);
                        }
                        drop(roots);
                        isolate.check_safepoint();
                    }
                    isolate.exit(&me, SavedState::new(0, me.zone()));
                })
            })
            .collect();

        for _ in 0..10 {
            let scope = isolate.safepoint();
            let mut first = 0;
            scope.visit_object_pointers(&mut |_addr: usize| first += 1);
            // Nothing moves while stopped
            let mut second = 0;
            scope.visit_object_pointers(&mut |_addr: usize| second += 1);
            assert_eq!(first, second);
        }

        stop.store(true, Ordering::Release);
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(isolate.registry().stats().scheduled, 0);
    }
}
