//! Test doubles shared by the unit tests in this crate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rendezvous_core::{FatalMode, IsolateId, Mutator, ObjectPointerVisitor, ThreadId, Zone};

use crate::config::RegistryConfig;
use crate::registry::ThreadRegistry;
use crate::tls;

pub(crate) struct TestZone {
    pub(crate) roots: Vec<usize>,
}

impl TestZone {
    pub(crate) fn new(roots: &[usize]) -> Arc<Self> {
        Arc::new(Self { roots: roots.to_vec() })
    }
}

impl Zone for TestZone {
    fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) {
        for &addr in &self.roots {
            visitor.visit_pointer(addr);
        }
    }
}

pub(crate) struct TestThread {
    id: ThreadId,
    exit_frame: AtomicUsize,
    zone: Mutex<Option<Arc<TestZone>>>,
}

impl TestThread {
    /// Handle for the calling OS thread
    pub(crate) fn current() -> Arc<Self> {
        Self::with_id(tls::current_thread_id())
    }

    pub(crate) fn with_id(id: ThreadId) -> Arc<Self> {
        Arc::new(Self {
            id,
            exit_frame: AtomicUsize::new(0),
            zone: Mutex::new(None),
        })
    }

    pub(crate) fn set_exit_frame(&self, marker: usize) {
        self.exit_frame.store(marker, Ordering::Relaxed);
    }

    pub(crate) fn set_zone(&self, zone: Option<Arc<TestZone>>) {
        *self.zone.lock() = zone;
    }
}

impl Mutator for TestThread {
    type Zone = TestZone;

    fn thread_id(&self) -> ThreadId {
        self.id
    }

    fn top_exit_frame_info(&self) -> usize {
        self.exit_frame.load(Ordering::Relaxed)
    }

    fn zone(&self) -> Option<Arc<TestZone>> {
        self.zone.lock().clone()
    }
}

pub(crate) fn panic_config() -> RegistryConfig {
    RegistryConfig::builtin().fatal_mode(FatalMode::Panic)
}

pub(crate) fn new_registry() -> Arc<ThreadRegistry<TestThread>> {
    Arc::new(ThreadRegistry::new(IsolateId::new(1), panic_config()).unwrap())
}

/// Spin (politely) until `cond` holds; panics after five seconds
pub(crate) fn wait_until<F: FnMut() -> bool>(what: &str, mut cond: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(1));
    }
}
