//! Thread registry for one isolate
//!
//! Tracks every thread that has ever entered the isolate and implements the
//! safepoint rendezvous on top of that table. Everything is serialized by a
//! single `Monitor`; there are no per-entry locks and no lock-free paths.
//!
//! # Rendezvous
//!
//! A coordinator calls [`ThreadRegistry::safepoint_threads`]. That counts
//! the scheduled threads other than the coordinator into `remaining`, bumps
//! `round` and waits until every one of them has arrived in
//! [`ThreadRegistry::check_safepoint`] (or in `exit`, which is a checkpoint
//! too). Arrival is recorded per entry as the round it was counted in, so a
//! thread that wakes several times inside one round still counts once, and
//! a thread that misses a resume and finds a fresh round counts again.
//! Threads trying to enter while a round is active wait for the resume.
//!
//! Stopping is cooperative: a resident thread that never polls stalls the
//! coordinator forever. Waits have no timeout.
//!
//! # Identity
//!
//! `Mutator::thread_id()` must be `tls::current_thread_id()` of the thread
//! that passes it to `enter`/`exit`; `check_safepoint`, `safepoint_threads`
//! and `resume_all_threads` identify their caller the same way.

use std::collections::HashSet;
use std::sync::Arc;

use rendezvous_core::{fatal, InvariantViolation, IsolateId, Mutator, ObjectPointerVisitor};
use rendezvous_core::{RegResult, RendezvousPhase, Residency, SavedState, ThreadId, Zone};
use rendezvous_core::{kdebug, ktrace, kwarn};

use crate::config::RegistryConfig;
use crate::entry::{Entry, EntryTable, StateOf};
use crate::monitor::{Monitor, MonitorLocker};
use crate::scope::SafepointScope;
use crate::tls;

/// Everything the registry lock protects
pub(crate) struct RegistryState<M: Mutator> {
    pub(crate) entries: EntryTable<M>,

    /// A rendezvous request is in progress
    pub(crate) in_rendezvous: bool,

    /// Scheduled threads yet to reach their checkpoint this round
    pub(crate) remaining: usize,

    /// Current (or last) round; 0 before the first rendezvous
    pub(crate) round: u64,

    /// Thread that started the active round, NONE when idle
    pub(crate) coordinator: ThreadId,
}

impl<M: Mutator> RegistryState<M> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: EntryTable::with_capacity(capacity),
            in_rendezvous: false,
            remaining: 0,
            round: 0,
            coordinator: ThreadId::NONE,
        }
    }

    /// Count `id` as parked for the current round
    ///
    /// Returns false (and changes nothing) if the thread has no scheduled
    /// entry or was already counted in this round.
    pub(crate) fn record_arrival(&mut self, id: ThreadId) -> bool {
        let round = self.round;
        match self.entries.find_mut(id) {
            Some(entry) if entry.is_scheduled() && entry.counted_round != round => {
                entry.counted_round = round;
                debug_assert!(self.remaining > 0, "arrival of {} with none remaining", id);
                self.remaining = self.remaining.saturating_sub(1);
                true
            }
            _ => false,
        }
    }
}

/// Point-in-time view of a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Entries ever created
    pub entries: usize,
    /// Entries currently scheduled
    pub scheduled: usize,
    pub in_rendezvous: bool,
    pub remaining: usize,
    pub round: u64,
    pub phase: RendezvousPhase,
}

/// Unordered collection of threads relating to one isolate
pub struct ThreadRegistry<M: Mutator> {
    isolate: IsolateId,
    config: RegistryConfig,
    monitor: Monitor<RegistryState<M>>,
}

impl<M: Mutator> ThreadRegistry<M> {
    /// Create an empty registry for `isolate`
    pub fn new(isolate: IsolateId, config: RegistryConfig) -> RegResult<Self> {
        config.validate()?;
        Ok(Self {
            isolate,
            monitor: Monitor::new(RegistryState::new(config.initial_entries)),
            config,
        })
    }

    #[inline]
    pub fn isolate(&self) -> IsolateId {
        self.isolate
    }

    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[cold]
    fn violation(&self, violation: InvariantViolation) -> ! {
        fatal(self.config.fatal_mode, violation)
    }

    fn check_not_coordinator(&self, state: &RegistryState<M>, id: ThreadId, operation: &'static str) {
        if state.in_rendezvous && state.coordinator == id {
            self.violation(InvariantViolation::CoordinatorReentry {
                isolate: self.isolate,
                thread: id,
                operation,
            });
        }
    }

    // ========================================================================
    // Enter / exit
    // ========================================================================

    /// Attach the calling thread to the isolate
    ///
    /// Waits out any rendezvous in progress. Returns `(true, saved)` if the
    /// thread had entered before, handing back the state it left on exit,
    /// or `(false, SavedState::default())` on first entry.
    pub fn enter(&self, thread: &Arc<M>) -> (bool, StateOf<M>) {
        let id = thread.thread_id();
        debug_assert_eq!(id, tls::current_thread_id(), "enter called on behalf of another thread");

        let mut ml = self.monitor.lock();
        self.check_not_coordinator(&ml, id, "enter");
        ml.wait_while(|s| s.in_rendezvous);

        let marker = thread.top_exit_frame_info();
        let round = ml.round;
        if let Some(entry) = ml.entries.find_mut(id) {
            let saved = match entry.residency.saved() {
                Some(state) => state.top_exit_frame_info,
                None => self.violation(InvariantViolation::EnterWhileScheduled {
                    isolate: self.isolate,
                    thread: id,
                }),
            };
            // Re-entry with isolate frames in between is not supported
            if saved != 0 && marker != 0 && marker <= saved {
                self.violation(InvariantViolation::ExitFrameNotMonotonic {
                    isolate: self.isolate,
                    thread: id,
                    saved,
                    current: marker,
                });
            }
            // Same identity; only the handle is refreshed
            entry.thread = Arc::clone(thread);
            let state = entry.residency.schedule().unwrap_or_default();
            ktrace!("{} re-entered {}", id, self.isolate);
            return (true, state);
        }

        ml.entries
            .insert(Entry::scheduled(Arc::clone(thread), tls::os_thread_id(), round));
        ktrace!("{} entered {} (entry #{})", id, self.isolate, ml.entries.len());
        (false, SavedState::default())
    }

    /// Detach the calling thread, parking it with `state`
    ///
    /// Exiting is a safepoint: during a rendezvous the thread first counts
    /// as arrived and waits for the resume, then exits.
    pub fn exit(&self, thread: &M, state: StateOf<M>) {
        let id = thread.thread_id();
        debug_assert_eq!(id, tls::current_thread_id(), "exit called on behalf of another thread");

        let mut ml = self.monitor.lock();
        self.check_safepoint_locked(&mut ml, id, "exit");

        match ml.entries.find_mut(id) {
            None => self.violation(InvariantViolation::ExitWithoutEntry {
                isolate: self.isolate,
                thread: id,
            }),
            Some(entry) if !entry.is_scheduled() => {
                self.violation(InvariantViolation::ExitWhileParked {
                    isolate: self.isolate,
                    thread: id,
                })
            }
            Some(entry) => entry.residency = Residency::Parked(state),
        }
        ktrace!("{} exited {}", id, self.isolate);
    }

    /// True if `thread` has ever entered this isolate
    pub fn contains(&self, thread: ThreadId) -> bool {
        self.monitor.lock().entries.find(thread).is_some()
    }

    /// Fatal unless every entry is parked; run before isolate teardown
    pub fn assert_none_scheduled(&self) {
        let ml = self.monitor.lock();
        if let Some(entry) = ml.entries.iter().find(|e| e.is_scheduled()) {
            self.violation(InvariantViolation::StillScheduled {
                isolate: self.isolate,
                thread: entry.id,
                os_tid: entry.os_tid,
            });
        };
    }

    // ========================================================================
    // Rendezvous
    // ========================================================================

    /// Bring every other scheduled thread to a safepoint
    ///
    /// The caller must itself be at a safepoint. If another round is in
    /// progress the caller first cooperates with it and waits for its
    /// resume. Returns once all counted threads have arrived; they stay
    /// parked until [`resume_all_threads`](Self::resume_all_threads).
    pub fn safepoint_threads(&self) {
        let id = tls::current_thread_id();
        let mut ml = self.monitor.lock();
        self.check_safepoint_locked(&mut ml, id, "safepoint_threads");

        let state = &mut *ml;
        state.in_rendezvous = true;
        state.round += 1;
        state.coordinator = id;
        state.remaining = state.entries.count_scheduled_except(id);
        let (round, remaining) = (state.round, state.remaining);
        if let Some(entry) = state.entries.find_mut(id) {
            entry.counted_round = round;
        }

        if self.config.debug_logging {
            kdebug!(
                "{}: {} requested round {}, waiting for {} thread(s)",
                self.isolate, id, round, remaining
            );
        }

        ml.notify_all();
        ml.wait_while(|s| s.remaining > 0);

        if self.config.debug_logging {
            kdebug!("{}: round {} stopped", self.isolate, round);
        }
    }

    /// Offer to park for a pending rendezvous; no-op when none is pending
    pub fn check_safepoint(&self) {
        let id = tls::current_thread_id();
        let mut ml = self.monitor.lock();
        self.check_safepoint_locked(&mut ml, id, "check_safepoint");
    }

    fn check_safepoint_locked(
        &self,
        ml: &mut MonitorLocker<'_, RegistryState<M>>,
        id: ThreadId,
        operation: &'static str,
    ) {
        if !ml.in_rendezvous {
            return;
        }
        self.check_not_coordinator(&**ml, id, operation);

        // A new round may start before this thread re-acquires the lock
        // after a resume; the per-entry round makes it count again then.
        while ml.in_rendezvous {
            if ml.record_arrival(id) {
                ktrace!("{} parked for round {}, {} remaining", id, ml.round, ml.remaining);
                if ml.remaining == 0 {
                    ml.notify_all();
                }
            }
            ml.wait();
        }
    }

    /// Release every thread parked by the current round
    pub fn resume_all_threads(&self) {
        let id = tls::current_thread_id();
        let mut ml = self.monitor.lock();
        if !ml.in_rendezvous {
            self.violation(InvariantViolation::ResumeWithoutRendezvous {
                isolate: self.isolate,
                thread: id,
            });
        }
        if ml.coordinator != id {
            self.violation(InvariantViolation::ResumeByNonCoordinator {
                isolate: self.isolate,
                thread: id,
                coordinator: ml.coordinator,
            });
        }
        debug_assert_eq!(ml.remaining, 0, "resume before all threads arrived");

        ml.in_rendezvous = false;
        ml.remaining = 0;
        ml.coordinator = ThreadId::NONE;
        if self.config.debug_logging {
            kdebug!("{}: round {} resumed", self.isolate, ml.round);
        }
        ml.notify_all();
    }

    /// Stop the world for the lifetime of the returned scope
    pub fn safepoint(&self) -> SafepointScope<'_, M> {
        SafepointScope::new(self)
    }

    // ========================================================================
    // Root visiting
    // ========================================================================

    /// Call `visitor` on each thread's zone: live if scheduled, saved if
    /// parked. Each distinct zone is visited once. Returns the count.
    ///
    /// Only meaningful inside a rendezvous (or with every thread parked);
    /// otherwise a scheduled thread may be mutating its zone. The registry
    /// lock is held while `visitor` runs, so it must not call back into
    /// this registry.
    pub fn visit_zones<F>(&self, mut visitor: F) -> usize
    where
        F: FnMut(&M::Zone),
    {
        let ml = self.monitor.lock();
        if !ml.in_rendezvous {
            let scheduled = ml.entries.count_scheduled();
            if scheduled > 0 {
                kwarn!(
                    "{}: visiting zones outside a rendezvous with {} scheduled thread(s)",
                    self.isolate, scheduled
                );
            }
        }

        let mut seen = HashSet::new();
        for entry in ml.entries.iter() {
            if let Some(zone) = entry.zone() {
                if seen.insert(Arc::as_ptr(&zone) as *const () as usize) {
                    visitor(&*zone);
                }
            }
        }
        seen.len()
    }

    /// Forward every object pointer in every zone to `visitor`
    pub fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) -> usize {
        self.visit_zones(|zone| zone.visit_object_pointers(&mut *visitor))
    }

    pub fn stats(&self) -> RegistryStats {
        let ml = self.monitor.lock();
        RegistryStats {
            entries: ml.entries.len(),
            scheduled: ml.entries.count_scheduled(),
            in_rendezvous: ml.in_rendezvous,
            remaining: ml.remaining,
            round: ml.round,
            phase: RendezvousPhase::from_counters(ml.in_rendezvous, ml.remaining),
        }
    }
}
