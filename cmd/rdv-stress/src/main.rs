//! Stress test - many threads, many rendezvous rounds
//!
//! Worker threads enter an isolate, poll for safepoints while they mutate
//! their arena, and every so often exit and re-enter. The main thread keeps
//! stopping them all and walking their roots.

use parking_lot::Mutex;
use rendezvous::prelude::*;
use rendezvous::{current_thread_id, kinfo};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Arena of fake object addresses owned by one worker
struct Arena {
    objects: Mutex<Vec<usize>>,
}

impl Zone for Arena {
    fn visit_object_pointers(&self, visitor: &mut dyn ObjectPointerVisitor) {
        for &addr in self.objects.lock().iter() {
            visitor.visit_pointer(addr);
        }
    }
}

struct Worker {
    id: ThreadId,
    exit_frame: AtomicUsize,
    arena: Mutex<Option<Arc<Arena>>>,
}

impl Mutator for Worker {
    type Zone = Arena;

    fn thread_id(&self) -> ThreadId {
        self.id
    }

    fn top_exit_frame_info(&self) -> usize {
        self.exit_frame.load(Ordering::Relaxed)
    }

    fn zone(&self) -> Option<Arc<Arena>> {
        self.arena.lock().clone()
    }
}

const OBJECTS_PER_ARENA: usize = 64;
const POLLS_PER_EXIT: u64 = 256;

fn run_worker(index: usize, isolate: Arc<Isolate<Worker>>, stop: Arc<AtomicBool>, stats: Arc<Counters>) {
    let me = Arc::new(Worker {
        id: current_thread_id(),
        exit_frame: AtomicUsize::new(0),
        arena: Mutex::new(None),
    });
    let base = (index + 1) << 20;

    let (existed, _) = isolate.enter(&me);
    debug_assert!(!existed);
    *me.arena.lock() = Some(Arc::new(Arena { objects: Mutex::new(Vec::new()) }));

    let mut polls: u64 = 0;
    while !stop.load(Ordering::Acquire) {
        if let Some(arena) = me.zone() {
            let mut objects = arena.objects.lock();
            if objects.len() == OBJECTS_PER_ARENA {
                objects.clear();
            }
            let next = base + objects.len() * 8;
            objects.push(next);
        }

        isolate.check_safepoint();
        polls += 1;

        if polls % POLLS_PER_EXIT == 0 {
            // Leave the isolate for a while with a native frame marker
            let marker = 0x1000 + index * 0x10;
            isolate.exit(&me, SavedState::new(marker, me.zone()));
            stats.exits.fetch_add(1, Ordering::Relaxed);
            std::thread::yield_now();

            me.exit_frame.store(0, Ordering::Relaxed);
            let (existed, state) = isolate.enter(&me);
            debug_assert!(existed);
            debug_assert_eq!(state.top_exit_frame_info, marker);
            *me.arena.lock() = state.zone;
        }
    }

    isolate.exit(&me, SavedState::new(0, me.zone()));
    stats.polls.fetch_add(polls, Ordering::Relaxed);
}

#[derive(Default)]
struct Counters {
    polls: AtomicU64,
    exits: AtomicU64,
}

fn main() {
    println!("=== Rendezvous Stress Test ===\n");

    let num_workers: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let num_rounds: u64 = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000);

    println!("Workers: {}, rounds: {}", num_workers, num_rounds);

    let config = RegistryConfig::default().initial_entries(num_workers + 1);
    let isolate = match Isolate::<Worker>::new("stress", config) {
        Ok(isolate) => Arc::new(isolate),
        Err(e) => {
            eprintln!("Failed to create isolate: {}", e);
            std::process::exit(1);
        }
    };
    kinfo!("fatal mode: {}", isolate.registry().config().fatal_mode);

    let stop = Arc::new(AtomicBool::new(false));
    let counters = Arc::new(Counters::default());

    let start = Instant::now();
    let workers: Vec<_> = (0..num_workers)
        .map(|i| {
            let (isolate, stop, counters) = (Arc::clone(&isolate), Arc::clone(&stop), Arc::clone(&counters));
            std::thread::Builder::new()
                .name(format!("mutator-{}", i))
                .spawn(move || run_worker(i, isolate, stop, counters))
        })
        .collect::<Result<_, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Failed to spawn worker: {}", e);
            std::process::exit(1);
        });

    let mut zones_visited: u64 = 0;
    let mut roots_visited: u64 = 0;
    let mut longest_stop = Duration::ZERO;
    let mut total_stop = Duration::ZERO;

    for round in 1..=num_rounds {
        let requested = Instant::now();
        let scope = isolate.safepoint();
        let stopped = requested.elapsed();
        longest_stop = longest_stop.max(stopped);
        total_stop += stopped;

        let mut roots: u64 = 0;
        zones_visited += scope.visit_object_pointers(&mut |_addr: usize| roots += 1) as u64;
        roots_visited += roots;
        drop(scope);

        if round % 100 == 0 {
            print!("\rRounds: {}/{}", round, num_rounds);
        }
    }

    stop.store(true, Ordering::Release);
    for w in workers {
        if w.join().is_err() {
            eprintln!("\nWorker panicked");
            std::process::exit(1);
        }
    }
    isolate.registry().assert_none_scheduled();

    let total_time = start.elapsed();
    let stats = isolate.registry().stats();

    println!("\n\n=== Results ===");
    println!("Workers:          {}", num_workers);
    println!("Entries:          {}", stats.entries);
    println!("Rounds:           {}", stats.round);
    println!("Zones visited:    {}", zones_visited);
    println!("Roots visited:    {}", roots_visited);
    println!("Safepoint polls:  {}", counters.polls.load(Ordering::Relaxed));
    println!("Exit/re-enter:    {}", counters.exits.load(Ordering::Relaxed));
    println!("Longest stop:     {:?}", longest_stop);
    println!("Mean stop:        {:?}", total_stop / num_rounds.max(1) as u32);
    println!("Total time:       {:?}", total_time);
    println!("Rounds/sec:       {:.0}", num_rounds as f64 / total_time.as_secs_f64());

    println!("\n=== Stress Test Complete ===");
}
