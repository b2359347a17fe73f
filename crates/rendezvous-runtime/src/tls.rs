//! Thread-local identity
//!
//! Every OS thread that touches a registry gets a `ThreadId` on first use.
//! Ids come from a process-wide counter and are never reused, so a thread
//! that exits and a new one that starts later can't alias each other's
//! entries.

use rendezvous_core::ThreadId;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Registry identity for this OS thread (NONE until first use)
    static THREAD_ID: Cell<ThreadId> = const { Cell::new(ThreadId::NONE) };

    /// Kernel thread id, cached (0 until first use or when unsupported)
    static OS_TID: Cell<u64> = const { Cell::new(0) };
}

/// Identity of the calling OS thread
#[inline]
pub fn current_thread_id() -> ThreadId {
    THREAD_ID.with(|cell| {
        let id = cell.get();
        if id.is_some() {
            return id;
        }
        let id = ThreadId::new(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
        cell.set(id);
        id
    })
}

/// Kernel thread id of the calling thread, for diagnostics only
pub fn os_thread_id() -> u64 {
    OS_TID.with(|cell| {
        let tid = cell.get();
        if tid != 0 {
            return tid;
        }
        let tid = fetch_os_tid();
        cell.set(tid);
        tid
    })
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        fn fetch_os_tid() -> u64 {
            // Safety: gettid takes no arguments and cannot fail
            unsafe { libc::syscall(libc::SYS_gettid) as u64 }
        }
    } else if #[cfg(target_os = "macos")] {
        fn fetch_os_tid() -> u64 {
            let mut tid: u64 = 0;
            // Safety: null means the calling thread; tid is a valid out pointer
            unsafe { libc::pthread_threadid_np(0 as libc::pthread_t, &mut tid) };
            tid
        }
    } else {
        fn fetch_os_tid() -> u64 {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_thread_id_stable_on_same_thread() {
        let a = current_thread_id();
        let b = current_thread_id();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_thread_id_distinct_across_threads() {
        let here = current_thread_id();
        let there = thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_os_tid_linux() {
        let tid = os_thread_id();
        assert_ne!(tid, 0);
        assert_eq!(tid, os_thread_id());
        let other = thread::spawn(os_thread_id).join().unwrap();
        assert_ne!(tid, other);
    }
}
