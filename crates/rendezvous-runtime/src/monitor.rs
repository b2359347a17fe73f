//! Mutex plus condition variable, scoped by a guard
//!
//! All registry state sits behind one `Monitor`. Taking the lock yields a
//! `MonitorLocker`; waiting releases and re-acquires the lock in place, and
//! dropping the locker unlocks. There is no way to forget an unlock or to
//! wait without holding the lock.

use core::ops::{Deref, DerefMut};
use parking_lot::{Condvar, Mutex, MutexGuard};

/// Lock-protected state with a wait/notify-all facility
pub struct Monitor<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T> Monitor<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(value),
            cond: Condvar::new(),
        }
    }

    /// Acquire the lock, blocking the OS thread if contended
    #[inline]
    pub fn lock(&self) -> MonitorLocker<'_, T> {
        MonitorLocker {
            guard: self.state.lock(),
            cond: &self.cond,
        }
    }

    /// Consume the monitor and return the inner value
    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }
}

impl<T: Default> Default for Monitor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Holds the monitor's lock until dropped
pub struct MonitorLocker<'a, T> {
    guard: MutexGuard<'a, T>,
    cond: &'a Condvar,
}

impl<'a, T> MonitorLocker<'a, T> {
    /// Release the lock, sleep until notified, re-acquire
    ///
    /// Wakeups may be spurious; callers re-check their condition.
    #[inline]
    pub fn wait(&mut self) {
        self.cond.wait(&mut self.guard);
    }

    /// Wait until `condition` returns false
    #[inline]
    pub fn wait_while<F>(&mut self, mut condition: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *self.guard) {
            self.cond.wait(&mut self.guard);
        }
    }

    /// Wake every thread waiting on this monitor
    #[inline]
    pub fn notify_all(&self) {
        self.cond.notify_all();
    }
}

impl<'a, T> Deref for MonitorLocker<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &*self.guard
    }
}

impl<'a, T> DerefMut for MonitorLocker<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_and_mutate() {
        let monitor = Monitor::new(0u32);
        {
            let mut ml = monitor.lock();
            *ml = 42;
        }
        assert_eq!(*monitor.lock(), 42);
        assert_eq!(monitor.into_inner(), 42);
    }

    #[test]
    fn test_wait_while_wakes_on_notify() {
        let monitor = Arc::new(Monitor::new(false));
        let m2 = Arc::clone(&monitor);

        let waiter = thread::spawn(move || {
            let mut ml = m2.lock();
            ml.wait_while(|ready| !*ready);
            *ml
        });

        thread::sleep(std::time::Duration::from_millis(20));
        {
            let mut ml = monitor.lock();
            *ml = true;
            ml.notify_all();
        }

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_concurrent_counter() {
        let monitor = Arc::new(Monitor::new(0u32));
        let mut handles = vec![];

        for _ in 0..4 {
            let monitor = Arc::clone(&monitor);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    *monitor.lock() += 1;
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*monitor.lock(), 4000);
    }
}
