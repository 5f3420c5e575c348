//! Host-side pause/resume coordination for a running CPU.
//!
//! A host that drives the interpreter from one thread while controlling it
//! from another (a debugger, a REPL) needs a rendezvous point: "block until
//! the CPU has actually stopped" and "let it resume, then block until it
//! has actually started". [`Gate`] is that rendezvous, translated from the
//! original `models.Gate`'s unbuffered-channel broadcast into
//! [`Mutex`]/[`Condvar`] waiters. The externally observable contract is the
//! same: every `unlock_*` call only returns once its paired event has been
//! observed, and the gate is left locked across a running CPU.

use std::sync::{Condvar, Mutex};

/// A generation counter broadcast: callers snapshot the current generation,
/// then block until it changes. [`Waiter::notify`] bumps the generation and
/// wakes every blocked caller at once, the same "notify every waiter, then
/// clear the list" semantics as the original `waiter` type's channel slice.
#[derive(Debug, Default)]
struct Waiter {
    generation: Mutex<u64>,
    condvar: Condvar,
}

impl Waiter {
    fn snapshot(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn block_since(&self, since: u64) {
        let guard = self.generation.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self
            .condvar
            .wait_while(guard, |gen| *gen == since)
            .unwrap_or_else(|e| e.into_inner());
    }

    fn notify(&self) {
        let mut guard = self.generation.lock().unwrap_or_else(|e| e.into_inner());
        *guard = guard.wrapping_add(1);
        self.condvar.notify_all();
    }
}

/// A hand-over-hand mutex the gate holds across an entire run, unlocked
/// explicitly rather than through RAII — mirroring the original's manual
/// `Lock`/`Unlock` pairing, which a scoped `MutexGuard` can't express
/// across the `start`/`stop` call boundary.
#[derive(Debug, Default)]
struct ManualLock {
    locked: Mutex<bool>,
    condvar: Condvar,
}

impl ManualLock {
    fn lock(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(|e| e.into_inner());
        while *locked {
            locked = self.condvar.wait(locked).unwrap_or_else(|e| e.into_inner());
        }
        *locked = true;
    }

    fn unlock(&self) {
        let mut locked = self.locked.lock().unwrap_or_else(|e| e.into_inner());
        *locked = false;
        self.condvar.notify_one();
    }
}

/// Counts outstanding in-flight lock acquisitions, the same role the
/// original's `sync.WaitGroup` plays between `StopLock` and `Start`/`Stop`.
#[derive(Debug, Default)]
struct PendingCount {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl PendingCount {
    fn add(&self) {
        *self.count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn done(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count -= 1;
        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    fn wait(&self) {
        let guard = self.count.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self
            .condvar
            .wait_while(guard, |count| *count != 0)
            .unwrap_or_else(|e| e.into_inner());
    }
}

/// Coordinates a running interpreter loop with host-side pause/resume
/// requests (§5 of the concurrency model).
#[derive(Debug, Default)]
pub struct Gate {
    lock: ManualLock,
    pending: PendingCount,
    start: Waiter,
    stop: Waiter,
}

impl Gate {
    /// Creates an unlocked gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the interpreter when it begins running: takes the lock
    /// and announces "started" to anyone blocked in [`Self::unlock_start`].
    pub fn start(&self) {
        self.lock.lock();
        self.start.notify();
        self.pending.wait();
    }

    /// Called by the interpreter when it stops: announces "stopped" to
    /// anyone blocked in [`Self::unlock_stop`] and releases the lock.
    pub fn stop(&self) {
        self.stop.notify();
        self.lock.unlock();
        self.pending.wait();
    }

    /// Blocks until the interpreter stops, then takes the lock so it can't
    /// resume until a matching `unlock_*` call is made.
    pub fn stop_lock(&self) {
        self.pending.add();
        let since = self.stop.snapshot();
        self.stop.block_since(since);
        self.lock.lock();
        self.pending.done();
    }

    /// Releases the lock and blocks until the interpreter has started.
    pub fn unlock_start(&self) {
        let since = self.start.snapshot();
        self.lock.unlock();
        self.start.block_since(since);
    }

    /// Releases the lock and blocks until the interpreter has stopped.
    pub fn unlock_stop(&self) {
        let since = self.stop.snapshot();
        self.lock.unlock();
        self.stop.block_since(since);
    }

    /// Releases the lock, blocks until the interpreter has stopped, then
    /// immediately re-locks — for a host that wants to inspect state
    /// between runs without a window where another caller can sneak in.
    pub fn unlock_stop_relock(&self) {
        let since = self.stop.snapshot();
        self.lock.unlock();
        self.stop.block_since(since);
        self.pending.add();
        self.lock.lock();
        self.pending.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn unlock_start_observes_start() {
        let gate = Arc::new(Gate::new());
        gate.lock.lock();

        let waiter = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waiter.start();
        });

        gate.unlock_start();
        handle.join().unwrap();
    }

    #[test]
    fn stop_lock_blocks_until_stop() {
        let gate = Arc::new(Gate::new());
        gate.lock.lock();

        let runner = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            runner.stop();
        });

        gate.stop_lock();
        handle.join().unwrap();
    }
}
