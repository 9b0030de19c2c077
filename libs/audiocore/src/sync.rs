//! Platform synchronization primitives used by the worker handshake (§5):
//! an auto-reset event built on `Mutex`/`Condvar`, standing in for the
//! native event objects the source backends create per device.

use std::sync::{Condvar, Mutex};

/// An event that wakes exactly one waiter per `signal` call and resets
/// itself as soon as a waiter observes it.
pub struct AutoResetEvent {
    flag: Mutex<bool>,
    condvar: Condvar,
}

impl AutoResetEvent {
    pub fn new() -> Self {
        AutoResetEvent {
            flag: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Sets the event; wakes one waiter (or the next one to call `wait`).
    pub fn signal(&self) {
        let mut flag = self.flag.lock().unwrap();
        *flag = true;
        self.condvar.notify_one();
    }

    /// Blocks until the event is signalled, then resets it.
    pub fn wait(&self) {
        let mut flag = self.flag.lock().unwrap();
        while !*flag {
            flag = self.condvar.wait(flag).unwrap();
        }
        *flag = false;
    }
}

impl Default for AutoResetEvent {
    fn default() -> Self {
        Self::new()
    }
}
