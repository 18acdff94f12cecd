//! Auto-reset event used by the cross-thread hand-off routine.

use std::sync::{Condvar, Mutex};

/// A signal that wakes a single waiter and then resets itself.
#[derive(Debug, Default)]
pub struct AutoResetEvent {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl AutoResetEvent {
    pub fn new(initially_signaled: bool) -> Self {
        Self {
            signaled: Mutex::new(initially_signaled),
            cond: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut signaled = self.signaled.lock().unwrap_or_else(|e| e.into_inner());
        *signaled = true;
        self.cond.notify_one();
    }

    /// Block until signaled, consuming the signal.
    pub fn wait(&self) {
        let mut signaled = self.signaled.lock().unwrap_or_else(|e| e.into_inner());
        while !*signaled {
            signaled = self.cond.wait(signaled).unwrap_or_else(|e| e.into_inner());
        }
        *signaled = false;
    }

    /// Consume the signal if it is set, without blocking.
    pub fn try_wait(&self) -> bool {
        let mut signaled = self.signaled.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *signaled, false)
    }
}
