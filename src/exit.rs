//! Shared shutdown signal.
//!
//! A single-writer, multi-reader flag with wait/notify semantics. The window
//! adapter sets it when the user closes the window or requests exit, and any
//! thread may park on [`ExitFlag::wait`] until shutdown is signalled. The flag
//! is injected into whatever needs to observe shutdown rather than living in
//! a global.

use std::sync::{Arc, Condvar, Mutex};

#[derive(Clone, Debug, Default)]
pub struct ExitFlag {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown and wake all waiters. Idempotent.
    pub fn set(&self) {
        let (lock, cvar) = &*self.inner;
        let mut flag = lock.lock().unwrap();
        if !*flag {
            *flag = true;
            cvar.notify_all();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.inner.0.lock().unwrap()
    }

    /// Block the calling thread until the flag is set.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut flag = lock.lock().unwrap();
        while !*flag {
            flag = cvar.wait(flag).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn set_is_idempotent() {
        let flag = ExitFlag::new();
        assert!(!flag.is_set());
        flag.set();
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn wait_returns_once_set() {
        let flag = ExitFlag::new();
        let observer = flag.clone();
        let waiter = thread::spawn(move || {
            observer.wait();
            observer.is_set()
        });
        thread::sleep(Duration::from_millis(20));
        flag.set();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn wait_after_set_does_not_block() {
        let flag = ExitFlag::new();
        flag.set();
        flag.wait();
    }
}
