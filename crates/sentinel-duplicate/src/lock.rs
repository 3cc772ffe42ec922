//! A per-key exclusive lock that can be acquired in one call and released
//! in another, without the borrow-checker constraints a `MutexGuard`
//! would impose across that boundary. Built on `Mutex<bool>` + `Condvar`
//! rather than `std::sync::Mutex` directly, since the guard must outlive
//! the function that acquires it (distilled §4.5: "lock remains held").

use std::sync::{Condvar, Mutex};

pub(crate) struct KeyLock {
    held: Mutex<bool>,
    cv: Condvar,
}

impl KeyLock {
    pub(crate) fn new() -> Self {
        Self { held: Mutex::new(false), cv: Condvar::new() }
    }

    pub(crate) fn acquire(&self) {
        let mut held = self.held.lock().expect("key lock poisoned");
        while *held {
            held = self.cv.wait(held).expect("key lock poisoned during wait");
        }
        *held = true;
    }

    pub(crate) fn release(&self) {
        let mut held = self.held.lock().expect("key lock poisoned");
        *held = false;
        self.cv.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_acquire_blocks_until_release() {
        let lock = Arc::new(KeyLock::new());
        lock.acquire();

        let lock2 = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            lock2.acquire();
            lock2.release();
        });

        thread::sleep(std::time::Duration::from_millis(20));
        lock.release();
        handle.join().unwrap();
    }
}
