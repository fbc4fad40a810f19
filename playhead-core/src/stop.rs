/*!
    Cooperative shutdown signalling.
*/

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/**
    Something that can be woken when stop is requested.

    Blocking structures (like [`PacketQueue`](crate::PacketQueue)) register
    themselves with the token so that `request_stop` interrupts their
    waiters instead of leaving them parked until the next natural wakeup.
*/
pub trait StopWaiter: Send + Sync {
    /// Wake every thread currently blocked in this waiter.
    fn wake(&self);
}

/**
    Write-once cancellation token shared by the demux driver, the packet
    queue, and the main thread.

    The first `request_stop` call flips the flag and wakes every registered
    waiter; later calls are no-ops. There is no way to reset the token:
    once stopped, it stays stopped for the process lifetime.
*/
pub struct StopToken {
    stopped: AtomicBool,
    waiters: Mutex<Vec<Weak<dyn StopWaiter>>>,
}

impl StopToken {
    /**
        Create a token in the running (not stopped) state.
    */
    pub fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        }
    }

    /**
        Returns true once stop has been requested.
    */
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /**
        Request shutdown and wake every registered waiter.

        Idempotent: only the first call performs the wakeups.
    */
    pub fn request_stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("stop requested");
        let waiters = self.waiters.lock();
        for waiter in waiters.iter() {
            if let Some(waiter) = waiter.upgrade() {
                waiter.wake();
            }
        }
    }

    /**
        Register a waiter to be woken by `request_stop`.

        Waiters are held weakly; a dropped waiter is skipped.
    */
    pub fn attach(&self, waiter: Weak<dyn StopWaiter>) {
        self.waiters.lock().push(waiter);
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(StopToken: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct TestWaiter {
        wakes: AtomicBool,
    }

    impl StopWaiter for TestWaiter {
        fn wake(&self) {
            self.wakes.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn starts_running() {
        let token = StopToken::new();
        assert!(!token.is_stopped());
    }

    #[test]
    fn stop_is_permanent() {
        let token = StopToken::new();
        token.request_stop();
        assert!(token.is_stopped());
        token.request_stop();
        assert!(token.is_stopped());
    }

    #[test]
    fn stop_wakes_registered_waiters() {
        let token = StopToken::new();
        let waiter = Arc::new(TestWaiter {
            wakes: AtomicBool::new(false),
        });
        let weak = Arc::downgrade(&waiter);
        let weak: Weak<dyn StopWaiter> = weak;
        token.attach(weak);

        token.request_stop();
        assert!(waiter.wakes.load(Ordering::SeqCst));
    }

    #[test]
    fn second_stop_does_not_wake_again() {
        let token = StopToken::new();
        let waiter = Arc::new(TestWaiter {
            wakes: AtomicBool::new(false),
        });
        let weak = Arc::downgrade(&waiter);
        let weak: Weak<dyn StopWaiter> = weak;
        token.attach(weak);

        token.request_stop();
        waiter.wakes.store(false, Ordering::SeqCst);
        token.request_stop();
        assert!(!waiter.wakes.load(Ordering::SeqCst));
    }

    #[test]
    fn dropped_waiters_are_skipped() {
        let token = StopToken::new();
        let waiter = Arc::new(TestWaiter {
            wakes: AtomicBool::new(false),
        });
        let weak = Arc::downgrade(&waiter);
        let weak: Weak<dyn StopWaiter> = weak;
        token.attach(weak);
        drop(waiter);

        token.request_stop();
        assert!(token.is_stopped());
    }
}
