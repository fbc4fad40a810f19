/*!
    Thread-safe FIFO queue of encoded packets.
*/

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::{Condvar, Mutex};

use crate::{Packet, StopToken, StopWaiter};

/**
    Result of a pop operation on the packet queue.

    Exactly one of the three cases is reported per call. The blocking
    [`PacketQueue::pop`] never reports `Empty`.
*/
#[derive(Debug)]
pub enum PopResult {
    /// The FIFO head packet.
    Packet(Packet),
    /// Nothing queued right now (non-blocking pop only).
    Empty,
    /// Stop was requested; no more packets will be delivered.
    Stopped,
}

struct Inner {
    packets: VecDeque<Packet>,
    size_bytes: usize,
}

/**
    FIFO queue of encoded packets shared between the demux driver and the
    audio decode path.

    Tracks the queued packet count and the cumulative payload byte size so
    the producer can throttle on memory use. The blocking `pop` suspends on
    a condition variable and uses the stop token as its wake predicate:
    when stop is requested the token wakes the queue, and `pop` reports
    `Stopped` even if packets remain queued (shutdown takes priority over
    draining).

    All queue state is mutated under a single mutex; there is no lock-free
    fast path.
*/
pub struct PacketQueue {
    inner: Mutex<Inner>,
    available: Condvar,
    stop: Arc<StopToken>,
}

impl PacketQueue {
    /**
        Create a queue wired to the given stop token.

        The queue registers itself with the token so that `request_stop`
        can interrupt consumers blocked in [`PacketQueue::pop`]. Create the
        queue before starting the producer and consumer threads.
    */
    pub fn new(stop: Arc<StopToken>) -> Arc<Self> {
        let queue = Arc::new(Self {
            inner: Mutex::new(Inner {
                packets: VecDeque::new(),
                size_bytes: 0,
            }),
            available: Condvar::new(),
            stop: Arc::clone(&stop),
        });
        // Unsize on its own binding; annotating the downgrade call makes
        // inference expect `&Arc<dyn StopWaiter>` as the argument.
        let waiter = Arc::downgrade(&queue);
        let waiter: Weak<dyn StopWaiter> = waiter;
        stop.attach(waiter);
        queue
    }

    /**
        Append a packet at the tail and wake one waiting consumer.

        The payload deep copy out of the demuxer's transient buffer is the
        caller's `Packet` construction and happens before this call, so the
        lock is held only for the O(1) deque append.

        Returns false and drops the packet if stop has already been
        requested; the caller logs the drop and continues.
    */
    pub fn push(&self, packet: Packet) -> bool {
        {
            let mut inner = self.inner.lock();
            if self.stop.is_stopped() {
                return false;
            }
            inner.size_bytes += packet.size_bytes();
            inner.packets.push_back(packet);
        }
        self.available.notify_one();
        true
    }

    /**
        Pop the head packet without waiting.
    */
    pub fn try_pop(&self) -> PopResult {
        let mut inner = self.inner.lock();
        if self.stop.is_stopped() {
            return PopResult::Stopped;
        }
        match inner.packets.pop_front() {
            Some(packet) => {
                inner.size_bytes -= packet.size_bytes();
                PopResult::Packet(packet)
            }
            None => PopResult::Empty,
        }
    }

    /**
        Pop the head packet, blocking until one is available or stop is
        requested.

        The stop flag is re-checked on every wake, so spurious wakeups and
        wakeups raced with `request_stop` are both handled; returns
        `Stopped` promptly after a stop broadcast even if the producer
        never pushes again.
    */
    pub fn pop(&self) -> PopResult {
        let mut inner = self.inner.lock();
        loop {
            if self.stop.is_stopped() {
                return PopResult::Stopped;
            }
            if let Some(packet) = inner.packets.pop_front() {
                inner.size_bytes -= packet.size_bytes();
                return PopResult::Packet(packet);
            }
            self.available.wait(&mut inner);
        }
    }

    /**
        Number of packets currently queued.
    */
    pub fn len(&self) -> usize {
        self.inner.lock().packets.len()
    }

    /**
        Returns true if no packets are queued.
    */
    pub fn is_empty(&self) -> bool {
        self.inner.lock().packets.is_empty()
    }

    /**
        Cumulative byte size of the queued packet payloads.

        The demux driver throttles on this to bound queue growth.
    */
    pub fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }
}

impl StopWaiter for PacketQueue {
    fn wake(&self) {
        // Taking the lock orders the broadcast after any consumer that saw
        // the flag unset, so it cannot park and miss the wakeup.
        drop(self.inner.lock());
        self.available.notify_all();
    }
}

static_assertions::assert_impl_all!(PacketQueue: Send, Sync);
