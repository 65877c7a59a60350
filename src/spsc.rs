//! SPSC (single producer, single consumer) queue for lock-free messaging from the
//! audio callback thread back to the frame loop.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lock-free bounded queue. Capacity is fixed at creation; push and pop never allocate.
pub struct Spsc<T> {
    /// Slots, uninitialized until pushed, then moved out by the consumer.
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Next slot to write. Only the producer stores this.
    write_index: AtomicUsize,
    /// Next slot to read. Only the consumer stores this.
    read_index: AtomicUsize,
}

// SAFETY: a slot is only touched by the producer while it is outside [read, write)
// and only by the consumer while it is inside, and the indices hand slots over with
// release/acquire pairs.
unsafe impl<T: Send> Send for Spsc<T> {}
unsafe impl<T: Send> Sync for Spsc<T> {}

impl<T> Spsc<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Spsc {
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Enqueues `value`, or hands it back if the queue is full.
    fn push(&self, value: T) -> Result<(), T> {
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Relaxed);
        if write.wrapping_sub(read) == self.capacity() {
            return Err(value);
        }

        let slot = &self.slots[write % self.capacity()];
        // SAFETY: the queue is not full, so the consumer is not reading this slot.
        unsafe { (*slot.get()).write(value) };

        self.write_index.store(write.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    fn pop(&self) -> Option<T> {
        let read = self.read_index.load(Ordering::Relaxed);
        let write = self.write_index.load(Ordering::Acquire);
        if read == write {
            return None;
        }

        let slot = &self.slots[read % self.capacity()];
        // SAFETY: the queue is not empty, so the producer finished writing this slot
        // and will not touch it again until read_index moves past it.
        let value = unsafe { (*slot.get()).assume_init_read() };

        self.read_index.store(read.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    pub fn len(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Spsc<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

/// Producer half. Not `Clone`: exactly one thread pushes.
pub struct Producer<T> {
    inner: Arc<Spsc<T>>,
}

impl<T> Producer<T> {
    /// Returns `Err(value)` if the queue is full.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        self.inner.push(value)
    }
}

/// Consumer half. Not `Clone`: exactly one thread pops.
pub struct Consumer<T> {
    inner: Arc<Spsc<T>>,
}

impl<T> Consumer<T> {
    pub fn try_recv(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Creates a queue and splits it into its two halves.
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let queue = Arc::new(Spsc::new(capacity));
    (
        Producer {
            inner: queue.clone(),
        },
        Consumer { inner: queue },
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::channel;

    #[test]
    /// Test that sending a value and then receiving it returns the value.
    fn test_send_then_recv_returns_value() {
        let (tx, rx) = channel::<i32>(1);
        tx.try_send(42).unwrap();
        assert_eq!(rx.try_recv(), Some(42));
    }

    #[test]
    fn test_empty_recv_returns_none() {
        let (_tx, rx) = channel::<i32>(1);
        assert_eq!(rx.try_recv(), None);
        assert!(rx.is_empty());
    }

    #[test]
    /// Test that sending to a full queue hands the value back.
    fn test_full_send_returns_err() {
        let (tx, _rx) = channel::<i32>(1);
        tx.try_send(42).unwrap();
        assert_eq!(tx.try_send(43), Err(43));
    }

    #[test]
    /// Test that values come out in the order they went in, across wraparound.
    fn test_fifo_order_across_wrap() {
        let (tx, rx) = channel::<i32>(3);
        for round in 0..4 {
            for i in 0..3 {
                tx.try_send(round * 10 + i).unwrap();
            }
            for i in 0..3 {
                assert_eq!(rx.try_recv(), Some(round * 10 + i));
            }
        }
    }

    #[test]
    /// Test that values still queued are dropped with the queue.
    fn test_queued_values_are_dropped() {
        let marker = Arc::new(());
        {
            let (tx, _rx) = channel::<Arc<()>>(4);
            tx.try_send(marker.clone()).unwrap();
            tx.try_send(marker.clone()).unwrap();
            assert_eq!(Arc::strong_count(&marker), 3);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    /// Test that every value sent from another thread arrives once, in order.
    fn test_cross_thread_delivery() {
        let (tx, rx) = channel::<usize>(16);
        let producer = thread::spawn(move || {
            for i in 0..10_000 {
                let mut value = i;
                while let Err(back) = tx.try_send(value) {
                    value = back;
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        while expected < 10_000 {
            if let Some(value) = rx.try_recv() {
                assert_eq!(value, expected);
                expected += 1;
            } else {
                thread::yield_now();
            }
        }
        producer.join().unwrap();
    }
}
