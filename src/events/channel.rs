//! Single-producer/single-consumer event channel.
//!
//! # Memory ordering
//!
//! The channel is a fixed ring of slots with two cursors. The producer
//! writes the event into its slot and then publishes the advanced write
//! cursor with `Release` ordering; the consumer loads the write cursor with
//! `Acquire` ordering before reading the slot. Any event observed by the
//! consumer is therefore fully written, with no torn reads. The read cursor
//! is published the same way in the other direction, so a slot is never
//! overwritten while it is still being read. The ring itself is
//! `ringbuf::HeapRb`, which implements exactly this protocol; this module
//! pins down the capacity rules and the non-blocking contract on top of it.
//!
//! # Capacity
//!
//! A channel of size `N` (a power of two) holds at most `N - 1` events. The
//! slot the write cursor would land on when it catches up with the read
//! cursor is kept free, which is what distinguishes "full" from "empty".
//!
//! # Ownership
//!
//! `EventChannel::new()` hands out one [`EventProducer`] and one
//! [`EventConsumer`]. Both methods that move data take `&mut self`, so the
//! single-producer/single-consumer discipline is enforced by the borrow
//! checker rather than by convention.

use std::fmt;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

/// Default number of slots in an event channel.
pub const CHANNEL_SIZE: usize = 256;

/// Constructor namespace for event channels.
///
/// # Examples
///
/// ```
/// use murmur::events::{EventChannel, NoteEvent};
///
/// let (mut tx, mut rx) = EventChannel::<NoteEvent>::new();
/// assert!(tx.push(NoteEvent::on(60, 100)));
/// assert_eq!(rx.pop(), Some(NoteEvent::on(60, 100)));
/// assert_eq!(rx.pop(), None);
/// ```
pub struct EventChannel<T> {
    _marker: std::marker::PhantomData<T>,
}

impl<T: Copy> EventChannel<T> {
    /// Creates a channel of [`CHANNEL_SIZE`] slots (255 usable).
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (EventProducer<T>, EventConsumer<T>) {
        Self::with_size(CHANNEL_SIZE)
    }

    /// Creates a channel of `size` slots, `size - 1` of them usable.
    ///
    /// `size` should be a power of two; sizes below 2 are raised to 2.
    pub fn with_size(size: usize) -> (EventProducer<T>, EventConsumer<T>) {
        debug_assert!(size.is_power_of_two(), "channel size must be a power of two");
        let size = size.max(2);

        let ring = HeapRb::<T>::new(size - 1);
        let (producer, consumer) = ring.split();

        (
            EventProducer { inner: producer, size },
            EventConsumer { inner: consumer, size },
        )
    }
}

/// Writing half of an event channel. Owned by exactly one producer thread.
pub struct EventProducer<T> {
    inner: HeapProd<T>,
    size: usize,
}

impl<T: Copy> EventProducer<T> {
    /// Pushes an event. Returns `false` and drops the event when the channel
    /// is full. Never blocks and never allocates.
    pub fn push(&mut self, event: T) -> bool {
        self.inner.try_push(event).is_ok()
    }

    /// Number of events waiting to be consumed.
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Returns true if no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns true if the next push would fail.
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Maximum number of events the channel can hold (`size - 1`).
    pub fn capacity(&self) -> usize {
        self.size - 1
    }
}

/// Reading half of an event channel. Owned by the render thread.
pub struct EventConsumer<T> {
    inner: HeapCons<T>,
    size: usize,
}

impl<T: Copy> EventConsumer<T> {
    /// Pops the oldest event, or `None` when the channel is empty. Never
    /// blocks and never allocates.
    pub fn pop(&mut self) -> Option<T> {
        self.inner.try_pop()
    }

    /// Number of events waiting to be consumed.
    pub fn len(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Returns true if no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of events the channel can hold (`size - 1`).
    pub fn capacity(&self) -> usize {
        self.size - 1
    }
}

impl<T> fmt::Debug for EventProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProducer")
            .field("len", &self.inner.occupied_len())
            .field("size", &self.size)
            .finish()
    }
}

impl<T> fmt::Debug for EventConsumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventConsumer")
            .field("len", &self.inner.occupied_len())
            .field("size", &self.size)
            .finish()
    }
}
