//! Fixed-capacity store of training examples.
//!
//! Backed by [`heapless::HistoryBuffer`]: writing into a full store
//! silently evicts the oldest example.  No allocation, no backpressure,
//! no way to invalidate a slot other than overwriting it.

use core::fmt;

use heapless::HistoryBuffer;

use super::context::Observation;

/// One remote-labelled example: the conditions and the relay state the
/// operator chose for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingExample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub object_present: bool,
    pub relay_on: bool,
}

impl TrainingExample {
    pub const fn new(
        temperature_c: f32,
        humidity_pct: f32,
        object_present: bool,
        relay_on: bool,
    ) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            object_present,
            relay_on,
        }
    }

    /// Label an observation with the relay state chosen for it.
    pub const fn labelled(observation: &Observation, relay_on: bool) -> Self {
        Self::new(
            observation.temperature_c,
            observation.humidity_pct,
            observation.object_present,
            relay_on,
        )
    }
}

/// Ring buffer of the `N` most recent training examples.
pub struct SampleStore<const N: usize> {
    slots: HistoryBuffer<TrainingExample, N>,
}

impl<const N: usize> SampleStore<N> {
    pub const fn new() -> Self {
        Self {
            slots: HistoryBuffer::new(),
        }
    }

    /// Record an example, evicting the oldest one when full.  O(1).
    pub fn push(&mut self, example: TrainingExample) {
        self.slots.write(example);
    }

    /// Number of valid examples, in `0..=N`.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Valid examples in storage-slot order (not the order they were
    /// written once the buffer has wrapped).
    pub fn iter_valid(&self) -> impl Iterator<Item = &TrainingExample> {
        self.slots.as_slice().iter()
    }

    /// Valid examples from oldest to newest.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &TrainingExample> {
        self.slots.oldest_ordered()
    }

    /// The most recently recorded example.
    pub fn newest(&self) -> Option<&TrainingExample> {
        self.slots.recent()
    }
}

impl<const N: usize> Default for SampleStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for SampleStore<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleStore")
            .field("len", &self.len())
            .field("capacity", &N)
            .finish()
    }
}
