//! Experience replay buffer for DQN training
//!
//! This module implements a fixed-capacity ring buffer per environment slot,
//! plus a lazy infinite stream of uniformly sampled windows of consecutive
//! trajectories.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use burn::tensor::backend::Backend;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, warn};

use super::time_step::Trajectory;
use crate::error::{Result, Ri2048Error};

/// A sampled training batch
///
/// Each window holds `window_length` consecutive trajectories from a single
/// environment slot, oldest first.
#[derive(Debug, Clone)]
pub struct Experience<B: Backend> {
    pub windows: Vec<Vec<Trajectory<B>>>,
}

impl<B: Backend> Experience<B> {
    /// Number of windows in the batch
    pub fn batch_size(&self) -> usize {
        self.windows.len()
    }
}

/// Metadata for a sampled batch
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInfo {
    /// Id of the first item of each window
    pub ids: Vec<u64>,
    /// Probability with which each window was drawn
    pub probabilities: Vec<f32>,
}

#[derive(Debug)]
struct StoredItem<B: Backend> {
    id: u64,
    trajectory: Trajectory<B>,
}

#[derive(Debug)]
struct ReplayStore<B: Backend> {
    slots: Vec<VecDeque<StoredItem<B>>>,
    next_id: u64,
}

impl<B: Backend> ReplayStore<B> {
    /// Number of window start positions across all slots
    fn num_windows(&self, window_length: usize) -> usize {
        self.slots
            .iter()
            .map(|slot| (slot.len() + 1).saturating_sub(window_length))
            .sum()
    }

    /// Map a flat window index to `(slot, start)`
    fn locate(&self, mut index: usize, window_length: usize) -> (usize, usize) {
        for (slot_idx, slot) in self.slots.iter().enumerate() {
            let count = (slot.len() + 1).saturating_sub(window_length);
            if index < count {
                return (slot_idx, index);
            }
            index -= count;
        }
        unreachable!("window index out of range")
    }
}

#[derive(Debug)]
struct Shared<B: Backend> {
    store: Mutex<ReplayStore<B>>,
    data_ready: Condvar,
}

/// Bounded store of past transitions, sampled uniformly for training
///
/// Cloning the buffer yields another handle to the same storage, which lets
/// a [`SampleStream`] read while the training loop keeps appending.
///
/// # Example
///
/// ```rust
/// use ri2048::rl::ReplayBuffer;
/// use burn::backend::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let buffer = ReplayBuffer::<Backend>::new(1, 2000);
/// assert_eq!(buffer.len(), 0);
/// assert_eq!(buffer.capacity(), 2000);
/// ```
#[derive(Debug)]
pub struct ReplayBuffer<B: Backend> {
    shared: Arc<Shared<B>>,
    batch_size: usize,
    capacity: usize,
    seed: Option<u64>,
}

impl<B: Backend> Clone for ReplayBuffer<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            batch_size: self.batch_size,
            capacity: self.capacity,
            seed: self.seed,
        }
    }
}

impl<B: Backend> ReplayBuffer<B> {
    /// Create a buffer with `batch_size` slots of `capacity` items each
    pub fn new(batch_size: usize, capacity: usize) -> Self {
        let slots = (0..batch_size)
            .map(|_| VecDeque::with_capacity(capacity))
            .collect();

        Self {
            shared: Arc::new(Shared {
                store: Mutex::new(ReplayStore { slots, next_id: 0 }),
                data_ready: Condvar::new(),
            }),
            batch_size,
            capacity,
            seed: None,
        }
    }

    /// Seed the RNG of sample streams created from this buffer
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ReplayStore<B>> {
        self.shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one trajectory per environment slot
    ///
    /// Evicts the oldest item of a slot once it holds `capacity` items.
    pub fn add_batch(&self, batch: Vec<Trajectory<B>>) -> Result<()> {
        if batch.len() != self.batch_size {
            return Err(Ri2048Error::shape_mismatch(
                "replay buffer batch",
                [self.batch_size],
                [batch.len()],
            ));
        }

        {
            let mut store = self.lock();
            let id = store.next_id;
            store.next_id += 1;

            for (slot, trajectory) in store.slots.iter_mut().zip(batch) {
                if slot.len() == self.capacity {
                    slot.pop_front();
                }
                slot.push_back(StoredItem { id, trajectory });
            }
        }

        self.shared.data_ready.notify_all();
        Ok(())
    }

    /// Lazy infinite stream of uniformly sampled batches
    ///
    /// Each batch holds `sample_batch_size` windows of `window_length`
    /// consecutive trajectories. Pulling from the stream blocks until at least
    /// one slot holds `window_length` items.
    pub fn as_iterable(
        &self,
        sample_batch_size: usize,
        window_length: usize,
    ) -> Result<SampleStream<B>> {
        if sample_batch_size == 0 {
            return Err(Ri2048Error::InvalidConfig(
                "sample batch size must be at least 1".to_string(),
            ));
        }
        if window_length == 0 || window_length > self.capacity {
            return Err(Ri2048Error::InvalidConfig(format!(
                "window length {} must be in 1..={}",
                window_length, self.capacity
            )));
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SampleStream {
            buffer: self.clone(),
            sample_batch_size,
            window_length,
            rng,
        })
    }

    /// Chronological contents of one slot
    pub fn gather_all(&self, slot: usize) -> Vec<Trajectory<B>> {
        self.lock()
            .slots
            .get(slot)
            .map(|items| items.iter().map(|item| item.trajectory.clone()).collect())
            .unwrap_or_default()
    }

    /// Ids stored in one slot, oldest first
    pub fn ids(&self, slot: usize) -> Vec<u64> {
        self.lock()
            .slots
            .get(slot)
            .map(|items| items.iter().map(|item| item.id).collect())
            .unwrap_or_default()
    }

    /// Total number of stored items across all slots
    pub fn len(&self) -> usize {
        self.lock().slots.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items per slot
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of `add_batch` calls since creation or the last `clear`
    pub fn num_frames(&self) -> u64 {
        self.lock().next_id
    }

    pub fn clear(&self) {
        let mut store = self.lock();
        for slot in &mut store.slots {
            slot.clear();
        }
        store.next_id = 0;
    }
}

/// Infinite iterator of sampled batches from a [`ReplayBuffer`]
pub struct SampleStream<B: Backend> {
    buffer: ReplayBuffer<B>,
    sample_batch_size: usize,
    window_length: usize,
    rng: StdRng,
}

impl<B: Backend> SampleStream<B> {
    fn sample(&mut self) -> (Experience<B>, SampleInfo) {
        let mut store = self.buffer.lock();

        let mut num_windows = store.num_windows(self.window_length);
        if num_windows == 0 {
            warn!(
                window_length = self.window_length,
                "replay buffer has too little data, waiting for more"
            );
        }
        while num_windows == 0 {
            store = self
                .buffer
                .shared
                .data_ready
                .wait(store)
                .unwrap_or_else(PoisonError::into_inner);
            num_windows = store.num_windows(self.window_length);
        }

        let probability = 1.0 / num_windows as f32;
        let mut windows = Vec::with_capacity(self.sample_batch_size);
        let mut ids = Vec::with_capacity(self.sample_batch_size);

        for _ in 0..self.sample_batch_size {
            let index = self.rng.gen_range(0..num_windows);
            let (slot, start) = store.locate(index, self.window_length);
            let items = &store.slots[slot];

            ids.push(items[start].id);
            windows.push(
                items
                    .range(start..start + self.window_length)
                    .map(|item| item.trajectory.clone())
                    .collect(),
            );
        }

        debug!(num_windows, "sampled replay batch");

        (
            Experience { windows },
            SampleInfo {
                probabilities: vec![probability; ids.len()],
                ids,
            },
        )
    }
}

impl<B: Backend> Iterator for SampleStream<B> {
    type Item = (Experience<B>, SampleInfo);

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.sample())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::time_step::StepType;
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::tensor::Tensor;
    use std::time::Duration;

    type TestBackend = NdArray<f32>;

    fn traj(reward: f32) -> Trajectory<TestBackend> {
        Trajectory {
            step_type: StepType::Mid,
            observation: Tensor::zeros([1, 1], &NdArrayDevice::default()),
            action: 0,
            next_step_type: StepType::Mid,
            reward,
            discount: 1.0,
        }
    }

    fn rewards(items: &[Trajectory<TestBackend>]) -> Vec<f32> {
        items.iter().map(|t| t.reward).collect()
    }

    #[test]
    fn test_ring_keeps_most_recent() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 4);

        for id in 1..=6 {
            buffer.add_batch(vec![traj(id as f32)]).unwrap();
            assert!(buffer.len() <= buffer.capacity());
        }

        assert_eq!(rewards(&buffer.gather_all(0)), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buffer.ids(0), vec![2, 3, 4, 5]);
        assert_eq!(buffer.num_frames(), 6);
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let buffer = ReplayBuffer::<TestBackend>::new(2, 3);
        for i in 0..20 {
            buffer
                .add_batch(vec![traj(i as f32), traj(-(i as f32))])
                .unwrap();
            assert!(buffer.gather_all(0).len() <= 3);
            assert!(buffer.gather_all(1).len() <= 3);
        }
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_add_batch_rejects_wrong_slot_count() {
        let buffer = ReplayBuffer::<TestBackend>::new(2, 8);
        let result = buffer.add_batch(vec![traj(0.0)]);
        assert!(matches!(result, Err(Ri2048Error::ShapeMismatch { .. })));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_windows_are_consecutive() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 16).with_seed(Some(11));
        for i in 0..10 {
            buffer.add_batch(vec![traj(i as f32)]).unwrap();
        }

        let mut stream = buffer.as_iterable(32, 2).unwrap();
        let (experience, info) = stream.next().unwrap();

        assert_eq!(experience.batch_size(), 32);
        assert_eq!(info.ids.len(), 32);
        for (window, &id) in experience.windows.iter().zip(&info.ids) {
            assert_eq!(window.len(), 2);
            assert_eq!(window[1].reward, window[0].reward + 1.0);
            assert_eq!(window[0].reward, id as f32);
        }
        assert!(info.probabilities.iter().all(|&p| (p - 1.0 / 9.0).abs() < 1e-6));
    }

    #[test]
    fn test_windows_stay_within_one_slot() {
        let buffer = ReplayBuffer::<TestBackend>::new(2, 8).with_seed(Some(5));
        for i in 0..5 {
            buffer
                .add_batch(vec![traj(i as f32), traj(100.0 + i as f32)])
                .unwrap();
        }

        let mut stream = buffer.as_iterable(64, 2).unwrap();
        let (experience, _) = stream.next().unwrap();
        for window in &experience.windows {
            assert_eq!(window[1].reward - window[0].reward, 1.0);
        }
    }

    #[test]
    fn test_stream_sees_later_additions() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 4).with_seed(Some(1));
        buffer.add_batch(vec![traj(0.0)]).unwrap();
        buffer.add_batch(vec![traj(1.0)]).unwrap();
        let mut stream = buffer.as_iterable(8, 2).unwrap();

        for i in 2..8 {
            buffer.add_batch(vec![traj(i as f32)]).unwrap();
        }

        let (experience, _) = stream.next().unwrap();
        for window in &experience.windows {
            assert!(window[0].reward >= 4.0);
        }
    }

    #[test]
    fn test_invalid_stream_parameters() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 4);
        assert!(buffer.as_iterable(0, 2).is_err());
        assert!(buffer.as_iterable(8, 0).is_err());
        assert!(buffer.as_iterable(8, 5).is_err());
    }

    #[test]
    fn test_stream_blocks_until_data_arrives() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 4).with_seed(Some(2));
        let mut stream = buffer.as_iterable(1, 2).unwrap();
        let producer = buffer.clone();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            producer.add_batch(vec![traj(7.0)]).unwrap();
            producer.add_batch(vec![traj(8.0)]).unwrap();
        });

        let (experience, _) = stream.next().unwrap();
        handle.join().unwrap();

        assert_eq!(rewards(&experience.windows[0]), vec![7.0, 8.0]);
    }

    #[test]
    fn test_clear() {
        let buffer = ReplayBuffer::<TestBackend>::new(1, 4);
        buffer.add_batch(vec![traj(1.0)]).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.num_frames(), 0);
    }
}
