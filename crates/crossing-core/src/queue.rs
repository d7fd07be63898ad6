// Purpose: Ordered per-direction waiting lists and the lock discipline around them.
//
// Each direction has its own queue behind its own mutex. Load actors only ever
// take the lock of their own direction. The arbiter takes both locks, always
// Eastbound first, so that it sees both fronts and removes its pick inside one
// critical section.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::error::{CrossingError, CrossingResult};
use crate::train::{Direction, Train};

/// Waiting trains for one direction, kept sorted by admission order.
#[derive(Debug, Clone)]
pub struct DirectionalQueue {
    direction: Direction,
    trains: VecDeque<Train>,
    capacity: usize,
}

impl DirectionalQueue {
    pub fn new(direction: Direction, capacity: usize) -> Self {
        Self {
            direction,
            trains: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }

    /// Insert a train at its ordered position and return that position.
    ///
    /// A train ranked equal to queued ones lands behind them.
    pub fn insert(&mut self, train: Train) -> CrossingResult<usize> {
        if train.direction() != self.direction {
            return Err(CrossingError::fault(format!(
                "train {} travels {} but was offered to the {} queue",
                train.id(),
                train.direction(),
                self.direction
            )));
        }
        if self.trains.len() >= self.capacity {
            return Err(CrossingError::fault(format!(
                "{} queue is full ({} trains)",
                self.direction, self.capacity
            )));
        }
        let position = self
            .trains
            .partition_point(|queued| !train.comes_before(queued));
        self.trains.insert(position, train);
        Ok(position)
    }

    /// The train that would be admitted next from this direction.
    pub fn front(&self) -> Option<&Train> {
        self.trains.front()
    }

    /// Remove the front train. An empty queue here is a contract violation.
    pub fn pop_front(&mut self) -> CrossingResult<Train> {
        self.trains.pop_front().ok_or_else(|| {
            CrossingError::fault(format!("dequeue from empty {} queue", self.direction))
        })
    }

    /// Copy of the current order, front first.
    #[cfg(test)]
    fn snapshot(&self) -> Vec<Train> {
        self.trains.iter().copied().collect()
    }

    /// Whether every adjacent pair respects admission order.
    pub fn is_ordered(&self) -> bool {
        self.trains
            .iter()
            .zip(self.trains.iter().skip(1))
            .all(|(a, b)| a.comes_before(b))
    }
}

/// Immutable view of both queue fronts taken at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fronts {
    pub east: Option<Train>,
    pub west: Option<Train>,
}

impl Fronts {
    pub fn get(&self, direction: Direction) -> Option<&Train> {
        match direction {
            Direction::Eastbound => self.east.as_ref(),
            Direction::Westbound => self.west.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.east.is_none() && self.west.is_none()
    }
}

/// The two directional queues, each guarded by its own lock.
#[derive(Debug)]
pub struct QueuePair {
    east: Mutex<DirectionalQueue>,
    west: Mutex<DirectionalQueue>,
}

impl QueuePair {
    pub fn new(capacity: usize) -> Self {
        Self {
            east: Mutex::new(DirectionalQueue::new(Direction::Eastbound, capacity)),
            west: Mutex::new(DirectionalQueue::new(Direction::Westbound, capacity)),
        }
    }

    fn lock(&self, direction: Direction) -> CrossingResult<MutexGuard<'_, DirectionalQueue>> {
        let queue = match direction {
            Direction::Eastbound => &self.east,
            Direction::Westbound => &self.west,
        };
        queue
            .lock()
            .map_err(|_| CrossingError::fault(format!("{} queue lock poisoned", direction)))
    }

    /// Insert a loaded train into the queue of its direction.
    pub fn enqueue(&self, train: Train) -> CrossingResult<usize> {
        self.lock(train.direction())?.insert(train)
    }

    /// Number of trains waiting in one direction.
    pub fn waiting(&self, direction: Direction) -> CrossingResult<usize> {
        Ok(self.lock(direction)?.len())
    }

    /// Snapshot both fronts, let `choose` pick a direction, and dequeue the
    /// pick, all while holding both queue locks.
    ///
    /// Both queues are checked for admission order first; an unordered
    /// queue is a synchronization fault.
    pub fn select_with<F>(&self, choose: F) -> CrossingResult<Option<Train>>
    where
        F: FnOnce(&Fronts) -> Option<Direction>,
    {
        let mut east = self.lock(Direction::Eastbound)?;
        let mut west = self.lock(Direction::Westbound)?;
        for queue in [&*east, &*west] {
            if !queue.is_ordered() {
                return Err(CrossingError::fault(format!(
                    "{} queue out of admission order",
                    queue.direction()
                )));
            }
        }
        let fronts = Fronts {
            east: east.front().copied(),
            west: west.front().copied(),
        };
        match choose(&fronts) {
            Some(Direction::Eastbound) => east.pop_front().map(Some),
            Some(Direction::Westbound) => west.pop_front().map(Some),
            None => Ok(None),
        }
    }
}
