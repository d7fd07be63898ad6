// Purpose: Defines the immutable train record and the admission-order comparator.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CrossingError, CrossingResult};

/// Identifier of a train, assigned in record order starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrainId(pub usize);

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Honour width flags so log lines can pad the id.
        fmt::Display::fmt(&self.0, f)
    }
}

/// Travel direction over the shared track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Eastbound,
    Westbound,
}

impl Direction {
    /// Both directions, Eastbound first. This is also the queue lock order.
    pub const ALL: [Direction; 2] = [Direction::Eastbound, Direction::Westbound];

    /// The direction trains travel when coming the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Eastbound => Direction::Westbound,
            Direction::Westbound => Direction::Eastbound,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Eastbound => "East",
            Direction::Westbound => "West",
        };
        f.pad(name)
    }
}

/// Priority class. `High` is served before `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    High,
}

/// Immutable description of one train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    id: TrainId,
    direction: Direction,
    priority: Priority,
    loading: Duration,
    crossing: Duration,
}

impl Train {
    pub fn new(
        id: TrainId,
        direction: Direction,
        priority: Priority,
        loading: Duration,
        crossing: Duration,
    ) -> Self {
        Self {
            id,
            direction,
            priority,
            loading,
            crossing,
        }
    }

    /// Build a train from an input direction marker.
    ///
    /// `e`/`w` give a low priority train, `E`/`W` a high priority one. The
    /// loading and crossing figures are counted in `unit`s.
    pub fn from_marker(
        id: TrainId,
        marker: char,
        loading_units: u32,
        crossing_units: u32,
        unit: Duration,
    ) -> CrossingResult<Self> {
        let (direction, priority) = match marker {
            'e' => (Direction::Eastbound, Priority::Low),
            'E' => (Direction::Eastbound, Priority::High),
            'w' => (Direction::Westbound, Priority::Low),
            'W' => (Direction::Westbound, Priority::High),
            other => {
                return Err(CrossingError::InputMalformed {
                    record: id.0,
                    reason: format!("unknown direction marker '{}'", other),
                })
            }
        };
        Ok(Self::new(
            id,
            direction,
            priority,
            scale(unit, loading_units),
            scale(unit, crossing_units),
        ))
    }

    pub fn id(&self) -> TrainId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn loading(&self) -> Duration {
        self.loading
    }

    pub fn crossing(&self) -> Duration {
        self.crossing
    }

    /// Admission order between two trains: higher priority first, then the
    /// shorter loading time, then the lower id.
    pub fn admission_order(&self, other: &Train) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.loading.cmp(&other.loading))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// True iff `self` must be served before `other`.
    pub fn comes_before(&self, other: &Train) -> bool {
        self.admission_order(other) == Ordering::Less
    }
}

fn scale(unit: Duration, units: u32) -> Duration {
    unit.saturating_mul(units)
}
