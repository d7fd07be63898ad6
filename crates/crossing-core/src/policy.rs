// Purpose: The selection policy that picks the next train, and the counters it reads.

use serde::{Deserialize, Serialize};

use crate::queue::Fronts;
use crate::train::{Direction, TrainId};

/// Default number of consecutive same-direction crossings before the
/// opposite direction is forced through.
pub const DEFAULT_STARVATION_CAP: u32 = 2;

/// Counters owned by the arbiter for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbiterState {
    last_direction: Option<Direction>,
    consecutive: u32,
    total_crossed: usize,
    target: usize,
}

impl ArbiterState {
    pub fn new(target: usize) -> Self {
        Self {
            last_direction: None,
            consecutive: 0,
            total_crossed: 0,
            target,
        }
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    /// Crossings in a row from `last_direction`.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn total_crossed(&self) -> usize {
        self.total_crossed
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Every train of the run has been admitted.
    pub fn is_complete(&self) -> bool {
        self.total_crossed >= self.target
    }

    /// Account for one admission from `direction`.
    pub fn record_admission(&mut self, direction: Direction) {
        if self.last_direction == Some(direction) {
            self.consecutive += 1;
        } else {
            self.last_direction = Some(direction);
            self.consecutive = 1;
        }
        self.total_crossed += 1;
    }
}

/// Why a direction was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    /// Only one queue had a waiting train.
    OnlyCandidate,
    /// The starvation cap forced the opposite direction.
    ForcedSwitch,
    /// Both fronts were compared by admission order.
    Ranked,
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    pub train: TrainId,
    pub reason: DecisionReason,
}

/// Chooses which queue front is admitted next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    starvation_cap: u32,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_STARVATION_CAP)
    }
}

impl SelectionPolicy {
    pub fn new(starvation_cap: u32) -> Self {
        Self {
            starvation_cap: starvation_cap.max(1),
        }
    }

    pub fn starvation_cap(&self) -> u32 {
        self.starvation_cap
    }

    /// Pick the next train among the two fronts, or `None` if both are empty.
    ///
    /// When the cap is reached and the opposite direction has a train, that
    /// train goes regardless of priority. With the opposite queue empty the
    /// current direction simply continues and the counter keeps growing.
    pub fn choose(&self, state: &ArbiterState, fronts: &Fronts) -> Option<Decision> {
        match (fronts.east, fronts.west) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(Decision {
                direction: only.direction(),
                train: only.id(),
                reason: DecisionReason::OnlyCandidate,
            }),
            (Some(east), Some(west)) => {
                if let Some(last) = state.last_direction() {
                    if state.consecutive() >= self.starvation_cap {
                        let other = if last == Direction::Eastbound { west } else { east };
                        return Some(Decision {
                            direction: other.direction(),
                            train: other.id(),
                            reason: DecisionReason::ForcedSwitch,
                        });
                    }
                }
                let winner = if east.comes_before(&west) { east } else { west };
                Some(Decision {
                    direction: winner.direction(),
                    train: winner.id(),
                    reason: DecisionReason::Ranked,
                })
            }
        }
    }
}
