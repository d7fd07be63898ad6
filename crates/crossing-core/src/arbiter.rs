// Purpose: The arbiter task that grants the single track to one train at a time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Barrier};
use tokio::time::sleep;
use tracing::{debug, info, trace};

use crate::actor::ReadyNotice;
use crate::cancel::CancelSignal;
use crate::context::RunContext;
use crate::error::{CrossingError, CrossingResult};
use crate::event::EventKind;
use crate::policy::{DecisionReason, SelectionPolicy};
use crate::train::{Direction, Train, TrainId};

/// Lifecycle of the arbiter loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    WaitingForTrain,
    SelectingTrain,
    TrackOccupied,
    Terminated,
}

impl fmt::Display for ArbiterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArbiterPhase::WaitingForTrain => "waiting-for-train",
            ArbiterPhase::SelectingTrain => "selecting-train",
            ArbiterPhase::TrackOccupied => "track-occupied",
            ArbiterPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Record of one granted crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    /// Position in the admission sequence, from zero.
    pub order: usize,
    pub train: TrainId,
    pub direction: Direction,
    pub reason: DecisionReason,
    /// Consecutive crossings from `direction`, this one included.
    pub consecutive: u32,
    /// Whether the other direction had a train waiting at decision time.
    pub opposite_waiting: bool,
}

/// Grants the track. There is exactly one per run.
pub struct Arbiter {
    ctx: Arc<RunContext>,
    policy: SelectionPolicy,
    notices: mpsc::UnboundedReceiver<ReadyNotice>,
    start: Arc<Barrier>,
    cancel: CancelSignal,
    phase: ArbiterPhase,
}

impl Arbiter {
    pub fn new(
        ctx: Arc<RunContext>,
        policy: SelectionPolicy,
        notices: mpsc::UnboundedReceiver<ReadyNotice>,
        start: Arc<Barrier>,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            ctx,
            policy,
            notices,
            start,
            cancel,
            phase: ArbiterPhase::WaitingForTrain,
        }
    }

    fn enter(&mut self, phase: ArbiterPhase) {
        if self.phase != phase {
            trace!(from = %self.phase, to = %phase, "arbiter phase change");
            self.phase = phase;
        }
    }

    /// Run until every train of the run has crossed.
    ///
    /// Returns the admissions in the order they were granted.
    pub async fn run(mut self) -> CrossingResult<Vec<Admission>> {
        tokio::select! {
            _ = self.start.wait() => {}
            _ = self.cancel.cancelled() => return Err(CrossingError::Cancelled),
        }
        self.ctx.clock().anchor();

        let mut admissions = Vec::new();
        let mut actors_done = false;

        loop {
            if self.ctx.is_complete()? {
                self.enter(ArbiterPhase::Terminated);
                break;
            }

            self.enter(ArbiterPhase::SelectingTrain);
            if let Some((train, admission)) = self.admit_next(admissions.len())? {
                self.enter(ArbiterPhase::TrackOccupied);
                self.cross(&train).await?;
                admissions.push(admission);
                self.enter(ArbiterPhase::WaitingForTrain);
                continue;
            }

            self.enter(ArbiterPhase::WaitingForTrain);
            if actors_done {
                let state = self.ctx.lock_state()?;
                return Err(CrossingError::fault(format!(
                    "all actors finished but only {} of {} trains crossed",
                    state.total_crossed(),
                    state.target()
                )));
            }

            tokio::select! {
                notice = self.notices.recv() => match notice {
                    Some(notice) => {
                        trace!(
                            train = %notice.train,
                            direction = %notice.direction,
                            "ready notice"
                        );
                    }
                    None => actors_done = true,
                },
                _ = self.cancel.cancelled() => return Err(CrossingError::Cancelled),
            }
        }

        info!(crossed = admissions.len(), "all trains crossed");
        Ok(admissions)
    }

    /// Choose, dequeue and account for the next train in one critical
    /// section over the arbiter state and both queues.
    fn admit_next(&self, order: usize) -> CrossingResult<Option<(Train, Admission)>> {
        let mut state = self.ctx.lock_state()?;
        let mut decision = None;
        let mut opposite_waiting = false;

        let picked = self.ctx.queues.select_with(|fronts| {
            decision = self.policy.choose(&state, fronts);
            decision.map(|d| {
                opposite_waiting = fronts.get(d.direction.opposite()).is_some();
                d.direction
            })
        })?;

        let (train, decision) = match (picked, decision) {
            (Some(train), Some(decision)) => (train, decision),
            (None, _) => return Ok(None),
            (Some(train), None) => {
                return Err(CrossingError::fault(format!(
                    "train {} dequeued without a decision",
                    train.id()
                )))
            }
        };
        if train.id() != decision.train {
            return Err(CrossingError::fault(format!(
                "decided on train {} but dequeued train {}",
                decision.train,
                train.id()
            )));
        }

        state.record_admission(train.direction());
        let admission = Admission {
            order,
            train: train.id(),
            direction: train.direction(),
            reason: decision.reason,
            consecutive: state.consecutive(),
            opposite_waiting,
        };
        debug!(
            train = %train.id(),
            direction = %train.direction(),
            reason = ?decision.reason,
            consecutive = state.consecutive(),
            crossed = state.total_crossed(),
            "train admitted"
        );
        Ok(Some((train, admission)))
    }

    /// Hold the track for the train's crossing time. No lock is held while
    /// the crossing is in progress.
    async fn cross(&mut self, train: &Train) -> CrossingResult<()> {
        self.ctx.occupy_track(train.id())?;
        self.ctx.emit(EventKind::EnteredTrack, train)?;

        tokio::select! {
            _ = sleep(train.crossing()) => {}
            _ = self.cancel.cancelled() => return Err(CrossingError::Cancelled),
        }

        self.ctx.emit(EventKind::ExitedTrack, train)?;
        self.ctx.release_track(train.id())
    }
}
