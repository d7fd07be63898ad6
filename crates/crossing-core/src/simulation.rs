// Purpose: Wires one crossing run together and drives it to completion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Barrier};
use tracing::{error, info};

use crate::actor::LoadActor;
use crate::arbiter::{Admission, Arbiter};
use crate::cancel::{cancel_pair, CancelHandle};
use crate::clock::SimClock;
use crate::config::CrossingConfig;
use crate::context::RunContext;
use crate::error::{CrossingError, CrossingResult};
use crate::event::{CrossingEvent, EventKind, FanoutSink, MemorySink, SharedSink};
use crate::train::{Direction, Train, TrainId};

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub trains: Vec<Train>,
    pub admissions: Vec<Admission>,
    pub events: Vec<CrossingEvent>,
}

impl RunReport {
    /// Train ids in the order they were granted the track.
    pub fn admission_order(&self) -> Vec<TrainId> {
        self.admissions.iter().map(|a| a.train).collect()
    }

    /// Events of one kind, in emission order.
    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &CrossingEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Longest run of same-direction admissions granted while the other
    /// direction had a train waiting.
    pub fn longest_run_while_opposite_waiting(&self) -> u32 {
        let mut longest = 0;
        let mut current = 0;
        let mut direction: Option<Direction> = None;
        for admission in &self.admissions {
            if direction == Some(admission.direction) {
                current += 1;
            } else {
                direction = Some(admission.direction);
                current = 1;
            }
            if admission.opposite_waiting {
                longest = longest.max(current);
            }
        }
        longest
    }

    /// Whether every `EnteredTrack` is followed by the matching `ExitedTrack`
    /// before the next train enters.
    pub fn track_was_exclusive(&self) -> bool {
        let mut occupant: Option<TrainId> = None;
        for event in &self.events {
            match event.kind {
                EventKind::EnteredTrack => {
                    if occupant.is_some() {
                        return false;
                    }
                    occupant = Some(event.train);
                }
                EventKind::ExitedTrack => {
                    if occupant != Some(event.train) {
                        return false;
                    }
                    occupant = None;
                }
                EventKind::ReadyToGo => {}
            }
        }
        occupant.is_none()
    }
}

/// One crossing run: a set of trains, a policy and an event sink.
pub struct CrossingSimulation {
    config: CrossingConfig,
    trains: Vec<Train>,
    sink: SharedSink,
    cancel: CancelHandle,
}

impl CrossingSimulation {
    /// Prepare a run. Fails if the configuration is invalid or more trains
    /// are supplied than `max_trains`.
    pub fn new(
        config: CrossingConfig,
        trains: Vec<Train>,
        sink: SharedSink,
    ) -> CrossingResult<Self> {
        config.validate()?;
        if trains.len() > config.max_trains {
            return Err(CrossingError::CapacityExceeded {
                max: config.max_trains,
                rejected: trains.len() - config.max_trains,
            });
        }
        let (cancel, _) = cancel_pair();
        Ok(Self {
            config,
            trains,
            sink,
            cancel,
        })
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    /// Handle that stops the run from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Release every train at once, arbitrate until all have crossed and
    /// report what happened.
    pub async fn run(self) -> CrossingResult<RunReport> {
        let started_at = Utc::now();
        let memory = Arc::new(MemorySink::new());
        let sink: SharedSink = Arc::new(
            FanoutSink::new()
                .with_sink(memory.clone())
                .with_sink(self.sink.clone()),
        );

        let target = self.trains.len();
        let ctx = Arc::new(RunContext::new(
            target,
            self.config.max_trains,
            sink,
            SimClock::new(),
        ));
        // Every actor plus the arbiter meet here before anyone starts.
        let start = Arc::new(Barrier::new(target + 1));
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        info!(
            trains = target,
            starvation_cap = self.config.starvation_cap,
            "starting crossing simulation"
        );

        let actors: Vec<_> = self
            .trains
            .iter()
            .map(|train| {
                let actor = LoadActor::new(
                    *train,
                    ctx.clone(),
                    notices_tx.clone(),
                    start.clone(),
                    self.cancel.signal(),
                );
                tokio::spawn(actor.run())
            })
            .collect();
        // The arbiter learns that every actor is done when the channel closes.
        drop(notices_tx);

        let arbiter = Arbiter::new(
            ctx.clone(),
            self.config.policy(),
            notices_rx,
            start,
            self.cancel.signal(),
        );
        let arbiter_result = match tokio::spawn(arbiter.run()).await {
            Ok(result) => result,
            Err(join_error) => Err(CrossingError::from(join_error)),
        };
        if let Err(err) = &arbiter_result {
            if !matches!(err, CrossingError::Cancelled) {
                error!(error = %err, "arbiter failed, stopping load actors");
            }
            self.cancel.cancel();
        }

        // Actor failures take precedence over the arbiter's result.
        let actor_results = try_join_all(actors).await?;
        if let Some(err) = actor_results
            .into_iter()
            .filter_map(Result::err)
            .find(|err| !matches!(err, CrossingError::Cancelled))
        {
            return Err(err);
        }
        let admissions = arbiter_result?;

        ctx.flush_sink()?;
        info!(crossed = admissions.len(), "crossing simulation finished");

        Ok(RunReport {
            started_at,
            trains: self.trains,
            admissions,
            events: memory.events(),
        })
    }
}
