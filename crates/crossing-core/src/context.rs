// Purpose: State shared by the arbiter and the load actors of one run.
//
// Lock discipline:
// - each directional queue has its own lock (inside `QueuePair`);
// - `state` guards the arbiter counters and is always taken before the queue
//   locks when both are needed;
// - `track` records the occupant and is never held across a delay;
// - the sink serializes its own appends.

use std::sync::{Mutex, MutexGuard};

use crate::clock::SimClock;
use crate::error::{CrossingError, CrossingResult};
use crate::event::{CrossingEvent, EventKind, SharedSink};
use crate::policy::ArbiterState;
use crate::queue::QueuePair;
use crate::train::{Train, TrainId};

pub struct RunContext {
    pub queues: QueuePair,
    state: Mutex<ArbiterState>,
    track: Mutex<Option<TrainId>>,
    sink: SharedSink,
    clock: SimClock,
}

impl RunContext {
    pub fn new(target: usize, capacity: usize, sink: SharedSink, clock: SimClock) -> Self {
        Self {
            queues: QueuePair::new(capacity),
            state: Mutex::new(ArbiterState::new(target)),
            track: Mutex::new(None),
            sink,
            clock,
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn lock_state(&self) -> CrossingResult<MutexGuard<'_, ArbiterState>> {
        self.state
            .lock()
            .map_err(|_| CrossingError::fault("arbiter state lock poisoned"))
    }

    pub fn is_complete(&self) -> CrossingResult<bool> {
        Ok(self.lock_state()?.is_complete())
    }

    /// Timestamp an event for `train` and hand it to the sink.
    pub fn emit(&self, kind: EventKind, train: &Train) -> CrossingResult<()> {
        let event = CrossingEvent::new(self.clock.elapsed(), kind, train.id(), train.direction());
        self.sink.record(event)
    }

    /// Mark the track as held by `train`. Fails if another train holds it.
    pub fn occupy_track(&self, train: TrainId) -> CrossingResult<()> {
        let mut track = self
            .track
            .lock()
            .map_err(|_| CrossingError::fault("track lock poisoned"))?;
        if let Some(holder) = *track {
            return Err(CrossingError::fault(format!(
                "train {} admitted while train {} holds the track",
                train, holder
            )));
        }
        *track = Some(train);
        Ok(())
    }

    /// Release the track held by `train`.
    pub fn release_track(&self, train: TrainId) -> CrossingResult<()> {
        let mut track = self
            .track
            .lock()
            .map_err(|_| CrossingError::fault("track lock poisoned"))?;
        if *track != Some(train) {
            return Err(CrossingError::fault(format!(
                "train {} released a track it does not hold",
                train
            )));
        }
        *track = None;
        Ok(())
    }

    pub fn flush_sink(&self) -> CrossingResult<()> {
        self.sink.flush()
    }
}
