// Purpose: The load actor, one concurrent task per train.

use std::sync::Arc;

use tokio::sync::{mpsc, Barrier};
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::cancel::CancelSignal;
use crate::context::RunContext;
use crate::error::{CrossingError, CrossingResult};
use crate::event::EventKind;
use crate::train::{Direction, Train, TrainId};

/// Sent to the arbiter once a train sits in its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyNotice {
    pub train: TrainId,
    pub direction: Direction,
}

/// Simulates one train's loading phase and hands it to the arbiter.
pub struct LoadActor {
    train: Train,
    ctx: Arc<RunContext>,
    notices: mpsc::UnboundedSender<ReadyNotice>,
    start: Arc<Barrier>,
    cancel: CancelSignal,
}

impl LoadActor {
    pub fn new(
        train: Train,
        ctx: Arc<RunContext>,
        notices: mpsc::UnboundedSender<ReadyNotice>,
        start: Arc<Barrier>,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            train,
            ctx,
            notices,
            start,
            cancel,
        }
    }

    /// Wait for the common start, load, then queue the train and notify.
    ///
    /// The queue insert is complete before the notice is sent, so the
    /// arbiter never sees a notice for a train that is not yet queued.
    pub async fn run(mut self) -> CrossingResult<()> {
        let id = self.train.id();

        tokio::select! {
            _ = self.start.wait() => {}
            _ = self.cancel.cancelled() => return Err(CrossingError::Cancelled),
        }
        self.ctx.clock().anchor();
        trace!(train = %id, "released from start barrier");

        tokio::select! {
            _ = sleep(self.train.loading()) => {}
            _ = self.cancel.cancelled() => return Err(CrossingError::Cancelled),
        }

        self.ctx.emit(EventKind::ReadyToGo, &self.train)?;
        let position = self.ctx.queues.enqueue(self.train)?;
        debug!(
            train = %id,
            direction = %self.train.direction(),
            position,
            "train queued"
        );

        let notice = ReadyNotice {
            train: id,
            direction: self.train.direction(),
        };
        if self.notices.send(notice).is_err() {
            // Only happens once the arbiter has stopped, which the run reports.
            debug!(train = %id, "arbiter gone before ready notice");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::clock::SimClock;
    use crate::event::MemorySink;
    use crate::train::Priority;
    use std::time::Duration;

    fn train(id: usize, loading_ms: u64) -> Train {
        Train::new(
            TrainId(id),
            Direction::Westbound,
            Priority::Low,
            Duration::from_millis(loading_ms),
            Duration::from_millis(100),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_queues_before_notifying() {
        let sink = Arc::new(MemorySink::new());
        let ctx = Arc::new(RunContext::new(1, 4, sink.clone(), SimClock::start_now()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_handle, signal) = cancel_pair();
        let barrier = Arc::new(Barrier::new(1));

        let actor = LoadActor::new(train(0, 300), ctx.clone(), tx, barrier, signal);
        let task = tokio::spawn(actor.run());

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.train, TrainId(0));
        assert_eq!(ctx.queues.waiting(Direction::Westbound).unwrap(), 1);
        task.await.unwrap().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::ReadyToGo);
        assert_eq!(events[0].elapsed.to_string(), "00:00:00.3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_stops_on_cancel() {
        let ctx = Arc::new(RunContext::new(
            1,
            4,
            Arc::new(MemorySink::new()),
            SimClock::start_now(),
        ));
        let (tx, _rx) = mpsc::unbounded_channel();
        let (handle, signal) = cancel_pair();
        // Two parties and only one arrives: the actor is stuck at the barrier.
        let barrier = Arc::new(Barrier::new(2));

        let actor = LoadActor::new(train(0, 0), ctx.clone(), tx, barrier, signal);
        let task = tokio::spawn(actor.run());
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CrossingError::Cancelled)));
        assert_eq!(ctx.queues.waiting(Direction::Westbound).unwrap(), 0);
    }
}
