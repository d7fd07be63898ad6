// Purpose: Defines crossing events and the sinks that receive them.
//
// Sinks are shared by every task of a run. Each implementation serializes its
// own appends so that concurrent events never interleave inside one line.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::Elapsed;
use crate::error::{CrossingError, CrossingResult};
use crate::train::{Direction, TrainId};

/// What happened to a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Loading finished and the train joined its queue.
    ReadyToGo,
    /// The arbiter granted the track.
    EnteredTrack,
    /// The train cleared the track.
    ExitedTrack,
}

/// One timestamped notification for the event sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub elapsed: Elapsed,
    pub kind: EventKind,
    pub train: TrainId,
    pub direction: Direction,
}

impl CrossingEvent {
    pub fn new(elapsed: Elapsed, kind: EventKind, train: TrainId, direction: Direction) -> Self {
        Self {
            elapsed,
            kind,
            train,
            direction,
        }
    }
}

impl fmt::Display for CrossingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::ReadyToGo => write!(
                f,
                "{} Train {:2} is ready to go {:>4}",
                self.elapsed, self.train, self.direction
            ),
            EventKind::EnteredTrack => write!(
                f,
                "{} Train {:2} is ON the main track going {:>4}",
                self.elapsed, self.train, self.direction
            ),
            EventKind::ExitedTrack => write!(
                f,
                "{} Train {:2} is OFF the main track after going {:>4}",
                self.elapsed, self.train, self.direction
            ),
        }
    }
}

/// Receiver of crossing events.
pub trait EventSink: Send + Sync {
    /// Append one event. Called concurrently from every task of a run.
    fn record(&self, event: CrossingEvent) -> CrossingResult<()>;

    /// Push buffered output to its destination.
    fn flush(&self) -> CrossingResult<()> {
        Ok(())
    }
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn EventSink>;

/// Keeps every event in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CrossingEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<CrossingEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: CrossingEvent) -> CrossingResult<()> {
        self.events
            .lock()
            .map_err(|_| CrossingError::fault("memory sink lock poisoned"))?
            .push(event);
        Ok(())
    }
}

/// Writes one formatted line per event.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> CrossingResult<W> {
        self.writer
            .into_inner()
            .map_err(|_| CrossingError::fault("writer sink lock poisoned"))
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn record(&self, event: CrossingEvent) -> CrossingResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| CrossingError::fault("writer sink lock poisoned"))?;
        writeln!(writer, "{}", event)?;
        Ok(())
    }

    fn flush(&self) -> CrossingResult<()> {
        self.writer
            .lock()
            .map_err(|_| CrossingError::fault("writer sink lock poisoned"))?
            .flush()?;
        Ok(())
    }
}

/// Forwards events to `tracing` as structured records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: CrossingEvent) -> CrossingResult<()> {
        info!(
            elapsed = %event.elapsed,
            kind = ?event.kind,
            train = %event.train,
            direction = %event.direction,
            "crossing event"
        );
        Ok(())
    }
}

/// Delivers every event to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<SharedSink>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn record(&self, event: CrossingEvent) -> CrossingResult<()> {
        for sink in &self.sinks {
            sink.record(event)?;
        }
        Ok(())
    }

    fn flush(&self) -> CrossingResult<()> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(kind: EventKind) -> CrossingEvent {
        CrossingEvent::new(
            Elapsed::new(Duration::from_millis(1_000)),
            kind,
            TrainId(2),
            Direction::Westbound,
        )
    }

    #[test]
    fn test_event_lines() {
        assert_eq!(
            event(EventKind::ReadyToGo).to_string(),
            "00:00:01.0 Train  2 is ready to go West"
        );
        assert_eq!(
            event(EventKind::EnteredTrack).to_string(),
            "00:00:01.0 Train  2 is ON the main track going West"
        );
        assert_eq!(
            event(EventKind::ExitedTrack).to_string(),
            "00:00:01.0 Train  2 is OFF the main track after going West"
        );
    }

    #[test]
    fn test_writer_sink_appends_lines() {
        let sink = WriterSink::new(Vec::new());
        sink.record(event(EventKind::ReadyToGo)).unwrap();
        sink.record(event(EventKind::EnteredTrack)).unwrap();
        sink.flush().unwrap();

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("ON the main track going West"));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = Arc::new(MemorySink::new());
        let second = Arc::new(MemorySink::new());
        let fanout = FanoutSink::new()
            .with_sink(first.clone())
            .with_sink(second.clone())
            .with_sink(Arc::new(TracingSink));
        assert_eq!(fanout.len(), 3);

        fanout.record(event(EventKind::ExitedTrack)).unwrap();
        assert_eq!(first.events(), second.events());
        assert_eq!(first.events().len(), 1);
    }
}
