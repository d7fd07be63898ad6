// Purpose: Turns the textual train description into validated train records.
//
// A record is three whitespace separated fields: a direction marker
// (`e`, `E`, `w`, `W`), a loading time and a crossing time, both counted in
// time units. Records may be split across lines freely.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CrossingError, CrossingResult};
use crate::train::{Train, TrainId};

/// Trains accepted from one input, plus what had to be left out.
#[derive(Debug)]
pub struct LoadedTrains {
    pub trains: Vec<Train>,
    /// Records dropped because the capacity was reached. They are counted,
    /// not parsed.
    pub rejected: usize,
    pub capacity: usize,
    /// The record that stopped parsing, if any. `trains` holds the
    /// well-formed records before it.
    pub malformed: Option<CrossingError>,
}

impl LoadedTrains {
    /// The capacity warning, if any record was dropped.
    pub fn capacity_warning(&self) -> Option<CrossingError> {
        (self.rejected > 0).then(|| CrossingError::CapacityExceeded {
            max: self.capacity,
            rejected: self.rejected,
        })
    }

    /// Every problem worth reporting to the caller. None of them stops the
    /// accepted trains from running.
    pub fn warnings(&self) -> Vec<String> {
        self.malformed
            .iter()
            .map(ToString::to_string)
            .chain(self.capacity_warning().map(|w| w.to_string()))
            .collect()
    }
}

/// Parse the records in `text`.
///
/// Parsing stops at the first malformed record, which is kept in `malformed`
/// next to the well-formed prefix. Once `capacity` trains are accepted the
/// rest of the input is only counted into `rejected`.
pub fn parse_records(text: &str, unit: Duration, capacity: usize) -> LoadedTrains {
    let mut fields = text.split_whitespace();
    let mut trains = Vec::new();
    let mut malformed = None;

    while trains.len() < capacity {
        let Some(marker) = fields.next() else {
            break;
        };
        let record = trains.len();
        match parse_record(record, marker, fields.next(), fields.next(), unit) {
            Ok(train) => {
                debug!(
                    train = %train.id(),
                    direction = %train.direction(),
                    "train record accepted"
                );
                trains.push(train);
            }
            Err(err) => {
                warn!(error = %err, accepted = trains.len(), "stopped reading train records");
                malformed = Some(err);
                break;
            }
        }
    }

    let rejected = if malformed.is_none() {
        fields.count().div_ceil(3)
    } else {
        0
    };
    let loaded = LoadedTrains {
        trains,
        rejected,
        capacity,
        malformed,
    };
    if let Some(warning) = loaded.capacity_warning() {
        warn!(%warning, "input exceeds train capacity");
    }
    loaded
}

fn parse_record(
    record: usize,
    marker: &str,
    loading: Option<&str>,
    crossing: Option<&str>,
    unit: Duration,
) -> CrossingResult<Train> {
    let marker = parse_marker(record, marker)?;
    let loading = parse_units(record, "loading time", loading)?;
    let crossing = parse_units(record, "crossing time", crossing)?;
    Train::from_marker(TrainId(record), marker, loading, crossing, unit)
}

fn parse_marker(record: usize, field: &str) -> CrossingResult<char> {
    let mut chars = field.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ ('e' | 'E' | 'w' | 'W')), None) => Ok(c),
        _ => Err(CrossingError::InputMalformed {
            record,
            reason: format!("expected direction marker e/E/w/W, found '{}'", field),
        }),
    }
}

fn parse_units(record: usize, what: &str, field: Option<&str>) -> CrossingResult<u32> {
    let field = field.ok_or_else(|| CrossingError::InputMalformed {
        record,
        reason: format!("missing {}", what),
    })?;
    field.parse::<u32>().map_err(|_| CrossingError::InputMalformed {
        record,
        reason: format!(
            "{} '{}' is not an integer between 0 and {}",
            what,
            field,
            u32::MAX
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::{Direction, Priority};

    const TENTH: Duration = Duration::from_millis(100);

    #[test]
    fn test_parse_basic_records() {
        let loaded = parse_records("E 2 3\nw 1 1\n", TENTH, 10);
        assert_eq!(loaded.trains.len(), 2);
        assert_eq!(loaded.rejected, 0);
        assert!(loaded.capacity_warning().is_none());

        let first = loaded.trains[0];
        assert_eq!(first.id(), TrainId(0));
        assert_eq!(first.direction(), Direction::Eastbound);
        assert_eq!(first.priority(), Priority::High);
        assert_eq!(first.loading(), Duration::from_millis(200));
        assert_eq!(first.crossing(), Duration::from_millis(300));

        let second = loaded.trains[1];
        assert_eq!(second.id(), TrainId(1));
        assert_eq!(second.priority(), Priority::Low);
    }

    #[test]
    fn test_records_may_span_lines() {
        let loaded = parse_records("  W\n 4 \n5 e 0 0", TENTH, 10);
        assert_eq!(loaded.trains.len(), 2);
        assert_eq!(loaded.trains[1].loading(), Duration::ZERO);
    }

    #[test]
    fn test_empty_input() {
        let loaded = parse_records("\n \n", TENTH, 10);
        assert!(loaded.trains.is_empty());
    }

    #[test]
    fn test_malformed_records() {
        let cases = ["x 1 1", "E 1", "E one 2", "E 1 -2", "EE 1 1", "e 1 1 w", "E 4294967296 1"];
        for (case, expected_record) in cases.iter().zip([0, 0, 0, 0, 0, 1, 0]) {
            let loaded = parse_records(case, TENTH, 10);
            match loaded.malformed {
                Some(CrossingError::InputMalformed { record, .. }) => {
                    assert_eq!(record, expected_record, "{}", case)
                }
                other => panic!("{}: expected malformed input, got {:?}", case, other),
            }
            assert_eq!(loaded.trains.len(), expected_record, "{}", case);
        }
    }

    #[test]
    fn test_malformed_record_keeps_prefix() {
        let loaded = parse_records("E 2 3\nw 1 1\nq 1 1\ne 1 1\n", TENTH, 100);
        let ids: Vec<TrainId> = loaded.trains.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TrainId(0), TrainId(1)]);
        assert!(matches!(
            loaded.malformed,
            Some(CrossingError::InputMalformed { record: 2, .. })
        ));
        assert_eq!(loaded.rejected, 0);
        assert_eq!(loaded.warnings().len(), 1);
    }

    #[test]
    fn test_largest_unit_count_is_accepted() {
        let loaded = parse_records("w 4294967295 0", Duration::from_millis(1), 10);
        assert!(loaded.malformed.is_none());
        assert_eq!(loaded.trains[0].loading(), Duration::from_millis(u32::MAX as u64));
    }

    #[test]
    fn test_capacity_boundary() {
        let input = "e 1 1\nw 1 1\nE 1 1\n";
        let exact = parse_records(input, TENTH, 3);
        assert_eq!(exact.trains.len(), 3);
        assert!(exact.capacity_warning().is_none());

        let over = parse_records(input, TENTH, 2);
        assert_eq!(over.trains.len(), 2);
        assert_eq!(over.rejected, 1);
        assert!(matches!(
            over.capacity_warning(),
            Some(CrossingError::CapacityExceeded { max: 2, rejected: 1 })
        ));
    }

    #[test]
    fn test_records_past_capacity_are_not_parsed() {
        let loaded = parse_records("e 1 1\nw 1 1\nE 1 1\nq 1 1\n", TENTH, 2);
        assert_eq!(loaded.trains.len(), 2);
        assert!(loaded.malformed.is_none());
        assert_eq!(loaded.rejected, 2);
        assert!(matches!(
            loaded.capacity_warning(),
            Some(CrossingError::CapacityExceeded { max: 2, rejected: 2 })
        ));
    }
}
