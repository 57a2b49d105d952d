use chrono::{DateTime, FixedOffset};
use chrono_tz::Asia::Singapore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Readings for one region from one dataset fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub values: BTreeMap<String, f64>,
}

impl ReadingRecord {
    pub fn new(location: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            location: location.into(),
            latitude,
            longitude,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, field: impl Into<String>, value: f64) -> Self {
        self.values.insert(field.into(), value);
        self
    }
}

/// Total number of numeric fields across a fetch.
pub fn field_count(records: &[ReadingRecord]) -> usize {
    records.iter().map(|r| r.values.len()).sum()
}

/// Sorts after every real key.
pub const DISPLAY_TIMESTAMP_SENTINEL: &str = "9999-12-31\n23:59:59";

/// Fixed-width display key in Singapore local time, e.g. `2024-05-01\n10:00:00`.
///
/// The width never changes, so byte-wise ordering of two keys matches
/// chronological ordering.
pub fn display_key(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&Singapore)
        .format("%Y-%m-%d\n%H:%M:%S")
        .to_string()
}

/// Oldest update time among the datasets processed in the current poll cycle.
#[derive(Debug)]
pub struct DisplayTimestamp {
    key: Mutex<String>,
}

impl Default for DisplayTimestamp {
    fn default() -> Self {
        Self {
            key: Mutex::new(DISPLAY_TIMESTAMP_SENTINEL.to_string()),
        }
    }
}

impl DisplayTimestamp {
    pub fn reset(&self) {
        *self.key.lock() = DISPLAY_TIMESTAMP_SENTINEL.to_string();
    }

    /// Lower to `candidate` if it is older. Returns the resulting key.
    pub fn lower(&self, candidate: &str) -> String {
        let mut key = self.key.lock();
        if candidate < key.as_str() {
            *key = candidate.to_string();
        }
        key.clone()
    }

    /// `None` while no dataset has reported this cycle.
    pub fn current(&self) -> Option<String> {
        let key = self.key.lock();
        (key.as_str() != DISPLAY_TIMESTAMP_SENTINEL).then(|| key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_display_key_is_singapore_local() {
        assert_eq!(display_key(&ts("2024-05-01T10:00:00+08:00")), "2024-05-01\n10:00:00");
        assert_eq!(display_key(&ts("2024-05-01T02:00:00Z")), "2024-05-01\n10:00:00");
    }

    #[test]
    fn test_lower_keeps_oldest_regardless_of_order() {
        let older = display_key(&ts("2024-05-01T09:00:00+08:00"));
        let newer = display_key(&ts("2024-05-01T10:00:00+08:00"));

        let a = DisplayTimestamp::default();
        a.lower(&older);
        a.lower(&newer);

        let b = DisplayTimestamp::default();
        b.lower(&newer);
        b.lower(&older);

        assert_eq!(a.current(), Some(older.clone()));
        assert_eq!(b.current(), Some(older));
    }

    #[test]
    fn test_reset_returns_to_sentinel() {
        let display = DisplayTimestamp::default();
        assert_eq!(display.current(), None);

        display.lower("2024-05-01\n10:00:00");
        assert!(display.current().is_some());

        display.reset();
        assert_eq!(display.current(), None);
        // a newer key is accepted again after a reset
        assert_eq!(display.lower("2024-05-01\n11:00:00"), "2024-05-01\n11:00:00");
    }

    #[test]
    fn test_field_count() {
        let records = vec![
            ReadingRecord::new("north", 1.4, 103.8).with_value("psi_twenty_four_hourly", 45.0),
            ReadingRecord::new("south", 1.3, 103.8),
        ];
        assert_eq!(field_count(&records), 1);
        assert_eq!(field_count(&[]), 0);
    }
}
