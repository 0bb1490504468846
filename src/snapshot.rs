use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::bustime::entities::{BustimeMessage, BustimeResponse, Prediction};

/// The predictions from one successful fetch and when it completed.
/// Serializes to the published `next.json` document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    #[serde(rename = "Bustime")]
    bustime: BustimeResponse,
    #[serde(rename = "GeneratedAt")]
    generated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(bustime: BustimeResponse, generated_at: DateTime<Utc>) -> Self {
        Snapshot {
            bustime,
            generated_at: generated_at.trunc_subsecs(0),
        }
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.bustime.body.predictions
    }

    pub fn messages(&self) -> &[BustimeMessage] {
        &self.bustime.body.messages
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.generated_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::bustime::entities::PredictionsBody;

    fn empty() -> BustimeResponse {
        BustimeResponse {
            body: PredictionsBody::default(),
        }
    }

    #[test]
    fn test_generated_at_has_second_precision() {
        let at = Utc.timestamp_opt(1_792_152_000, 987_654_321).unwrap();
        let snapshot = Snapshot::new(empty(), at);

        assert_eq!(snapshot.generated_at().timestamp(), 1_792_152_000);
        assert_eq!(snapshot.generated_at().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let snapshot = Snapshot::new(empty(), at);

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Bustime": { "bustime-response": { "prd": [] } },
                "GeneratedAt": "2026-10-16T12:00:00Z"
            })
        );
    }

    #[test]
    fn test_staleness() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
        let snapshot = Snapshot::new(empty(), at);
        let later = at + Duration::minutes(3);

        assert_eq!(snapshot.age(later), Duration::minutes(3));
        assert!(snapshot.is_stale(later, Duration::minutes(2)));
        assert!(!snapshot.is_stale(later, Duration::minutes(5)));
    }
}
