//! Run summary
//!
//! Reduces a sequence of results to counts plus the span of the whole run.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use super::test_result::{format_seconds, format_timestamp, Outcome, TestResult, Timing};

/// Aggregate statistics over a set of results
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub error: usize,
    pub failure: usize,
    pub success: usize,
    /// Earliest start among timed results
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Seconds from the earliest start to the latest end
    pub duration: Option<f64>,
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timestamp {
        Some(ts) => serializer.serialize_str(&format_timestamp(ts)),
        None => serializer.serialize_none(),
    }
}

impl Summary {
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Success: {} | Failure: {} | Error: {}",
            self.total, self.success, self.failure, self.error
        )?;
        if let Some(duration) = self.duration {
            write!(f, " | Duration: {}s", format_seconds(duration))?;
        }
        Ok(())
    }
}

/// Summarize `results`
///
/// Timing is a single scan keeping the earliest and the latest start seen;
/// on equal timestamps the first one encountered wins. Results without
/// timing count towards the totals only.
pub fn summarize<'a, I>(results: I) -> Summary
where
    I: IntoIterator<Item = &'a TestResult>,
{
    let mut total = 0;
    let mut error = 0;
    let mut failure = 0;
    let mut earliest: Option<&'a Timing> = None;
    let mut latest: Option<&'a Timing> = None;

    for result in results {
        total += 1;
        match result.outcome {
            Outcome::Error => error += 1,
            Outcome::Failure => failure += 1,
            Outcome::Success => {}
        }

        let Some(timing) = result.timing.as_ref() else {
            continue;
        };
        if earliest.map_or(true, |e| timing.timestamp < e.timestamp) {
            earliest = Some(timing);
        }
        if latest.map_or(true, |l| timing.timestamp > l.timestamp) {
            latest = Some(timing);
        }
    }

    let (timestamp, duration) = match (earliest, latest) {
        (Some(first), Some(last)) => {
            let micros = i128::from(last.end_micros()) - i128::from(first.start_micros());
            (Some(first.timestamp), Some(micros as f64 / 1e6))
        }
        _ => (None, None),
    };

    Summary {
        total,
        error,
        failure,
        success: total - error - failure,
        timestamp,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 4, 10, 0, 0).unwrap()
    }

    fn timed(result: TestResult, offset_ms: i64, time: f64) -> TestResult {
        result.with_timing(Timing::new(t0() + Duration::milliseconds(offset_ms), time).unwrap())
    }

    #[test]
    fn test_empty() {
        let summary = summarize(&[] as &[TestResult]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.error, 0);
        assert_eq!(summary.failure, 0);
        assert_eq!(summary.success, 0);
        assert!(summary.timestamp.is_none());
        assert!(summary.duration.is_none());
    }

    #[test]
    fn test_counts_without_timing() {
        let results = vec![
            TestResult::success(),
            TestResult::failure("nope"),
            TestResult::error("crashed"),
            TestResult::error("crashed again"),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.error, 2);
        assert_eq!(summary.failure, 1);
        assert_eq!(summary.success, 1);
        assert!(summary.timestamp.is_none());
        assert!(summary.duration.is_none());
    }

    #[test]
    fn test_span_not_sum() {
        let results = vec![
            timed(TestResult::success(), 0, 1.0),
            timed(TestResult::success(), 5_000, 2.0),
            timed(TestResult::failure("x"), 1_000, 0.5),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.timestamp, Some(t0()));
        assert_eq!(summary.duration, Some(7.0));
    }

    #[test]
    fn test_span_invariant_under_reordering() {
        let a = timed(TestResult::success(), 0, 1.0);
        let b = timed(TestResult::success(), 5_000, 2.0);
        let c = timed(TestResult::success(), 1_000, 0.5);
        let orders = [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), b.clone(), a.clone()],
            vec![b.clone(), a.clone(), c.clone()],
            vec![c, a, b],
        ];
        for order in &orders {
            let summary = summarize(order);
            assert_eq!(summary.timestamp, Some(t0()));
            assert_eq!(summary.duration, Some(7.0));
        }
    }

    #[test]
    fn test_latest_is_by_start_not_by_end() {
        // the long-running early test ends last, but the latest start decides
        let results = vec![
            timed(TestResult::success(), 0, 60.0),
            timed(TestResult::success(), 2_000, 1.0),
        ];
        assert_eq!(summarize(&results).duration, Some(3.0));
    }

    #[test]
    fn test_untimed_results_skipped_for_timing() {
        let results = vec![
            TestResult::success(),
            timed(TestResult::success(), 1_000, 0.25),
            TestResult::error("no timing"),
        ];
        let summary = summarize(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.timestamp, Some(t0() + Duration::seconds(1)));
        assert_eq!(summary.duration, Some(0.25));
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let results = vec![
            timed(TestResult::success(), 0, 1.0),
            timed(TestResult::success(), 0, 3.0),
        ];
        assert_eq!(summarize(&results).duration, Some(1.0));
    }

    #[test]
    fn test_microsecond_rounding() {
        let results = vec![
            timed(TestResult::success(), 0, 0.1),
            timed(TestResult::success(), 100, 0.2),
        ];
        assert_eq!(summarize(&results).duration, Some(0.3));
    }

    #[test]
    fn test_single_zero_duration_is_present() {
        let results = vec![timed(TestResult::success(), 0, 0.0)];
        let summary = summarize(&results);
        assert_eq!(summary.duration, Some(0.0));
        assert_eq!(summary.timestamp, Some(t0()));
    }

    #[test]
    fn test_serialized_absent_timing_is_null() {
        let value = serde_json::to_value(summarize(&[] as &[TestResult])).unwrap();
        assert!(value["timestamp"].is_null());
        assert!(value["duration"].is_null());
        assert_eq!(value["total"], 0);
    }

    #[test]
    fn test_long_durations_do_not_overflow() {
        let results = vec![timed(TestResult::success(), 0, 1e12)];
        assert_eq!(summarize(&results).duration, Some(1e12));

        let unchecked = TestResult::success().with_timing(Timing {
            timestamp: t0(),
            time: 1e13,
        });
        let duration = summarize(&[unchecked]).duration.unwrap();
        assert!(duration > 0.0);
    }
}
