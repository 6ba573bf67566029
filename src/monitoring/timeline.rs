//! Run Timeline
//!
//! Renders the recorded steps of a run as an ASCII Gantt chart for
//! CLI reports.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::workflow::{RunRecord, StepName, StepStatus};

/// Width of the bar area in characters.
const CHART_WIDTH: usize = 50;

/// One bar of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub step: StepName,
    pub status: StepStatus,
    /// Offset from the run start, in milliseconds.
    pub offset_ms: i64,
    pub duration_ms: i64,
}

/// Step timings of a single run, ordered by start time.
#[derive(Debug, Clone)]
pub struct RunTimeline {
    entries: Vec<TimelineEntry>,
    total_ms: i64,
}

impl RunTimeline {
    pub fn from_record(record: &RunRecord) -> Self {
        let origin = record.started_at.unwrap_or(record.created_at);

        let mut entries: Vec<TimelineEntry> = record
            .steps
            .iter()
            .map(|outcome| TimelineEntry {
                step: outcome.step_name,
                status: outcome.status,
                offset_ms: millis_between(origin, outcome.started_at),
                duration_ms: outcome.duration_ms.max(0),
            })
            .collect();
        entries.sort_by_key(|e| e.offset_ms);

        let end = record
            .finished_at
            .or_else(|| record.steps.last().map(|s| s.finished_at))
            .unwrap_or(origin);

        Self {
            entries,
            total_ms: millis_between(origin, end),
        }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn total_ms(&self) -> i64 {
        self.total_ms
    }

    /// Step durations in milliseconds, keyed by step name.
    pub fn durations(&self) -> HashMap<StepName, i64> {
        self.entries
            .iter()
            .map(|e| (e.step, e.duration_ms))
            .collect()
    }

    /// Generates the chart.
    ///
    /// Each recorded step is one row; the bar marks when it ran relative
    /// to the whole run. Skipped steps get a row without a bar.
    pub fn gantt_chart(&self) -> String {
        let mut output = String::from("\nExecution Timeline:\n\n");

        if self.entries.is_empty() {
            output.push_str("(no steps recorded)\n");
            return output;
        }

        let scale = if self.total_ms > 0 {
            CHART_WIDTH as f64 / self.total_ms as f64
        } else {
            0.0
        };

        for entry in &self.entries {
            let bar = if entry.status == StepStatus::Skipped {
                String::new()
            } else {
                let start_pos = ((entry.offset_ms as f64 * scale) as usize).min(CHART_WIDTH - 1);
                let width = ((entry.duration_ms as f64 * scale).max(1.0) as usize)
                    .min(CHART_WIDTH - start_pos);
                format!("{}{}", " ".repeat(start_pos), marker(entry.status).repeat(width))
            };

            output.push_str(&format!(
                "{} |{:width$}| {:>9} ({} ms)\n",
                truncate(entry.step.as_str(), 10),
                bar,
                entry.status.to_string(),
                entry.duration_ms,
                width = CHART_WIDTH
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", self.total_ms));
        output
    }
}

/// Renders the timeline of `record`.
pub fn render_timeline(record: &RunRecord) -> String {
    RunTimeline::from_record(record).gantt_chart()
}

fn marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Success => "#",
        StepStatus::Failed => "x",
        StepStatus::TimedOut => "~",
        StepStatus::Skipped => " ",
    }
}

fn millis_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds().max(0)
}

/// Pads or truncates a string to exactly `max_len` characters.
pub fn truncate(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{RunId, RunRequest, StepOutcome};
    use chrono::Duration;
    use serde_json::json;

    fn outcome_at(
        step: StepName,
        status: StepStatus,
        start: DateTime<Utc>,
        ms: i64,
    ) -> StepOutcome {
        let finished_at = start + Duration::milliseconds(ms);
        StepOutcome {
            step_name: step,
            status,
            started_at: start,
            finished_at,
            duration_ms: ms,
            error_message: (status != StepStatus::Success).then(|| "boom".to_string()),
            result_summary: (status == StepStatus::Success).then(|| json!([])),
        }
    }

    fn finished_record() -> RunRecord {
        let mut record = RunRecord::new(RunId::new(), RunRequest::new("acct1"));
        let t0 = Utc::now();
        record.started_at = Some(t0);
        record.steps = vec![
            outcome_at(StepName::Fetch, StepStatus::Success, t0, 100),
            outcome_at(
                StepName::Classify,
                StepStatus::Failed,
                t0 + Duration::milliseconds(100),
                50,
            ),
            outcome_at(
                StepName::Transform,
                StepStatus::TimedOut,
                t0 + Duration::milliseconds(150),
                300,
            ),
            outcome_at(
                StepName::Publish,
                StepStatus::Success,
                t0 + Duration::milliseconds(450),
                50,
            ),
        ];
        record.finished_at = Some(t0 + Duration::milliseconds(500));
        record
    }

    #[test]
    fn test_entries_follow_steps() {
        let timeline = RunTimeline::from_record(&finished_record());

        assert_eq!(timeline.entries().len(), 4);
        assert_eq!(timeline.total_ms(), 500);
        assert_eq!(timeline.entries()[2].offset_ms, 150);
        assert_eq!(timeline.durations()[&StepName::Transform], 300);
    }

    #[test]
    fn test_gantt_chart_lists_every_step() {
        let chart = render_timeline(&finished_record());

        for name in ["fetch", "classify", "transform", "publish"] {
            assert!(chart.contains(name), "missing {} in:\n{}", name, chart);
        }
        assert!(chart.contains("TIMED_OUT"));
        let classify_line = chart.lines().find(|l| l.starts_with("classify")).unwrap();
        assert!(classify_line.contains("|") && classify_line.contains('x'));
        assert!(chart.contains("Total: 500 ms"));
    }

    #[test]
    fn test_gantt_chart_empty_run() {
        let record = RunRecord::new(RunId::new(), RunRequest::new("acct1"));
        let chart = render_timeline(&record);

        assert!(chart.contains("Timeline"));
        assert!(chart.contains("no steps recorded"));
    }

    #[test]
    fn test_skipped_step_has_no_bar() {
        let mut record = finished_record();
        record.steps[3].status = StepStatus::Skipped;
        let chart = render_timeline(&record);

        let publish_line = chart.lines().find(|l| l.starts_with("publish")).unwrap();
        assert!(!publish_line.contains('#'));
        assert!(publish_line.contains("SKIPPED"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("fetch", 8), "fetch   ");
        assert_eq!(truncate("transformation", 8), "trans...");
    }
}
