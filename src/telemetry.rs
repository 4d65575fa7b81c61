use crate::tasks::Status;

/// Telemetry events sent from the executor to the progress display
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// A leaf check began running
    CheckStarted,
    /// A leaf check resolved, including leaves skipped after cancellation
    CheckCompleted { status: Status, duration_ms: u64 },
}

/// Statistics aggregated from telemetry events
#[derive(Debug, Default, Clone)]
pub struct ProgressStats {
    pub checks_started: usize,
    pub checks_completed: usize,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub checks_skipped: usize,
    pub check_durations_ms: Vec<u64>,
}

impl ProgressStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a telemetry event
    pub fn update(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::CheckStarted => {
                self.checks_started += 1;
            }
            TelemetryEvent::CheckCompleted {
                status,
                duration_ms,
            } => {
                self.checks_completed += 1;
                match status {
                    Status::Success => self.checks_passed += 1,
                    Status::Failure => self.checks_failed += 1,
                    Status::Skipped => self.checks_skipped += 1,
                }
                // Skipped checks never ran, so they would drag the percentiles down
                if *status != Status::Skipped {
                    self.check_durations_ms.push(*duration_ms);
                }
            }
        }
    }

    /// Calculate percentile from check durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.check_durations_ms.is_empty() {
            return None;
        }

        let mut sorted = self.check_durations_ms.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }

    /// Get p50, p90, p99 percentiles
    pub fn get_percentiles(&self) -> (Option<u64>, Option<u64>, Option<u64>) {
        (
            self.percentile(50.0),
            self.percentile(90.0),
            self.percentile(99.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_count_by_status() {
        let mut stats = ProgressStats::new();
        for status in [Status::Success, Status::Failure, Status::Success, Status::Skipped] {
            stats.update(&TelemetryEvent::CheckStarted);
            stats.update(&TelemetryEvent::CheckCompleted {
                status,
                duration_ms: 10,
            });
        }

        assert_eq!(stats.checks_started, 4);
        assert_eq!(stats.checks_completed, 4);
        assert_eq!(stats.checks_passed, 2);
        assert_eq!(stats.checks_failed, 1);
        assert_eq!(stats.checks_skipped, 1);
        assert_eq!(stats.check_durations_ms.len(), 3);
    }

    #[test]
    fn test_percentiles() {
        let mut stats = ProgressStats::new();
        assert_eq!(stats.get_percentiles(), (None, None, None));

        for duration_ms in 1..=100 {
            stats.update(&TelemetryEvent::CheckCompleted {
                status: Status::Success,
                duration_ms,
            });
        }

        assert_eq!(stats.get_percentiles(), (Some(50), Some(90), Some(99)));
        assert_eq!(stats.percentile(0.0), Some(1));
    }
}
