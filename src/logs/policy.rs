use chrono::{DateTime, Local};

/// Outcome of a rotation check, computed before every write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDecision {
    None,
    ByDate,
    BySize,
}

/// Snapshot of the live file the policy decides on
#[derive(Debug, Clone, Copy)]
pub struct FileState {
    pub bytes_written: u64,
    pub opened_at: DateTime<Local>,
}

/// Rules deciding when the live file rolls over
#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    size_threshold: u64,
    rotate_daily: bool,
}

impl RotationPolicy {
    pub fn new(size_threshold: u64, rotate_daily: bool) -> Self {
        Self {
            size_threshold,
            rotate_daily,
        }
    }

    pub fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    /// Decide whether the live file must rotate before a write of `record_size` bytes
    ///
    /// Date takes precedence over size. An empty file never rotates.
    pub fn decide(
        &self,
        active: Option<FileState>,
        record_size: u64,
        now: DateTime<Local>,
    ) -> RotationDecision {
        let Some(active) = active else {
            return RotationDecision::None;
        };

        if active.bytes_written == 0 {
            return RotationDecision::None;
        }

        if self.rotate_daily && active.opened_at.date_naive() != now.date_naive() {
            return RotationDecision::ByDate;
        }

        if active.bytes_written.saturating_add(record_size) > self.size_threshold {
            return RotationDecision::BySize;
        }

        RotationDecision::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn state(bytes_written: u64, opened_at: DateTime<Local>) -> Option<FileState> {
        Some(FileState {
            bytes_written,
            opened_at,
        })
    }

    #[test]
    fn test_no_active_file() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(policy.decide(None, 10, at(9, 12)), RotationDecision::None);
    }

    #[test]
    fn test_same_day_under_threshold() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(
            policy.decide(state(50, at(9, 8)), 50, at(9, 20)),
            RotationDecision::None
        );
    }

    #[test]
    fn test_size_overflow() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(
            policy.decide(state(95, at(9, 8)), 6, at(9, 9)),
            RotationDecision::BySize
        );
    }

    #[test]
    fn test_date_change() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(
            policy.decide(state(10, at(9, 23)), 5, at(10, 1)),
            RotationDecision::ByDate
        );
    }

    #[test]
    fn test_date_takes_precedence_over_size() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(
            policy.decide(state(99, at(9, 23)), 50, at(10, 0)),
            RotationDecision::ByDate
        );
    }

    #[test]
    fn test_daily_rotation_disabled() {
        let policy = RotationPolicy::new(100, false);
        assert_eq!(
            policy.decide(state(10, at(9, 23)), 5, at(10, 1)),
            RotationDecision::None
        );
        assert_eq!(
            policy.decide(state(99, at(9, 23)), 5, at(10, 1)),
            RotationDecision::BySize
        );
    }

    #[test]
    fn test_empty_file_never_rotates() {
        let policy = RotationPolicy::new(100, true);
        assert_eq!(
            policy.decide(state(0, at(9, 23)), 500, at(10, 1)),
            RotationDecision::None
        );
    }
}
