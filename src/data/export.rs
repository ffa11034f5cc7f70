//! Absolute time bounds for the CSV export.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};

use super::window::{
    format_local, InvalidRangeError, TimeWindow, WindowSelection, MAX_WINDOW_HOURS,
};

/// Export bounds, already serialized the way the backend expects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRange {
    pub start: String,
    pub end: String,
}

impl ExportRange {
    /// Build export bounds from the current selection.
    ///
    /// An applied custom window is sent verbatim as local second-precision
    /// time. A preset is anchored at `now` and sent as UTC instants, since
    /// there is no local wall-clock value to preserve. A draft custom window
    /// is refused rather than guessed.
    pub fn build(selection: &WindowSelection, now: DateTime<Utc>) -> Result<Self, InvalidRangeError> {
        match selection {
            WindowSelection::Draft { .. } => Err(InvalidRangeError::Unconfirmed),
            WindowSelection::Applied(TimeWindow::Custom { start, end }) => {
                if start >= end {
                    return Err(InvalidRangeError::NotIncreasing {
                        start: format_local(start),
                        end: format_local(end),
                    });
                }
                Ok(Self {
                    start: format_local(start),
                    end: format_local(end),
                })
            }
            WindowSelection::Applied(TimeWindow::Preset { hours }) => {
                let start = TimeDelta::try_hours(i64::from(*hours))
                    .and_then(|span| now.checked_sub_signed(span))
                    .filter(|_| *hours <= MAX_WINDOW_HOURS)
                    .ok_or(InvalidRangeError::TooLong { hours: *hours })?;
                Ok(Self {
                    start: start.to_rfc3339_opts(SecondsFormat::Secs, true),
                    end: now.to_rfc3339_opts(SecondsFormat::Secs, true),
                })
            }
        }
    }

    pub fn query_pairs(&self) -> [(&'static str, &str); 2] {
        [("start", self.start.as_str()), ("end", self.end.as_str())]
    }

    pub fn query_string(&self) -> String {
        format!("start={}&end={}", self.start, self.end)
    }
}

/// Suggested file name for an export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("sensor_data_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::window::parse_local;
    use chrono::TimeZone;

    #[test]
    fn test_preset_anchors_at_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = ExportRange::build(&WindowSelection::preset(24), now).unwrap();

        assert_eq!(range.start, "2024-01-01T00:00:00Z");
        assert_eq!(range.end, "2024-01-02T00:00:00Z");
        assert_eq!(range.query_string(), "start=2024-01-01T00:00:00Z&end=2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_custom_is_verbatim_local() {
        let window = TimeWindow::custom(Some("2024-01-01T09:00"), Some("2024-01-01T10:30")).unwrap();
        let range = ExportRange::build(&WindowSelection::Applied(window), Utc::now()).unwrap();

        assert_eq!(range.start, "2024-01-01T09:00:00");
        assert_eq!(range.end, "2024-01-01T10:30:00");
    }

    #[test]
    fn test_draft_is_refused() {
        let draft = WindowSelection::Draft {
            start: Some("2024-01-01T09:00".to_string()),
            end: None,
        };
        assert_eq!(
            ExportRange::build(&draft, Utc::now()),
            Err(InvalidRangeError::Unconfirmed)
        );
    }

    #[test]
    fn test_reversed_custom_is_refused() {
        let window = TimeWindow::Custom {
            start: parse_local("2024-01-01T10:00").unwrap(),
            end: parse_local("2024-01-01T09:00").unwrap(),
        };
        assert!(ExportRange::build(&WindowSelection::Applied(window), Utc::now()).is_err());
    }

    #[test]
    fn test_huge_preset_is_refused() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(
            ExportRange::build(&WindowSelection::preset(u32::MAX), now),
            Err(InvalidRangeError::TooLong { hours: u32::MAX })
        );

        let longest = ExportRange::build(&WindowSelection::preset(MAX_WINDOW_HOURS), now).unwrap();
        assert_eq!(longest.end, "2024-01-02T00:00:00Z");
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_filename(date), "sensor_data_2024-03-09.csv");
    }
}
