//! Time window selection and its translation into query parameters.
//!
//! A preset window ("last N hours") is fetched as soon as it is chosen.
//! A custom window goes through a draft stage: the user types the bounds,
//! and nothing is fetched until the range is explicitly applied.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Second-precision local timestamp format the backend expects.
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Longest preset window accepted, ten years.
pub const MAX_WINDOW_HOURS: u32 = 24 * 366 * 10;

/// Minute-precision format produced by datetime pickers.
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A custom window that cannot be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRangeError {
    #[error("custom range needs both a start and an end")]
    Missing,

    #[error("cannot read {0:?} as a local date and time")]
    Unparseable(String),

    #[error("range start {start} is not before its end {end}")]
    NotIncreasing { start: String, end: String },

    #[error("custom range has not been applied")]
    Unconfirmed,

    #[error("a {hours}h window is longer than the supported {max}h", max = MAX_WINDOW_HOURS)]
    TooLong { hours: u32 },
}

/// A concrete time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    /// The last `hours` hours, relative to the backend's clock.
    Preset { hours: u32 },
    /// Absolute local bounds; `start < end` for any window built by [`TimeWindow::custom`].
    Custom {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl TimeWindow {
    /// Validate user-entered bounds into a custom window.
    pub fn custom(start: Option<&str>, end: Option<&str>) -> Result<Self, InvalidRangeError> {
        let (Some(start), Some(end)) = (non_blank(start), non_blank(end)) else {
            return Err(InvalidRangeError::Missing);
        };
        let start = parse_local(start)?;
        let end = parse_local(end)?;
        check_order(start, end)?;
        Ok(TimeWindow::Custom { start, end })
    }

    /// Short description for status lines.
    pub fn describe(&self) -> String {
        match self {
            TimeWindow::Preset { hours } => format!("last {}h", hours),
            TimeWindow::Custom { start, end } => format!(
                "{} → {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

/// What the user currently has selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSelection {
    Applied(TimeWindow),
    /// Custom mode entered but not applied yet.
    Draft {
        start: Option<String>,
        end: Option<String>,
    },
}

impl WindowSelection {
    pub fn preset(hours: u32) -> Self {
        WindowSelection::Applied(TimeWindow::Preset { hours })
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, WindowSelection::Draft { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            WindowSelection::Applied(window) => window.describe(),
            WindowSelection::Draft { .. } => "custom (not applied)".to_string(),
        }
    }
}

/// Window parameters in the form the backend expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowQuery {
    Hours(u32),
    Range { start: String, end: String },
}

impl WindowQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            WindowQuery::Hours(hours) => vec![("hours", hours.to_string())],
            WindowQuery::Range { start, end } => {
                vec![("start", start.clone()), ("end", end.clone())]
            }
        }
    }
}

/// Time-series request: a window plus an optional single-node filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesQuery {
    pub window: WindowQuery,
    pub node_id: Option<String>,
}

impl TimeSeriesQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.window.query_pairs();
        if let Some(node_id) = &self.node_id {
            pairs.push(("node_id", node_id.clone()));
        }
        pairs
    }
}

/// Outcome of resolving a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Fetch(WindowQuery),
    /// Nothing to fetch until the draft range is applied.
    NoOp,
}

/// Resolve the current selection into query parameters.
pub fn resolve(selection: &WindowSelection) -> Result<Resolution, InvalidRangeError> {
    match selection {
        WindowSelection::Draft { .. } => Ok(Resolution::NoOp),
        WindowSelection::Applied(TimeWindow::Preset { hours }) => {
            Ok(Resolution::Fetch(WindowQuery::Hours(*hours)))
        }
        WindowSelection::Applied(TimeWindow::Custom { start, end }) => {
            check_order(*start, *end)?;
            Ok(Resolution::Fetch(WindowQuery::Range {
                start: format_local(start),
                end: format_local(end),
            }))
        }
    }
}

/// Parse a local date-time, accepting minute or second precision.
///
/// Minute-precision values are read with zero seconds. A space is accepted
/// in place of the `T` separator.
pub fn parse_local(raw: &str) -> Result<NaiveDateTime, InvalidRangeError> {
    let normalized = raw.trim().replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&normalized, LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, MINUTE_FORMAT))
        .map_err(|_| InvalidRangeError::Unparseable(raw.to_string()))
}

pub fn format_local(value: &NaiveDateTime) -> String {
    value.format(LOCAL_FORMAT).to_string()
}

fn check_order(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), InvalidRangeError> {
    if start >= end {
        return Err(InvalidRangeError::NotIncreasing {
            start: format_local(&start),
            end: format_local(&end),
        });
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Typed bounds through the same path the range editor takes.
    fn resolve_custom(start: Option<&str>, end: Option<&str>) -> Result<WindowQuery, InvalidRangeError> {
        let window = TimeWindow::custom(start, end)?;
        match resolve(&WindowSelection::Applied(window))? {
            Resolution::Fetch(query) => Ok(query),
            Resolution::NoOp => panic!("applied window resolved to no-op"),
        }
    }

    #[test]
    fn test_preset_passes_hours_through() {
        let resolution = resolve(&WindowSelection::preset(24)).unwrap();
        assert_eq!(resolution, Resolution::Fetch(WindowQuery::Hours(24)));
    }

    #[test]
    fn test_custom_appends_zero_seconds() {
        let query = resolve_custom(Some("2024-01-01T09:00"), Some("2024-01-01T10:00")).unwrap();
        assert_eq!(
            query,
            WindowQuery::Range {
                start: "2024-01-01T09:00:00".to_string(),
                end: "2024-01-01T10:00:00".to_string(),
            }
        );
    }

    #[test]
    fn test_custom_accepts_second_precision() {
        let query = resolve_custom(Some("2024-01-01 09:00:30"), Some("2024-01-01T09:01:00")).unwrap();
        assert_eq!(
            query.query_pairs(),
            vec![
                ("start", "2024-01-01T09:00:30".to_string()),
                ("end", "2024-01-01T09:01:00".to_string()),
            ]
        );
    }

    #[test]
    fn test_custom_rejects_reversed_range() {
        let err = resolve_custom(Some("2024-01-01T10:00"), Some("2024-01-01T09:00")).unwrap_err();
        assert!(matches!(err, InvalidRangeError::NotIncreasing { .. }));
    }

    #[test]
    fn test_custom_rejects_empty_range() {
        let err = resolve_custom(Some("2024-01-01T10:00"), Some("2024-01-01T10:00:00")).unwrap_err();
        assert!(matches!(err, InvalidRangeError::NotIncreasing { .. }));
    }

    #[test]
    fn test_custom_rejects_missing_bounds() {
        assert_eq!(
            resolve_custom(None, Some("2024-01-01T10:00")),
            Err(InvalidRangeError::Missing)
        );
        assert_eq!(
            resolve_custom(Some("2024-01-01T10:00"), Some("  ")),
            Err(InvalidRangeError::Missing)
        );
    }

    #[test]
    fn test_custom_rejects_garbage() {
        let err = resolve_custom(Some("tomorrow"), Some("2024-01-01T10:00")).unwrap_err();
        assert_eq!(err, InvalidRangeError::Unparseable("tomorrow".to_string()));
    }

    #[test]
    fn test_custom_validity_matches_ordering() {
        let bounds = ["2024-01-01T08:00", "2024-01-01T09:00", "2024-01-01T10:00"];
        for start in bounds {
            for end in bounds {
                let result = resolve_custom(Some(start), Some(end));
                assert_eq!(result.is_ok(), start < end, "{start} .. {end}");
            }
        }
    }

    #[test]
    fn test_draft_is_a_no_op() {
        let draft = WindowSelection::Draft {
            start: Some("2024-01-01T09:00".to_string()),
            end: Some("2024-01-01T10:00".to_string()),
        };
        assert_eq!(resolve(&draft).unwrap(), Resolution::NoOp);
    }

    #[test]
    fn test_resolve_rejects_hand_built_reversed_window() {
        let start = parse_local("2024-01-01T10:00").unwrap();
        let end = parse_local("2024-01-01T09:00").unwrap();
        let selection = WindowSelection::Applied(TimeWindow::Custom { start, end });
        assert!(resolve(&selection).is_err());
    }

    #[test]
    fn test_time_series_query_adds_node_filter() {
        let query = TimeSeriesQuery {
            window: WindowQuery::Hours(12),
            node_id: Some("!512397a3".to_string()),
        };
        assert_eq!(
            query.query_pairs(),
            vec![("hours", "12".to_string()), ("node_id", "!512397a3".to_string())]
        );
    }
}
