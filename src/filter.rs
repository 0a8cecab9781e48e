use chrono::{DateTime, Utc};

use crate::exclusions::ExclusionSnapshot;
use crate::video::VideoRecord;

/// Constraint set a record must satisfy to be surfaced.
///
/// Every bound is optional; an empty spec accepts anything. Bounds are
/// inclusive on both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub min_duration_secs: Option<u64>,
    pub max_duration_secs: Option<u64>,
    pub min_views: Option<u64>,
    pub max_views: Option<u64>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_duration_secs = min;
        self.max_duration_secs = max;
        self
    }

    pub fn with_views(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_views = min;
        self.max_views = max;
        self
    }

    pub fn with_published_window(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.published_after = after;
        self.published_before = before;
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Decide whether a record passes the filter against one exclusion snapshot.
///
/// Exclusion wins over everything else; an empty or absent spec accepts any
/// record that is not excluded. A bound on a field the record carries no data
/// for never rejects, so a record with an opaque publish time passes any time
/// window.
pub fn matches(
    record: &VideoRecord,
    spec: Option<&FilterSpec>,
    exclusions: &ExclusionSnapshot,
) -> bool {
    if exclusions.contains(&record.id) {
        return false;
    }
    let spec = match spec {
        Some(spec) if !spec.is_empty() => spec,
        _ => return true,
    };

    if let Some(min) = spec.min_duration_secs {
        if record.duration_secs < min {
            return false;
        }
    }
    if let Some(max) = spec.max_duration_secs {
        if record.duration_secs > max {
            return false;
        }
    }

    if let Some(min) = spec.min_views {
        if record.views < min {
            return false;
        }
    }
    if let Some(max) = spec.max_views {
        if record.views > max {
            return false;
        }
    }

    // Only a resolved timestamp is subject to the window
    if let Some(published) = record.published.as_absolute() {
        if let Some(after) = spec.published_after {
            if published < after {
                return false;
            }
        }
        if let Some(before) = spec.published_before {
            if published > before {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::PublishedTime;
    use chrono::{Duration, TimeZone};

    fn record() -> VideoRecord {
        VideoRecord {
            id: "vid-1".into(),
            title: "A video".into(),
            views: 1_000_000,
            duration_secs: 90,
            published: PublishedTime::Absolute(now() - Duration::days(10)),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn excluding(ids: &[&str]) -> ExclusionSnapshot {
        ExclusionSnapshot::from_ids(ids.iter().map(|id| id.to_string()))
    }

    #[test]
    fn test_empty_spec_accepts() {
        let snapshot = ExclusionSnapshot::default();
        assert!(matches(&record(), None, &snapshot));
        assert!(matches(&record(), Some(&FilterSpec::new()), &snapshot));
    }

    #[test]
    fn test_exclusion_rejects_before_anything_else() {
        let snapshot = excluding(&["vid-1"]);
        assert!(!matches(&record(), None, &snapshot));
        assert!(!matches(&record(), Some(&FilterSpec::new()), &snapshot));
    }

    #[test]
    fn test_duration_bounds() {
        let snapshot = ExclusionSnapshot::default();
        let spec = FilterSpec::new().with_duration(Some(15), Some(175));
        assert!(matches(&record(), Some(&spec), &snapshot));

        let spec = FilterSpec::new().with_duration(Some(120), None);
        assert!(!matches(&record(), Some(&spec), &snapshot));

        let spec = FilterSpec::new().with_duration(None, Some(60));
        assert!(!matches(&record(), Some(&spec), &snapshot));

        // Inclusive at both ends
        let spec = FilterSpec::new().with_duration(Some(90), Some(90));
        assert!(matches(&record(), Some(&spec), &snapshot));
    }

    #[test]
    fn test_view_bounds() {
        let snapshot = ExclusionSnapshot::default();
        let spec = FilterSpec::new().with_views(Some(1_000_000), Some(1_000_000_000));
        assert!(matches(&record(), Some(&spec), &snapshot));

        let spec = FilterSpec::new().with_views(Some(2_000_000), None);
        assert!(!matches(&record(), Some(&spec), &snapshot));

        let spec = FilterSpec::new().with_views(None, Some(999_999));
        assert!(!matches(&record(), Some(&spec), &snapshot));
    }

    #[test]
    fn test_published_window_on_resolved_timestamps() {
        let snapshot = ExclusionSnapshot::default();
        let spec =
            FilterSpec::new().with_published_window(Some(now() - Duration::days(365)), Some(now()));
        assert!(matches(&record(), Some(&spec), &snapshot));

        let spec =
            FilterSpec::new().with_published_window(Some(now() - Duration::days(5)), Some(now()));
        assert!(!matches(&record(), Some(&spec), &snapshot));
    }

    #[test]
    fn test_unresolved_published_time_passes_window() {
        let snapshot = ExclusionSnapshot::default();
        let spec =
            FilterSpec::new().with_published_window(Some(now() - Duration::days(5)), Some(now()));

        let mut opaque = record();
        opaque.published = PublishedTime::Text("Streamed recently".into());
        assert!(matches(&opaque, Some(&spec), &snapshot));

        let mut unknown = record();
        unknown.published = PublishedTime::Unknown;
        assert!(matches(&unknown, Some(&spec), &snapshot));
    }

    #[test]
    fn test_bounds_combine() {
        let snapshot = ExclusionSnapshot::default();
        let spec = FilterSpec::new()
            .with_duration(Some(15), Some(175))
            .with_views(Some(1_000_000), Some(1_000_000_000))
            .with_published_window(Some(now() - Duration::days(365)), Some(now()));
        assert!(matches(&record(), Some(&spec), &snapshot));

        let mut slow = record();
        slow.views = 10;
        assert!(!matches(&slow, Some(&spec), &snapshot));
    }
}
