use super::trace::{TaskStatus, TraceRecord};
use crate::constants::DEFAULT_STATS_TAG;

/// Decides which trace rows are collected: the tag must contain the stats tag (exact,
/// case-sensitive substring) and the task must have completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsFilter {
    tag: String,
}

impl StatsFilter {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn accepts(&self, record: &TraceRecord) -> bool {
        record.tag().contains(self.tag.as_str()) && record.status() == TaskStatus::Completed
    }
}

impl Default for StatsFilter {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(tag: &str, status: &str) -> TraceRecord {
        TraceRecord::parse(2, &format!("7\tprocA\t{}\t{}\t0\t1", tag, status))
            .unwrap()
            .unwrap()
    }

    #[rstest]
    #[case::tagged_completed("sample1 getStats", "COMPLETED", true)]
    #[case::tag_in_middle("a getStats b", "COMPLETED", true)]
    #[case::untagged("sample1", "COMPLETED", false)]
    #[case::tag_without_space("sample1getStats", "COMPLETED", false)]
    #[case::tag_wrong_case("sample1 getstats", "COMPLETED", false)]
    #[case::failed("sample1 getStats", "FAILED", false)]
    #[case::cached("sample1 getStats", "CACHED", false)]
    #[case::lowercase_status("sample1 getStats", "completed", false)]
    fn default_filter(#[case] tag: &str, #[case] status: &str, #[case] expected: bool) {
        assert_eq!(StatsFilter::default().accepts(&record(tag, status)), expected);
    }

    #[test]
    fn leading_tag_without_space_is_not_matched() {
        assert!(!StatsFilter::default().accepts(&record("getStats", "COMPLETED")));
    }

    #[test]
    fn custom_tag() {
        let filter = StatsFilter::new(" report");
        assert_eq!(filter.tag(), " report");
        assert!(filter.accepts(&record("x report", "COMPLETED")));
        assert!(!filter.accepts(&record("x getStats", "COMPLETED")));
    }
}
