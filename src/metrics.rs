use crate::wait_time::WaitTimeRecord;
use serde::Serialize;

/// Aggregate wait statistics for a group of PRs.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct Summary {
    /// Every record handed to `aggregate`, measurable or not.
    pub count: usize,
    /// Records with a non-zero wait; the denominator of the average.
    pub aggregated: usize,
    pub total_wait_millis: i64,
    pub most_delayed: Option<WaitTimeRecord>,
    pub quickest: Option<WaitTimeRecord>,
}

impl Summary {
    pub fn average_millis(&self) -> Option<i64> {
        let aggregated = i64::try_from(self.aggregated).ok().filter(|&n| n > 0)?;
        Some(self.total_wait_millis / aggregated)
    }
}

/// Single pass over `records`. Zero-wait records are counted but take no part
/// in the total or the extremes; ties keep the earliest record.
pub fn aggregate(records: &[WaitTimeRecord]) -> Summary {
    let mut summary = Summary {
        count: records.len(),
        ..Summary::default()
    };

    for record in records.iter().filter(|record| record.is_aggregable()) {
        summary.aggregated += 1;
        summary.total_wait_millis += record.wait_millis;

        if summary
            .most_delayed
            .as_ref()
            .map_or(true, |current| record.wait_millis > current.wait_millis)
        {
            summary.most_delayed = Some(record.clone());
        }
        if summary
            .quickest
            .as_ref()
            .map_or(true, |current| record.wait_millis < current.wait_millis)
        {
            summary.quickest = Some(record.clone());
        }
    }

    summary
}

/// Average wait of `with` minus that of `without`; positive means PRs in
/// `with` waited longer.
pub fn compare(with: &Summary, without: &Summary) -> Option<i64> {
    Some(with.average_millis()? - without.average_millis()?)
}
