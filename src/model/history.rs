use serde::Serialize;

/// Outcome of a historical collection run.
///
/// `average_minutes` is `None` when no durations could be collected over the
/// requested range; that is a valid "insufficient data" result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct HistoryResult {
    pub average_minutes: Option<f64>,
    /// Collected game durations in minutes, in date order.
    pub samples: Vec<u32>,
}
