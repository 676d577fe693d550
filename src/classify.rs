use serde::Serialize;
use strum_macros::Display;

use crate::config::PaceThresholds;

/// Discrete speed bucket for an average game duration. `Display` yields the
/// css-class-style identifier ("fast", "normal", "bit-long", "long").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Pace {
    Fast,
    Normal,
    BitLong,
    Long,
}

impl Pace {
    /// User-facing description of the bucket.
    pub fn label(&self) -> &'static str {
        match self {
            Pace::Fast => "빠르게 끝나는 경기입니다",
            Pace::Normal => "일반적인 경기 소요 시간입니다",
            Pace::BitLong => "조금 긴 편이에요",
            Pace::Long => "시간 오래 걸리는 매치업입니다",
        }
    }
}

/// Bucket an average duration against ordered thresholds `t1 < t2 < t3`.
/// Buckets are half-open: an average exactly on a threshold lands in the
/// slower bucket.
pub fn classify(average_minutes: f64, thresholds: &PaceThresholds) -> Pace {
    if average_minutes < thresholds.t1 {
        Pace::Fast
    } else if average_minutes < thresholds.t2 {
        Pace::Normal
    } else if average_minutes < thresholds.t3 {
        Pace::BitLong
    } else {
        Pace::Long
    }
}
