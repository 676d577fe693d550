//! Historical aggregation: walk a date range, keep the requested team's games,
//! collect their durations, and average.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::fetch::FetchOutcome;
use crate::model::{Fixture, HistoryResult};
use crate::teams;

/// The schedule and duration lookups the aggregation loop depends on.
///
/// Implemented by the live scraping pipeline and by in-memory mocks in tests.
#[allow(async_fn_in_trait)]
pub trait GameSource {
    /// Fixtures for one `YYYYMMDD` date.
    async fn fixtures(&mut self, date: &str) -> FetchOutcome<Vec<Fixture>>;
    /// Recorded duration of one game in minutes.
    async fn runtime(&mut self, game_id: &str, game_date: &str) -> FetchOutcome<u32>;
}

/// Inclusive date range, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Keep only the trailing `max_days` days of the range.
    pub fn clamp_trailing(self, max_days: Option<u32>) -> Self {
        match max_days {
            Some(n) if n > 0 => {
                let earliest = self.end - chrono::Days::new(u64::from(n) - 1);
                Self {
                    start: self.start.max(earliest),
                    end: self.end,
                }
            }
            _ => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Collect the average recorded duration of `team`'s games over `range`.
///
/// `rivals` restricts which opponents count; empty means any opponent. The
/// walk is strictly sequential, and no single date's or fixture's failure
/// aborts it; unreachable pages simply contribute no samples.
#[instrument(skip(source, rivals))]
pub async fn collect<S: GameSource>(
    source: &mut S,
    team: &str,
    rivals: &HashSet<String>,
    range: DateRange,
) -> HistoryResult {
    let my_team = teams::resolve(team);
    let rivals: HashSet<String> = rivals.iter().map(|r| teams::resolve(r)).collect();

    let mut samples: Vec<u32> = Vec::new();
    for date in range.iter() {
        let date_str = date.format("%Y%m%d").to_string();
        let fixtures = match source.fixtures(&date_str).await {
            FetchOutcome::Fetched(fixtures) => fixtures,
            FetchOutcome::NotFound => {
                debug!(date = %date_str, "no schedule for date");
                continue;
            }
            FetchOutcome::Transient(reason) => {
                warn!(date = %date_str, reason, "skipping unreachable date");
                continue;
            }
        };

        for fixture in fixtures {
            let Some(opponent) = opponent_for(&fixture, &my_team) else {
                continue;
            };
            if !rivals.is_empty() && !rivals.contains(&opponent) {
                continue;
            }
            match source.runtime(&fixture.game_id, &fixture.game_date).await {
                FetchOutcome::Fetched(minutes) => samples.push(minutes),
                FetchOutcome::NotFound => {
                    debug!(game_id = %fixture.game_id, "no recorded runtime")
                }
                FetchOutcome::Transient(reason) => {
                    warn!(game_id = %fixture.game_id, reason, "skipping unreachable game")
                }
            }
        }
    }

    let average_minutes = mean_rounded(&samples);
    HistoryResult {
        average_minutes,
        samples,
    }
}

/// The other side of the fixture, if `team` plays in it at all.
fn opponent_for(fixture: &Fixture, team: &str) -> Option<String> {
    let home = teams::resolve(&fixture.home);
    let away = teams::resolve(&fixture.away);
    if home == team {
        Some(away)
    } else if away == team {
        Some(home)
    } else {
        None
    }
}

/// Mean rounded to one decimal place, or `None` for an empty sample set.
fn mean_rounded(samples: &[u32]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().map(|&s| u64::from(s)).sum();
    let mean = sum as f64 / samples.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
