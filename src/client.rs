use std::collections::HashSet;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use tracing::instrument;

use crate::browser::{BrowserLauncher, BrowserSlot, WebDriverLauncher};
use crate::cache::{self, RuntimeCache, ScheduleCache};
use crate::classify::{self, Pace};
use crate::config::{self, Config};
use crate::error::{KboError, Result};
use crate::fetch::FetchOutcome;
use crate::history::{self, DateRange, GameSource};
use crate::model::{CacheStatus, Fixture, HistoryResult, TodayMatch};
use crate::scraper::{review, schedule};
use crate::teams;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/126.0 Safari/537.36";
const ACCEPT_LANGUAGE_VALUE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";
const HTTP_TIMEOUT: Duration = Duration::from_secs(12);

/// The main entry point for the KBO game-time pipeline.
///
/// `KboClient` wraps a long-lived [`reqwest::Client`] for the fast fetch path,
/// owns the two persistent caches, and launches at most one browser session
/// per top-level call for the fallback path, torn down before the call
/// returns.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> kbo_gametime::Result<()> {
/// use std::collections::HashSet;
/// use kbo_gametime::{Config, KboClient};
///
/// let config = Config::from_env()?;
/// let client = KboClient::new(config)?;
///
/// let today = client.find_today_matches("KIA").await?;
/// let rivals: HashSet<String> = today.iter().map(|m| m.opponent.clone()).collect();
/// let history = client.collect_history_avg_runtime("KIA", &rivals, None).await?;
/// if let Some(avg) = history.average_minutes {
///     println!("{avg} minutes on average, {}", client.pace(avg).label());
/// }
/// # Ok(())
/// # }
/// ```
pub struct KboClient<L: BrowserLauncher = WebDriverLauncher> {
    http: reqwest::Client,
    launcher: L,
    config: Config,
    schedule_cache: ScheduleCache,
    runtime_cache: RuntimeCache,
}

impl KboClient<WebDriverLauncher> {
    /// Create a client whose fallback path talks to the configured WebDriver
    /// endpoint.
    pub fn new(config: Config) -> Result<Self> {
        let launcher = WebDriverLauncher::new(config.webdriver_url.clone());
        Self::with_launcher(config, launcher)
    }
}

impl<L: BrowserLauncher> KboClient<L> {
    /// Create a client with a custom browser launcher.
    pub fn with_launcher(config: Config, launcher: L) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(KboError::HttpClient)?;
        let schedule_cache = ScheduleCache::new(&config.cache_dir);
        let runtime_cache = RuntimeCache::new(&config.cache_dir);
        Ok(Self {
            http,
            launcher,
            config,
            schedule_cache,
            runtime_cache,
        })
    }

    /// Today's fixtures involving `team`, with the opponent resolved.
    ///
    /// Today's schedule is fetched fresh on every call; postponements make it
    /// too volatile to cache.
    #[instrument(skip(self))]
    pub async fn find_today_matches(&self, team: &str) -> Result<Vec<TodayMatch>> {
        let my_team = teams::resolve(team);
        let today = Local::now().date_naive().format("%Y%m%d").to_string();

        let mut browser = BrowserSlot::new(&self.launcher);
        let outcome = schedule::fixtures_for_date(
            &self.http,
            &mut browser,
            &self.schedule_cache,
            &today,
            true,
        )
        .await;
        browser.close().await;

        let fixtures = match outcome {
            FetchOutcome::Fetched(fixtures) => fixtures,
            FetchOutcome::NotFound => Vec::new(),
            FetchOutcome::Transient(reason) => {
                return Err(KboError::Unavailable {
                    context: "today's schedule",
                    reason,
                })
            }
        };

        Ok(fixtures
            .into_iter()
            .filter_map(|f| today_match_for(f, &my_team))
            .collect())
    }

    /// Average recorded duration of `team`'s games from `start_date` through
    /// yesterday, optionally restricted to the `rivals` opponent set.
    ///
    /// `start_date` accepts `YYYY-MM-DD` or `YYYYMMDD`; `None` uses the
    /// configured default. The returned average is `None` when no durations
    /// could be collected, which is a valid "insufficient data" result.
    #[instrument(skip(self, rivals))]
    pub async fn collect_history_avg_runtime(
        &self,
        team: &str,
        rivals: &HashSet<String>,
        start_date: Option<&str>,
    ) -> Result<HistoryResult> {
        let start = match start_date {
            Some(raw) => config::parse_date(raw)?,
            None => self.config.start_date,
        };
        let today = Local::now().date_naive();
        let range = history_range(start, today, self.config.max_days);
        if range.is_empty() {
            return Ok(HistoryResult::default());
        }

        let mut sources = LiveSources {
            http: &self.http,
            browser: BrowserSlot::new(&self.launcher),
            schedule_cache: &self.schedule_cache,
            runtime_cache: &self.runtime_cache,
            today: today.format("%Y%m%d").to_string(),
        };
        let result = history::collect(&mut sources, team, rivals, range).await;
        sources.browser.close().await;
        Ok(result)
    }

    /// Bucket an average duration against the configured thresholds.
    pub fn pace(&self, average_minutes: f64) -> Pace {
        classify::classify(average_minutes, &self.config.thresholds)
    }

    /// Stat-level snapshot of both cache files.
    pub fn cache_status(&self) -> CacheStatus {
        cache::cache_status(&self.config.cache_dir)
    }

    /// Delete both cache files; returns the names of the files removed.
    pub fn clear_caches(&self) -> Result<Vec<String>> {
        cache::clear_cache_files(&self.config.cache_dir)
    }
}

/// Historical range: `[start, yesterday]`, optionally clamped to the trailing
/// `max_days`. Today is always excluded; an in-progress game has no final
/// duration.
fn history_range(start: NaiveDate, today: NaiveDate, max_days: Option<u32>) -> DateRange {
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .unwrap_or(chrono::NaiveDate::MIN);
    DateRange::new(start, yesterday).clamp_trailing(max_days)
}

fn today_match_for(fixture: Fixture, my_team: &str) -> Option<TodayMatch> {
    let home = teams::resolve(&fixture.home);
    let away = teams::resolve(&fixture.away);
    let opponent = if home == my_team {
        away.clone()
    } else if away == my_team {
        home.clone()
    } else {
        return None;
    };
    Some(TodayMatch {
        opponent,
        home,
        away,
        game_id: fixture.game_id,
        game_date: fixture.game_date,
    })
}

/// Live pipeline wiring: cache-first scraping over HTTP with a shared,
/// lazily-started browser session for fallbacks.
struct LiveSources<'a, L: BrowserLauncher> {
    http: &'a reqwest::Client,
    browser: BrowserSlot<'a, L>,
    schedule_cache: &'a ScheduleCache,
    runtime_cache: &'a RuntimeCache,
    today: String,
}

impl<L: BrowserLauncher> GameSource for LiveSources<'_, L> {
    async fn fixtures(&mut self, date: &str) -> FetchOutcome<Vec<Fixture>> {
        schedule::fixtures_for_date(
            self.http,
            &mut self.browser,
            self.schedule_cache,
            date,
            date == self.today,
        )
        .await
    }

    async fn runtime(&mut self, game_id: &str, game_date: &str) -> FetchOutcome<u32> {
        review::runtime_minutes(
            self.http,
            &mut self.browser,
            self.runtime_cache,
            game_id,
            game_date,
            game_date == self.today,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y%m%d").unwrap()
    }

    #[test]
    fn history_range_excludes_today() {
        let range = history_range(date("20250322"), date("20250401"), None);
        assert_eq!(range.start, date("20250322"));
        assert_eq!(range.end, date("20250331"));
    }

    #[test]
    fn history_range_applies_max_days() {
        let range = history_range(date("20250101"), date("20250401"), Some(7));
        assert_eq!(range.end, date("20250331"));
        assert_eq!(range.start, date("20250325"));
    }

    #[test]
    fn history_range_is_empty_when_start_is_today() {
        let range = history_range(date("20250401"), date("20250401"), None);
        assert!(range.is_empty());
    }

    #[test]
    fn today_match_resolves_opponent() {
        let fixture = Fixture {
            home: "KT".into(),
            away: "KIA".into(),
            game_id: "G1".into(),
            game_date: "20250322".into(),
        };
        let m = today_match_for(fixture, "KIA").unwrap();
        assert_eq!(m.opponent, "KT");
        assert_eq!(m.home, "KT");
        assert_eq!(m.away, "KIA");
    }

    #[test]
    fn today_match_skips_unrelated_games() {
        let fixture = Fixture {
            home: "LG".into(),
            away: "NC".into(),
            game_id: "G1".into(),
            game_date: "20250322".into(),
        };
        assert!(today_match_for(fixture, "KIA").is_none());
    }
}
