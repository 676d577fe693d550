//! Schedule page: one date's fixture list, fast HTTP path with browser fallback.

use std::sync::LazyLock;
use std::time::Duration;

use ::scraper::{ElementRef, Selector};
use itertools::Itertools;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::browser::{BrowserLauncher, BrowserSession, BrowserSlot};
use crate::cache::ScheduleCache;
use crate::error::Result;
use crate::fetch::{self, FetchOutcome};
use crate::model::Fixture;
use crate::scraper::{self, Html};
use crate::teams;

const CARD_SELECTOR: &str = "li.game-cont";
const CARD_SELECTOR_LOOSE: &str = "li[class*='game-cont']";
const READY_SELECTOR: &str = "div#contents";
const GAME_ANCHOR_SELECTOR: &str =
    "a[href*='GameCenter/Main.aspx'][href*='gameId='][href*='gameDate=']";

const BROWSER_WAIT: Duration = Duration::from_secs(15);
const SETTLE_DELAY: Duration = Duration::from_millis(400);

static VS_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Za-z가-힣]+)\s*vs\s*([A-Za-z가-힣]+)").expect("valid vs pattern")
});
static GAME_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gameId=([A-Z0-9]+)").expect("valid gameId pattern"));
static GAME_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"gameDate=(\d{8})").expect("valid gameDate pattern"));

/// Resolve the fixture list for one `YYYYMMDD` date.
///
/// Past dates are cache-first; a hit is returned unconditionally, empty lists
/// included. Today's schedule is never cached in either direction, since the
/// intraday fixture list can still change (postponements).
#[instrument(skip(client, browser, cache))]
pub(crate) async fn fixtures_for_date<L: BrowserLauncher>(
    client: &reqwest::Client,
    browser: &mut BrowserSlot<'_, L>,
    cache: &ScheduleCache,
    date: &str,
    is_today: bool,
) -> FetchOutcome<Vec<Fixture>> {
    if let Some(hit) = cached_fixtures(cache, date, is_today) {
        debug!(count = hit.len(), "schedule cache hit");
        return FetchOutcome::Fetched(hit);
    }

    let url = scraper::schedule_url(date);
    let fast = match fetch::with_retry("schedule", || scraper::get_document(client, &url)).await {
        Ok(document) => match parse_fixture_cards(&document) {
            Ok(fixtures) => Some(fixtures),
            Err(e) => {
                warn!(error = %e, "schedule parse failed, falling back to browser");
                None
            }
        },
        Err(e) => {
            warn!(error = %e, "schedule fast path failed, falling back to browser");
            None
        }
    };

    finish_with_fallback(fast, browser, cache, date, is_today).await
}

/// Read-side cache policy: past dates are cache-first, today is always
/// fetched fresh since the intraday fixture list can still change.
fn cached_fixtures(cache: &ScheduleCache, date: &str, is_today: bool) -> Option<Vec<Fixture>> {
    if is_today {
        return None;
    }
    cache.get(date)
}

/// Second half of the dual-path fetch, after the fast HTTP attempt.
///
/// An empty fast-path parse for today is not trusted: the GameCenter page
/// renders its cards via script, so "no cards in the raw body" and "no games
/// today" are indistinguishable without the browser. For past dates an empty
/// result stands; a finished day with no cards really had no games.
async fn finish_with_fallback<L: BrowserLauncher>(
    fast: Option<Vec<Fixture>>,
    browser: &mut BrowserSlot<'_, L>,
    cache: &ScheduleCache,
    date: &str,
    is_today: bool,
) -> FetchOutcome<Vec<Fixture>> {
    let fast = match fast {
        Some(fixtures) if is_today && fixtures.is_empty() => {
            debug!("no cards on today's fast path, deferring to browser");
            None
        }
        other => other,
    };

    let fixtures = match fast {
        Some(fixtures) => fixtures,
        None => {
            let session = match browser.session().await {
                Ok(session) => session,
                Err(e) => return FetchOutcome::Transient(e.to_string()),
            };
            match via_browser(session, date).await {
                Ok(fixtures) => fixtures,
                Err(e) => return FetchOutcome::Transient(e.to_string()),
            }
        }
    };

    if !is_today {
        if let Err(e) = cache.insert(date, fixtures.clone()) {
            warn!(error = %e, "failed to write schedule cache entry");
        }
    }
    FetchOutcome::Fetched(fixtures)
}

async fn via_browser<S: BrowserSession>(session: &mut S, date: &str) -> Result<Vec<Fixture>> {
    session.goto(&scraper::schedule_url(date)).await?;
    session.wait_for_css(READY_SELECTOR, BROWSER_WAIT).await?;
    tokio::time::sleep(SETTLE_DELAY).await;
    let html = session.page_source().await?;
    parse_fixture_cards(&Html::parse_document(&html))
}

/// Extract all complete fixtures from a schedule page.
///
/// Cards missing any of home, away, game id, or game date are dropped here and
/// never reach the cache.
pub(crate) fn parse_fixture_cards(document: &Html) -> Result<Vec<Fixture>> {
    let primary = Selector::parse(CARD_SELECTOR)?;
    let loose = Selector::parse(CARD_SELECTOR_LOOSE)?;
    let mut cards = document.select(&primary).collect_vec();
    if cards.is_empty() {
        cards = document.select(&loose).collect_vec();
    }

    let mut fixtures = Vec::new();
    for card in cards {
        match parse_fixture_card(&card)? {
            Some(fixture) => fixtures.push(fixture),
            None => warn!("skipping incomplete game card"),
        }
    }
    Ok(fixtures)
}

/// One card, through the extraction heuristics in order of preference:
/// structured attributes, emblem image alt text, then an "A vs B" match over
/// the visible text. The game id and date come from the card's game anchor
/// when not present as attributes.
fn parse_fixture_card(card: &ElementRef) -> Result<Option<Fixture>> {
    let mut home = attr_non_empty(card, "home_nm");
    let mut away = attr_non_empty(card, "away_nm");
    let mut game_id = attr_non_empty(card, "g_id");
    let mut game_date = attr_non_empty(card, "g_dt");

    if home.is_none() || away.is_none() {
        let home_emblem = Selector::parse(".team.home .emb img")?;
        let away_emblem = Selector::parse(".team.away .emb img")?;
        if home.is_none() {
            home = first_attr_non_empty(card, &home_emblem, "alt");
        }
        if away.is_none() {
            away = first_attr_non_empty(card, &away_emblem, "alt");
        }
    }

    if home.is_none() || away.is_none() {
        let text = card.text().map(str::trim).filter(|t| !t.is_empty()).join(" ");
        if let Some(captures) = VS_TEXT.captures(&text) {
            // schedule cards read "away vs home"
            away = away.or_else(|| captures.get(1).map(|m| m.as_str().to_string()));
            home = home.or_else(|| captures.get(2).map(|m| m.as_str().to_string()));
        }
    }

    if game_id.is_none() || game_date.is_none() {
        let anchor = Selector::parse(GAME_ANCHOR_SELECTOR)?;
        if let Some(href) = card
            .select(&anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            if game_id.is_none() {
                game_id = GAME_ID
                    .captures(href)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
            }
            if game_date.is_none() {
                game_date = GAME_DATE
                    .captures(href)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string());
            }
        }
    }

    match (home, away, game_id, game_date) {
        (Some(home), Some(away), Some(game_id), Some(game_date)) => Ok(Some(Fixture {
            home: teams::resolve(&home),
            away: teams::resolve(&away),
            game_id,
            game_date,
        })),
        _ => Ok(None),
    }
}

fn attr_non_empty(element: &ElementRef, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn first_attr_non_empty(element: &ElementRef, selector: &Selector, name: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(name))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KboError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn parse(html: &str) -> Vec<Fixture> {
        parse_fixture_cards(&Html::parse_document(html)).unwrap()
    }

    fn fixture(home: &str, away: &str, id: &str, date: &str) -> Fixture {
        Fixture {
            home: home.into(),
            away: away.into(),
            game_id: id.into(),
            game_date: date.into(),
        }
    }

    const CARD_PAGE: &str = r#"<div id="contents"><ul>
        <li class="game-cont" home_nm="KT" away_nm="KIA"
            g_id="20250322KTHT0" g_dt="20250322"></li>
    </ul></div>"#;

    struct FakeSession {
        page: &'static str,
    }

    impl BrowserSession for FakeSession {
        async fn goto(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }
        async fn wait_for_css(&mut self, _css: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }
        async fn click_anchor_containing(
            &mut self,
            _fragment: &str,
            _timeout: Duration,
        ) -> Result<()> {
            Ok(())
        }
        async fn page_source(&mut self) -> Result<String> {
            Ok(self.page.to_string())
        }
        async fn quit(self) -> Result<()> {
            Ok(())
        }
    }

    struct FakeLauncher {
        page: &'static str,
        launches: Arc<AtomicU32>,
        fail: bool,
    }

    impl FakeLauncher {
        fn serving(page: &'static str) -> Self {
            Self {
                page,
                launches: Arc::new(AtomicU32::new(0)),
                fail: false,
            }
        }

        fn broken() -> Self {
            Self {
                page: "",
                launches: Arc::new(AtomicU32::new(0)),
                fail: true,
            }
        }
    }

    impl BrowserLauncher for FakeLauncher {
        type Session = FakeSession;

        async fn launch(&self) -> Result<FakeSession> {
            if self.fail {
                return Err(KboError::Browser("webdriver unreachable".into()));
            }
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession { page: self.page })
        }
    }

    #[tokio::test]
    async fn empty_fast_parse_for_today_defers_to_browser() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path());
        let launcher = FakeLauncher::serving(CARD_PAGE);
        let mut browser = BrowserSlot::new(&launcher);

        let outcome = finish_with_fallback(Some(vec![]), &mut browser, &cache, "20250322", true).await;
        browser.close().await;

        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
        let fixtures = outcome.into_option().unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].home, "KT");
        assert_eq!(fixtures[0].away, "KIA");
    }

    #[tokio::test]
    async fn empty_fast_parse_for_past_date_is_final_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path());
        let launcher = FakeLauncher::serving(CARD_PAGE);
        let mut browser = BrowserSlot::new(&launcher);

        let outcome =
            finish_with_fallback(Some(vec![]), &mut browser, &cache, "20250322", false).await;
        browser.close().await;

        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.into_option().unwrap(), vec![]);
        // a finished day with no games is a meaningful cache entry
        assert_eq!(cache.get("20250322"), Some(vec![]));
    }

    #[tokio::test]
    async fn todays_schedule_is_never_written_to_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path());
        let launcher = FakeLauncher::serving(CARD_PAGE);
        let mut browser = BrowserSlot::new(&launcher);

        let outcome = finish_with_fallback(None, &mut browser, &cache, "20250322", true).await;
        browser.close().await;

        assert_eq!(outcome.into_option().unwrap().len(), 1);
        assert!(!cache.path().exists());
    }

    #[test]
    fn todays_cache_entries_are_ignored_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path());
        let seeded = vec![fixture("KT", "KIA", "20250322KTHT0", "20250322")];
        cache.insert("20250322", seeded.clone()).unwrap();

        assert_eq!(cached_fixtures(&cache, "20250322", true), None);
        assert_eq!(cached_fixtures(&cache, "20250322", false), Some(seeded));
    }

    #[tokio::test]
    async fn browser_failure_is_transient() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScheduleCache::new(dir.path());
        let launcher = FakeLauncher::broken();
        let mut browser = BrowserSlot::new(&launcher);

        let outcome = finish_with_fallback(None, &mut browser, &cache, "20250322", false).await;
        browser.close().await;

        assert!(matches!(outcome, FetchOutcome::Transient(_)));
        assert!(!cache.path().exists());
    }

    #[test]
    fn extracts_from_structured_attributes() {
        let html = r#"<ul>
            <li class="game-cont" home_nm="KT" away_nm="KIA"
                g_id="20250322KTHT0" g_dt="20250322"></li>
        </ul>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].home, "KT");
        assert_eq!(fixtures[0].away, "KIA");
        assert_eq!(fixtures[0].game_id, "20250322KTHT0");
        assert_eq!(fixtures[0].game_date, "20250322");
    }

    #[test]
    fn falls_back_to_emblem_alt_text() {
        let html = r#"<li class="game-cont">
            <div class="team home"><div class="emb"><img alt="두산베어스"></div></div>
            <div class="team away"><div class="emb"><img alt="LG트윈스"></div></div>
            <a href="/Schedule/GameCenter/Main.aspx?gameId=20250401LGOB0&gameDate=20250401">중계</a>
        </li>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].home, "두산");
        assert_eq!(fixtures[0].away, "LG");
        assert_eq!(fixtures[0].game_id, "20250401LGOB0");
    }

    #[test]
    fn falls_back_to_vs_text() {
        let html = r#"<li class="game-cont">
            <span>키움 vs 한화</span>
            <a href="/Schedule/GameCenter/Main.aspx?gameId=20250405WOHH0&gameDate=20250405">보기</a>
        </li>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures.len(), 1);
        // visible text reads "away vs home"
        assert_eq!(fixtures[0].away, "키움");
        assert_eq!(fixtures[0].home, "한화");
    }

    #[test]
    fn team_names_are_canonicalized_before_caching() {
        let html = r#"<li class="game-cont" home_nm="KT위즈" away_nm="삼성라이온즈"
            g_id="20250406SSKT0" g_dt="20250406"></li>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures[0].home, "KT");
        assert_eq!(fixtures[0].away, "삼성");
    }

    #[test]
    fn incomplete_cards_are_dropped() {
        // no anchor and no id attributes: unidentifiable game
        let html = r#"<ul>
            <li class="game-cont" home_nm="KT" away_nm="KIA"></li>
            <li class="game-cont" home_nm="LG" away_nm="NC"
                g_id="20250407NCLG0" g_dt="20250407"></li>
        </ul>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].game_id, "20250407NCLG0");
    }

    #[test]
    fn loose_class_selector_is_used_when_exact_class_missing() {
        let html = r#"<li class="game-cont-wide" home_nm="롯데" away_nm="SSG"
            g_id="20250408SKLT0" g_dt="20250408"></li>"#;
        let fixtures = parse(html);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].home, "롯데");
    }

    #[test]
    fn page_without_cards_parses_to_empty() {
        assert!(parse("<html><body><div id='contents'></div></body></html>").is_empty());
    }
}
