//! Game review page: the recorded runtime of one game.

use std::sync::LazyLock;
use std::time::Duration;

use ::scraper::Selector;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::browser::{BrowserLauncher, BrowserSession, BrowserSlot};
use crate::cache::RuntimeCache;
use crate::error::Result;
use crate::fetch::{self, FetchOutcome};
use crate::scraper::{self, select_text, Html};

const RUNTIME_SELECTOR: &str = "div.record-etc span#txtRunTime";
const REVIEW_READY_SELECTOR: &str = "div.record-etc";
const REVIEW_TAB_TEXT: &str = "리뷰";

const BROWSER_WAIT: Duration = Duration::from_secs(12);

static COLON_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    // half- or full-width colon
    Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})").expect("valid colon pattern")
});
static HOUR_MINUTE_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*시간\s*(\d{1,2})\s*분").expect("valid hour-minute pattern")
});

/// Resolve a game's recorded duration in minutes.
///
/// Games dated today never touch the cache in either direction; their duration
/// is not final while the game may still be in progress. Past games are
/// cache-first and cached permanently on success.
#[instrument(skip(client, browser, cache))]
pub(crate) async fn runtime_minutes<L: BrowserLauncher>(
    client: &reqwest::Client,
    browser: &mut BrowserSlot<'_, L>,
    cache: &RuntimeCache,
    game_id: &str,
    game_date: &str,
    is_today: bool,
) -> FetchOutcome<u32> {
    if !is_today {
        if let Some(minutes) = cache.get(game_id, game_date) {
            debug!(minutes, "runtime cache hit");
            return FetchOutcome::Fetched(minutes);
        }
    }

    let url = scraper::review_url(game_id, game_date);
    match fetch::with_retry("review", || scraper::get_document(client, &url)).await {
        Ok(document) => match extract_runtime(&document) {
            Ok(Some(minutes)) => {
                return store_and_return(cache, game_id, game_date, is_today, minutes);
            }
            // The runtime element can be script-rendered; let the browser try.
            Ok(None) => debug!("runtime element absent on fast path"),
            Err(e) => debug!(error = %e, "fast path parse failed"),
        },
        Err(e) => debug!(error = %e, "review fast path failed"),
    }

    let session = match browser.session().await {
        Ok(session) => session,
        Err(e) => return FetchOutcome::Transient(e.to_string()),
    };
    match via_browser(session, game_id, game_date).await {
        Ok(Some(minutes)) => store_and_return(cache, game_id, game_date, is_today, minutes),
        Ok(None) => FetchOutcome::NotFound,
        Err(e) => FetchOutcome::Transient(e.to_string()),
    }
}

fn store_and_return(
    cache: &RuntimeCache,
    game_id: &str,
    game_date: &str,
    is_today: bool,
    minutes: u32,
) -> FetchOutcome<u32> {
    if !is_today {
        if let Err(e) = cache.insert(game_id, game_date, minutes) {
            warn!(error = %e, "failed to write runtime cache entry");
        }
    }
    FetchOutcome::Fetched(minutes)
}

/// Browser fallback: open the game page, activate the review tab by clicking
/// the anchor whose text contains the tab marker, and wait for the record
/// block. If activation fails, navigate straight to the review-section URL
/// instead; that second wait is best-effort.
async fn via_browser<S: BrowserSession>(
    session: &mut S,
    game_id: &str,
    game_date: &str,
) -> Result<Option<u32>> {
    session.goto(&scraper::game_url(game_id, game_date)).await?;

    let activated = match session
        .click_anchor_containing(REVIEW_TAB_TEXT, BROWSER_WAIT)
        .await
    {
        Ok(()) => session
            .wait_for_css(REVIEW_READY_SELECTOR, BROWSER_WAIT)
            .await
            .is_ok(),
        Err(e) => {
            debug!(error = %e, "review tab activation failed");
            false
        }
    };
    if !activated {
        session.goto(&scraper::review_url(game_id, game_date)).await?;
        if let Err(e) = session
            .wait_for_css(REVIEW_READY_SELECTOR, BROWSER_WAIT)
            .await
        {
            debug!(error = %e, "review section never appeared");
        }
    }

    let html = session.page_source().await?;
    extract_runtime(&Html::parse_document(&html))
}

/// Locate the labelled runtime element and parse its text.
pub(crate) fn extract_runtime(document: &Html) -> Result<Option<u32>> {
    let selector = Selector::parse(RUNTIME_SELECTOR)?;
    let root = document.root_element();
    let text = select_text(&root, &selector);
    if text.is_empty() {
        return Ok(None);
    }
    Ok(parse_runtime_text(&text))
}

/// Accepted formats: `H:MM` (half- or full-width colon) and `H시간 M분`.
/// Anything else is "absent", not an error.
pub(crate) fn parse_runtime_text(text: &str) -> Option<u32> {
    let captures = COLON_FORMAT
        .captures(text)
        .or_else(|| HOUR_MINUTE_FORMAT.captures(text))?;
    let hours: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = captures.get(2)?.as_str().parse().ok()?;
    Some(hours * 60 + minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_format() {
        assert_eq!(parse_runtime_text("3:05"), Some(185));
        assert_eq!(parse_runtime_text("2 : 47"), Some(167));
    }

    #[test]
    fn parses_fullwidth_colon() {
        assert_eq!(parse_runtime_text("3：12"), Some(192));
    }

    #[test]
    fn parses_hour_minute_format() {
        assert_eq!(parse_runtime_text("2시간 55분"), Some(175));
        assert_eq!(parse_runtime_text("3시간5분"), Some(185));
    }

    #[test]
    fn unrecognized_text_is_absent() {
        assert_eq!(parse_runtime_text("경기 종료"), None);
        assert_eq!(parse_runtime_text(""), None);
        assert_eq!(parse_runtime_text("185"), None);
    }

    #[test]
    fn extracts_runtime_from_review_markup() {
        let html = r#"<div class="record-etc">
            <span>경기시간</span><span id="txtRunTime">2:50</span>
        </div>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_runtime(&doc).unwrap(), Some(170));
    }

    #[test]
    fn missing_element_is_absent() {
        let doc = Html::parse_document("<div class='record-etc'></div>");
        assert_eq!(extract_runtime(&doc).unwrap(), None);
    }

    #[test]
    fn todays_games_never_write_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RuntimeCache::new(dir.path());

        let outcome = store_and_return(&cache, "G1", "20250322", true, 175);
        assert_eq!(outcome, FetchOutcome::Fetched(175));
        assert_eq!(cache.get("G1", "20250322"), None);

        let outcome = store_and_return(&cache, "G1", "20250322", false, 175);
        assert_eq!(outcome, FetchOutcome::Fetched(175));
        assert_eq!(cache.get("G1", "20250322"), Some(175));
    }

    #[test]
    fn element_with_unparsable_text_is_absent() {
        let html = r#"<div class="record-etc"><span id="txtRunTime">미집계</span></div>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_runtime(&doc).unwrap(), None);
    }
}
