pub(crate) mod review;
pub(crate) mod schedule;

pub(crate) use ::scraper::Html;
use ::scraper::{ElementRef, Selector};
use tracing::debug;

use crate::error::{KboError, Result};

const BASE_URL: &str = "https://www.koreabaseball.com/Schedule/GameCenter/Main.aspx";

pub(crate) fn schedule_url(date: &str) -> String {
    format!("{BASE_URL}?gameDate={date}")
}

pub(crate) fn game_url(game_id: &str, game_date: &str) -> String {
    format!("{BASE_URL}?gameId={game_id}&gameDate={game_date}")
}

pub(crate) fn review_url(game_id: &str, game_date: &str) -> String {
    format!("{}&section=REVIEW", game_url(game_id, game_date))
}

/// Fetch a URL and parse the response body as an HTML document.
pub(crate) async fn get_document(client: &reqwest::Client, url: &str) -> Result<Html> {
    debug!(url, "fetching page");

    let response = client.get(url).send().await.map_err(|e| KboError::Http {
        url: url.to_owned(),
        source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(KboError::UnexpectedStatus {
            url: url.to_owned(),
            status,
        });
    }

    let body = response.text().await.map_err(|e| KboError::ResponseBody {
        url: url.to_owned(),
        source: e,
    })?;

    Ok(Html::parse_document(&body))
}

/// Extract trimmed text content from the first element matching `selector`
/// inside `element`. Returns an empty string if nothing matches.
pub(crate) fn select_text(element: &ElementRef, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .and_then(|d| d.text().map(|t| t.trim()).find(|t| !t.is_empty()))
        .unwrap_or_default()
        .trim()
        .replace(['\n', '\t'], "")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_templates() {
        assert_eq!(
            schedule_url("20250322"),
            "https://www.koreabaseball.com/Schedule/GameCenter/Main.aspx?gameDate=20250322"
        );
        assert_eq!(
            review_url("20250322KTHT0", "20250322"),
            "https://www.koreabaseball.com/Schedule/GameCenter/Main.aspx?gameId=20250322KTHT0&gameDate=20250322&section=REVIEW"
        );
    }
}
