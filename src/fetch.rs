use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Outcome of fetching one domain object (a date's fixtures, a game's runtime).
///
/// Distinguishes "the page said there is nothing" from "the page could not be
/// reached"; the aggregation loop treats both as zero contribution but logs
/// them differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    NotFound,
    Transient(String),
}

impl<T> FetchOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Fetched(value) => Some(value),
            _ => None,
        }
    }
}

/// Attempts made on the fast HTTP path before the browser fallback engages.
pub(crate) const FAST_PATH_ATTEMPTS: u32 = 2;
const FAST_PATH_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Run a fallible fast-path fetch with one bounded retry.
///
/// Not a backoff policy: a single short pause, then the last error is returned
/// so the caller can move on to the fallback path.
pub(crate) async fn with_retry<T, F, Fut>(context: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < FAST_PATH_ATTEMPTS => {
                warn!(context, attempt, error = %e, "fast path attempt failed, retrying");
                tokio::time::sleep(FAST_PATH_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
