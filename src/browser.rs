//! Browser-automation seam for the fallback fetch path.
//!
//! The pipeline only ever needs five operations from a browser: navigate, wait
//! for an element, click an anchor found by visible text, read the rendered
//! page, and quit. They are expressed as traits so the pipeline can be driven
//! by a mock in tests; the real implementation speaks WebDriver through
//! [`fantoccini`].

use std::time::Duration;

use fantoccini::{ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{KboError, Result};

#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    async fn goto(&mut self, url: &str) -> Result<()>;
    /// Wait until an element matching `css` is present, up to `timeout`.
    async fn wait_for_css(&mut self, css: &str, timeout: Duration) -> Result<()>;
    /// Find an anchor whose visible text contains `fragment` and click it.
    async fn click_anchor_containing(&mut self, fragment: &str, timeout: Duration) -> Result<()>;
    /// The current rendered page HTML.
    async fn page_source(&mut self) -> Result<String>;
    async fn quit(self) -> Result<()>;
}

#[allow(async_fn_in_trait)]
pub trait BrowserLauncher {
    type Session: BrowserSession;
    async fn launch(&self) -> Result<Self::Session>;
}

/// Launches headless Chrome sessions against a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    webdriver_url: String,
}

impl WebDriverLauncher {
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }
}

impl BrowserLauncher for WebDriverLauncher {
    type Session = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession> {
        let mut capabilities = serde_json::map::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                    "--window-size=1280,1200",
                    "--lang=ko-KR",
                ],
            }),
        );
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| KboError::Browser(e.to_string()))?;
        debug!(url = %self.webdriver_url, "browser session started");
        Ok(WebDriverSession { client })
    }
}

pub struct WebDriverSession {
    client: fantoccini::Client,
}

impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| KboError::Browser(e.to_string()))
    }

    async fn wait_for_css(&mut self, css: &str, timeout: Duration) -> Result<()> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .map(|_| ())
            .map_err(|e| KboError::Browser(e.to_string()))
    }

    async fn click_anchor_containing(&mut self, fragment: &str, timeout: Duration) -> Result<()> {
        let xpath = format!("//a[contains(text(), '{fragment}')]");
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::XPath(&xpath))
            .await
            .map_err(|e| KboError::Browser(e.to_string()))?;
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| KboError::Browser(e.to_string()))
    }

    async fn page_source(&mut self) -> Result<String> {
        self.client
            .source()
            .await
            .map_err(|e| KboError::Browser(e.to_string()))
    }

    async fn quit(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| KboError::Browser(e.to_string()))
    }
}

/// Lazily acquired browser session, scoped to one top-level pipeline call.
///
/// The session is started on first use only (the fallback path may never be
/// needed) and must be torn down through [`BrowserSlot::close`] on every exit
/// path; leaking external browser processes is the dominant resource risk of
/// the fallback design.
pub(crate) struct BrowserSlot<'a, L: BrowserLauncher> {
    launcher: &'a L,
    session: Option<L::Session>,
}

impl<'a, L: BrowserLauncher> BrowserSlot<'a, L> {
    pub(crate) fn new(launcher: &'a L) -> Self {
        Self {
            launcher,
            session: None,
        }
    }

    pub(crate) async fn session(&mut self) -> Result<&mut L::Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.launcher.launch().await?,
        };
        Ok(self.session.insert(session))
    }

    pub(crate) async fn close(mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.quit().await {
                warn!(error = %e, "failed to close browser session");
            } else {
                debug!("browser session closed");
            }
        }
    }
}
